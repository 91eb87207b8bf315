/// Data layer: FCS decoding, file discovery, time series and gating.
///
/// Architecture:
/// ```text
///  <dir>/<prefix>_<timepoint>.fcs
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  match names → parse time point → read_fcs
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ TimeSeries  │  time point → FcsSample, insertion ordered
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  optional gate on the plotted channel
///   └──────────┘
/// ```

pub mod fcs;
pub mod fcs_writer;
pub mod filter;
pub mod loader;
pub mod model;
