/// Plot layer: density estimation, ridge layout, drawing and export.
///
/// ```text
///   ChannelSeries per time point
///        │
///        ▼
///   ┌──────────┐
///   │  ridge    │  KDE per time point on a shared grid → RidgePlot
///   └──────────┘
///        │
///        ├──────────────► ui (egui_plot preview)
///        ▼
///   ┌──────────┐      ┌──────────┐
///   │  render   │ ───► │  export   │  SVG → JPEG (resvg) / PDF (svg2pdf)
///   └──────────┘      └──────────┘
/// ```

pub mod density;
pub mod export;
pub mod render;
pub mod ridge;

pub use ridge::{Ridge, RidgePlot};
