//! Ridge/density plots of flow-cytometry time courses.
//!
//! Files named `<identifier>_<timepoint>.fcs` are collected from a
//! directory, one channel is plotted as one density ridge per time point,
//! and the figure is saved as `<identifier>.jpg` or `<identifier>.pdf`
//! after an optional preview and confirmation. See [`pipeline::run`].

pub mod app;
pub mod capabilities;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod ui;

pub use capabilities::Capabilities;
pub use config::{OutputFormat, PlotStyle, RidgeRequest};
pub use error::{Result, RidgeError};
pub use pipeline::{run, Frontend};
