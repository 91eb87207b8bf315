//! Request and style configuration
//!
//! A [`RidgeRequest`] carries everything one invocation needs. Its
//! [`PlotStyle`] can come from a JSON style file; fields missing from the
//! file take the defaults below, and command-line flags override both.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::RidgeFill;
use crate::error::{Result, RidgeError};

/// Output file format of the saved figure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Raster image, written as `.jpg`
    Jpeg,
    /// Vector document, written as `.pdf`
    Pdf,
}

impl OutputFormat {
    /// Accepts `jpeg`, `jpg`, `image`, `pdf` and `document`, case-insensitively.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" | "image" => Ok(Self::Jpeg),
            "pdf" | "document" => Ok(Self::Pdf),
            _ => Err(RidgeError::InvalidFormat(s.to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Pdf => "pdf",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = RidgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Visual settings of the ridge plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotStyle {
    /// Channel to plot, matched against `$PnN` then `$PnS`
    pub channel: String,

    /// Y-axis title
    pub y_label: String,

    /// Ridge fill: hex (`#4682b4`) or a color name (`steelblue`)
    pub fill: String,

    /// Fill transparency in [0, 1]
    pub alpha: f64,

    /// Figure width in pixels
    pub width: u32,

    /// Figure height in pixels
    pub height: u32,

    /// Height of the tallest ridge, in multiples of the row spacing
    pub scale: f64,

    /// Multiplier on the automatic kernel bandwidth
    pub bandwidth_adjust: f64,

    /// Number of points each density is evaluated at
    pub grid_points: usize,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            channel: "BL1-A".to_string(),
            y_label: "Time point".to_string(),
            fill: "steelblue".to_string(),
            alpha: 0.6,
            width: 1050,
            height: 750,
            scale: 1.5,
            bandwidth_adjust: 1.0,
            grid_points: 512,
        }
    }
}

impl PlotStyle {
    /// Load a style from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RidgeError::Style(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| RidgeError::Style(format!("{}: {e}", path.display())))
    }

    /// Check the numeric settings and resolve the fill color.
    pub fn validate(&self) -> Result<RidgeFill> {
        let fill = RidgeFill::new(&self.fill, self.alpha)?;
        if self.width == 0 || self.height == 0 {
            return Err(RidgeError::Style(format!(
                "figure size {}x{} must be positive",
                self.width, self.height
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(RidgeError::Style(format!("scale {} must be positive", self.scale)));
        }
        if !(self.bandwidth_adjust.is_finite() && self.bandwidth_adjust > 0.0) {
            return Err(RidgeError::Style(format!(
                "bandwidth adjust {} must be positive",
                self.bandwidth_adjust
            )));
        }
        if self.grid_points < 2 {
            return Err(RidgeError::Style(format!(
                "at least 2 grid points are needed, got {}",
                self.grid_points
            )));
        }
        if self.channel.trim().is_empty() {
            return Err(RidgeError::Style("channel name is empty".into()));
        }
        Ok(fill)
    }
}

/// One invocation of the pipeline
#[derive(Debug, Clone)]
pub struct RidgeRequest {
    /// Sample identifier, matched as a substring of file names
    pub identifier: String,

    /// Directory holding the `.fcs` files
    pub dir: PathBuf,

    /// Where the figure goes; the source directory when `None`
    pub output_dir: Option<PathBuf>,

    /// Optional x-axis restriction `(lower, upper)` for the saved figure
    pub gate: Option<(f64, f64)>,

    pub style: PlotStyle,

    /// Output format name, validated before anything touches the disk
    pub file_format: String,

    /// Show the preview and ask before saving
    pub interactive: bool,

    /// Also write the plotted density curves to this CSV file
    pub densities_csv: Option<PathBuf>,

    /// Reject files that map to an already loaded time point
    pub strict_time_points: bool,
}

impl RidgeRequest {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            dir: PathBuf::from("."),
            output_dir: None,
            gate: None,
            style: PlotStyle::default(),
            file_format: "jpeg".to_string(),
            interactive: true,
            densities_csv: None,
            strict_time_points: false,
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.dir)
    }

    /// `<output_dir>/<identifier>.<ext>`
    pub fn output_path(&self, format: OutputFormat) -> PathBuf {
        self.output_dir()
            .join(format!("{}.{}", self.identifier, format.extension()))
    }
}
