use std::str::FromStr;

use eframe::egui::Color32;
use palette::{Darken, Hsl, IntoColor, Srgb};
use plotters::style::{RGBAColor, RGBColor};

use crate::error::{Result, RidgeError};

/// How much darker than the fill the ridge outline is drawn.
const OUTLINE_DARKEN: f32 = 0.45;

// ---------------------------------------------------------------------------
// Color parsing
// ---------------------------------------------------------------------------

/// Parse `#rrggbb` / `#rgb` hex or a CSS/SVG color name such as `steelblue`.
pub fn parse_color(spec: &str) -> Result<Srgb<u8>> {
    let trimmed = spec.trim();
    if trimmed.starts_with('#') {
        return Srgb::<u8>::from_str(trimmed)
            .map_err(|_| RidgeError::InvalidColor(spec.to_string()));
    }
    palette::named::from_str(&trimmed.to_ascii_lowercase())
        .ok_or_else(|| RidgeError::InvalidColor(spec.to_string()))
}

// ---------------------------------------------------------------------------
// Ridge fill: color + transparency
// ---------------------------------------------------------------------------

/// Fill color of the ridges together with its transparency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RidgeFill {
    rgb: Srgb<u8>,
    alpha: f64,
}

impl RidgeFill {
    /// Build a fill from a color spec and an alpha in `[0, 1]`.
    pub fn new(spec: &str, alpha: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(RidgeError::InvalidAlpha(alpha));
        }
        Ok(RidgeFill {
            rgb: parse_color(spec)?,
            alpha,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        (self.rgb.red, self.rgb.green, self.rgb.blue)
    }

    /// Opaque, darker shade of the fill used for ridge outlines.
    pub fn outline(&self) -> (u8, u8, u8) {
        let hsl: Hsl = self.rgb.into_format::<f32>().into_color();
        let rgb: Srgb = hsl.darken(OUTLINE_DARKEN).into_color();
        let rgb: Srgb<u8> = rgb.into_format();
        (rgb.red, rgb.green, rgb.blue)
    }

    pub fn to_plotters(&self) -> RGBAColor {
        let (r, g, b) = self.rgb();
        RGBAColor(r, g, b, self.alpha)
    }

    pub fn outline_plotters(&self) -> RGBColor {
        let (r, g, b) = self.outline();
        RGBColor(r, g, b)
    }

    pub fn to_egui(&self) -> Color32 {
        let (r, g, b) = self.rgb();
        Color32::from_rgba_unmultiplied(r, g, b, (self.alpha * 255.0).round() as u8)
    }

    pub fn outline_egui(&self) -> Color32 {
        let (r, g, b) = self.outline();
        Color32::from_rgb(r, g, b)
    }
}
