use crate::color::RidgeFill;
use crate::config::PlotStyle;
use crate::data::filter::{gate_series, Gate};
use crate::data::model::ChannelSeries;
use crate::error::{Result, RidgeError};

use super::density::{grid, kde, silverman_bandwidth};

/// Densities extend this many bandwidths past the data when ungated.
const RANGE_PADDING: f64 = 3.0;

// ---------------------------------------------------------------------------
// Ridge – the density of one time point
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Ridge {
    pub label: String,
    /// Events that went into the density.
    pub events: usize,
    /// Density at each point of [`RidgePlot::xs`].
    pub density: Vec<f64>,
}

// ---------------------------------------------------------------------------
// RidgePlot – everything a renderer needs
// ---------------------------------------------------------------------------

/// Backend-independent description of a ridge plot.
///
/// Ridge `i` sits on baseline `y = i`; the bottom row is the first time
/// point. Densities are scaled so the tallest one reaches `scale` rows.
#[derive(Debug, Clone)]
pub struct RidgePlot {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub xs: Vec<f64>,
    pub ridges: Vec<Ridge>,
    pub fill: RidgeFill,
    pub scale: f64,
    pub gate: Option<Gate>,
}

impl RidgePlot {
    /// Estimate one density per time point over a shared x-range.
    ///
    /// With a gate, events outside it are dropped and the x-range is the
    /// gate itself; otherwise the range covers all events plus padding.
    pub fn build(
        title: &str,
        series: &[ChannelSeries],
        style: &PlotStyle,
        fill: RidgeFill,
        gate: Option<Gate>,
    ) -> Result<Self> {
        if series.is_empty() {
            return Err(RidgeError::Render("no time points to plot".into()));
        }

        let series = match &gate {
            Some(g) => gate_series(series, g),
            None => series.to_vec(),
        };

        let bandwidths: Vec<f64> = series
            .iter()
            .map(|s| silverman_bandwidth(&s.values) * style.bandwidth_adjust)
            .collect();

        let (lo, hi) = match &gate {
            Some(g) => (g.lower, g.upper),
            None => {
                let (min, max) = finite_extent(&series).ok_or_else(|| {
                    RidgeError::Render(format!("channel {} holds no finite events", style.channel))
                })?;
                let pad = RANGE_PADDING * bandwidths.iter().copied().fold(0.0, f64::max);
                (min - pad, max + pad)
            }
        };

        let ridges = series
            .iter()
            .zip(&bandwidths)
            .map(|(s, &bw)| Ridge {
                label: s.label.clone(),
                events: s.values.len(),
                density: kde(&s.values, lo, hi, style.grid_points, bw),
            })
            .collect();

        Ok(RidgePlot {
            title: title.to_string(),
            x_label: style.channel.clone(),
            y_label: style.y_label.clone(),
            xs: grid(lo, hi, style.grid_points),
            ridges,
            fill,
            scale: style.scale,
            gate,
        })
    }

    pub fn x_range(&self) -> (f64, f64) {
        let lo = self.xs.first().copied().unwrap_or(0.0);
        let hi = self.xs.last().copied().unwrap_or(1.0);
        (lo, hi)
    }

    /// Top of the plotting area in row units.
    pub fn y_max(&self) -> f64 {
        (self.ridges.len().saturating_sub(1)) as f64 + self.scale.max(1.0) + 0.1
    }

    /// Largest density value across all ridges.
    pub fn peak(&self) -> f64 {
        self.ridges
            .iter()
            .flat_map(|r| r.density.iter().copied())
            .fold(0.0, f64::max)
    }

    /// Upper outline of ridge `index` in plot coordinates.
    pub fn ridge_outline(&self, index: usize) -> Vec<(f64, f64)> {
        let Some(ridge) = self.ridges.get(index) else {
            return Vec::new();
        };
        let peak = self.peak();
        let factor = if peak > 0.0 { self.scale / peak } else { 0.0 };
        let baseline = index as f64;
        self.xs
            .iter()
            .zip(&ridge.density)
            .map(|(&x, &d)| (x, baseline + d * factor))
            .collect()
    }

    /// Closed polygon of ridge `index`: outline, then back along its baseline.
    pub fn ridge_polygon(&self, index: usize) -> Vec<(f64, f64)> {
        let mut points = self.ridge_outline(index);
        if points.is_empty() {
            return points;
        }
        let (lo, hi) = self.x_range();
        let baseline = index as f64;
        points.push((hi, baseline));
        points.push((lo, baseline));
        points
    }

    /// Label of the row whose baseline is at `y`, if `y` is on one.
    pub fn row_label(&self, y: f64) -> Option<&str> {
        let row = y.round();
        if (y - row).abs() > 1e-6 || row < 0.0 {
            return None;
        }
        self.ridges.get(row as usize).map(|r| r.label.as_str())
    }
}

fn finite_extent(series: &[ChannelSeries]) -> Option<(f64, f64)> {
    series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> Vec<ChannelSeries> {
        let ramp = |center: f64| -> Vec<f64> {
            (0..200).map(|i| center + (i % 20) as f64 * 1.0e4).collect()
        };
        vec![
            ChannelSeries { label: "0".into(), values: ramp(1.0e6) },
            ChannelSeries { label: "6".into(), values: ramp(3.0e6) },
            ChannelSeries { label: "24".into(), values: ramp(6.0e6) },
        ]
    }

    fn fill() -> RidgeFill {
        RidgeFill::new("steelblue", 0.5).unwrap()
    }

    #[test]
    fn test_build_keeps_order_and_shares_grid() {
        let style = PlotStyle::default();
        let plot = RidgePlot::build("A01", &series(), &style, fill(), None).unwrap();
        let labels: Vec<&str> = plot.ridges.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["0", "6", "24"]);
        assert_eq!(plot.xs.len(), style.grid_points);
        assert!(plot.ridges.iter().all(|r| r.density.len() == style.grid_points));
        let (lo, hi) = plot.x_range();
        assert!(lo < 1.0e6 && hi > 6.19e6);
        assert_eq!(plot.x_label, "BL1-A");
    }

    #[test]
    fn test_tallest_ridge_reaches_scale() {
        let plot = RidgePlot::build("A01", &series(), &PlotStyle::default(), fill(), None).unwrap();
        let top = (0..plot.ridges.len())
            .map(|i| {
                plot.ridge_outline(i)
                    .iter()
                    .map(|&(_, y)| y - i as f64)
                    .fold(0.0, f64::max)
            })
            .fold(0.0, f64::max);
        assert!((top - plot.scale).abs() < 1e-9);
    }

    #[test]
    fn test_gate_restricts_range_and_events() {
        let gate = Gate::new(1.5e6, 7.0e6).unwrap();
        let plot = RidgePlot::build("A01", &series(), &PlotStyle::default(), fill(), Some(gate)).unwrap();
        assert_eq!(plot.x_range(), (1.5e6, 7.0e6));
        assert_eq!(plot.ridges[0].events, 0);
        assert!(plot.ridges[0].density.iter().all(|&d| d == 0.0));
        assert_eq!(plot.ridges[1].events, 200);
    }

    #[test]
    fn test_row_labels_and_polygon() {
        let plot = RidgePlot::build("A01", &series(), &PlotStyle::default(), fill(), None).unwrap();
        assert_eq!(plot.row_label(1.0), Some("6"));
        assert_eq!(plot.row_label(1.5), None);
        assert_eq!(plot.row_label(3.0), None);
        let polygon = plot.ridge_polygon(2);
        assert_eq!(polygon.len(), plot.xs.len() + 2);
        assert_eq!(polygon.last().map(|p| p.1), Some(2.0));
    }

    #[test]
    fn test_empty_series_is_an_error() {
        assert!(RidgePlot::build("A01", &[], &PlotStyle::default(), fill(), None).is_err());
        let empty = vec![ChannelSeries { label: "0".into(), values: vec![] }];
        assert!(matches!(
            RidgePlot::build("A01", &empty, &PlotStyle::default(), fill(), None),
            Err(RidgeError::Render(_))
        ));
    }
}
