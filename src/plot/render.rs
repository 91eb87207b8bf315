use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{Result, RidgeError};

use super::ridge::RidgePlot;

/// Which axis decorations to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axes {
    /// Ticks, tick labels, axis titles and grid.
    Full,
    /// Only the ridges and the title.
    Stripped,
}

/// Draw the plot as an SVG document.
pub fn render_svg(plot: &RidgePlot, size: (u32, u32), axes: Axes) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_ridges(&root, plot, axes).map_err(|e| RidgeError::Render(e.to_string()))?;
        root.present()
            .map_err(|e| RidgeError::Render(e.to_string()))?;
    }
    Ok(svg)
}

/// Draw onto any plotters backend.
pub fn draw_ridges<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    plot: &RidgePlot,
    axes: Axes,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let (x_lo, x_hi) = plot.x_range();
    let mut builder = ChartBuilder::on(root);
    builder
        .margin(20)
        .caption(&plot.title, ("sans-serif", 28).into_font());
    if axes == Axes::Full {
        builder.x_label_area_size(50).y_label_area_size(70);
    }
    let mut chart = builder.build_cartesian_2d(x_lo..x_hi, 0.0..plot.y_max())?;

    if axes == Axes::Full {
        let y_formatter = |y: &f64| plot.row_label(*y).unwrap_or_default().to_string();
        let x_formatter = |x: &f64| format_tick(*x);
        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc(plot.x_label.as_str())
            .y_desc(plot.y_label.as_str())
            .y_labels(plot.ridges.len() + 1)
            .y_label_formatter(&y_formatter)
            .x_label_formatter(&x_formatter)
            .label_style(("sans-serif", 16).into_font())
            .axis_desc_style(("sans-serif", 18).into_font())
            .draw()?;
    }

    let fill = plot.fill.to_plotters();
    let outline = plot.fill.outline_plotters();

    // Top row first so lower ridges overlap the ones above them.
    for index in (0..plot.ridges.len()).rev() {
        chart.draw_series(std::iter::once(Polygon::new(
            plot.ridge_polygon(index),
            fill.filled(),
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            plot.ridge_outline(index),
            outline.stroke_width(1),
        )))?;
    }

    Ok(())
}

/// Compact tick label: `1.5M`, `250k`, `12`.
pub fn format_tick(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1.0e6 {
        format!("{}M", trim_zeros(value / 1.0e6))
    } else if abs >= 1.0e3 {
        format!("{}k", trim_zeros(value / 1.0e3))
    } else {
        trim_zeros(value)
    }
}

fn trim_zeros(value: f64) -> String {
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::RidgeFill;
    use crate::config::PlotStyle;
    use crate::data::model::ChannelSeries;

    fn plot() -> RidgePlot {
        let series = vec![
            ChannelSeries {
                label: "0".into(),
                values: (0..100).map(|i| 1.0e6 + f64::from(i) * 1.0e3).collect(),
            },
            ChannelSeries {
                label: "6".into(),
                values: (0..100).map(|i| 2.0e6 + f64::from(i) * 1.0e3).collect(),
            },
        ];
        let style = PlotStyle {
            grid_points: 64,
            ..PlotStyle::default()
        };
        let fill = RidgeFill::new(&style.fill, style.alpha).unwrap();
        RidgePlot::build("A01", &series, &style, fill, None).unwrap()
    }

    #[test]
    fn test_full_axes_carry_labels() {
        let svg = render_svg(&plot(), (600, 400), Axes::Full).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("A01"));
        assert!(svg.contains("BL1-A"));
        assert!(svg.contains("Time point"));
        assert!(svg.contains("<polygon"));
    }

    #[test]
    fn test_stripped_axes_keep_only_title() {
        let svg = render_svg(&plot(), (600, 400), Axes::Stripped).unwrap();
        assert!(svg.contains("A01"));
        assert!(!svg.contains("BL1-A"));
        assert!(!svg.contains("Time point"));
        assert_eq!(svg.matches("<polygon").count(), 2);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(1_500_000.0), "1.5M");
        assert_eq!(format_tick(7_000_000.0), "7M");
        assert_eq!(format_tick(250_000.0), "250k");
        assert_eq!(format_tick(-2_500.0), "-2.5k");
        assert_eq!(format_tick(12.0), "12");
        assert_eq!(format_tick(0.0), "0");
    }
}
