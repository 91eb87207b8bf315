use std::ops::RangeInclusive;

use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{GridMark, Legend, Line, LineStyle, Plot, PlotPoints, Polygon, VLine};

use crate::data::filter::Gate;
use crate::plot::render::format_tick;
use crate::plot::RidgePlot;

// ---------------------------------------------------------------------------
// Ridge plot (central panel)
// ---------------------------------------------------------------------------

/// Render the ridges in the central panel, bottom row first.
pub fn ridge_plot(ui: &mut Ui, ridge_plot: &RidgePlot, visible: &[bool], gate: Option<&Gate>) {
    if ridge_plot.ridges.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No time points to show");
        });
        return;
    }

    let labels: Vec<String> = ridge_plot.ridges.iter().map(|r| r.label.clone()).collect();
    let fill = ridge_plot.fill.to_egui();
    let outline = ridge_plot.fill.outline_egui();

    Plot::new("ridge_plot")
        .legend(Legend::default())
        .x_axis_label(ridge_plot.x_label.clone())
        .y_axis_label(ridge_plot.y_label.clone())
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| format_tick(mark.value))
        .y_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| row_label(&labels, mark.value))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            // Top row first so lower ridges overlap the ones above them.
            for index in (0..ridge_plot.ridges.len()).rev() {
                if !visible.get(index).copied().unwrap_or(true) {
                    continue;
                }
                let outline_points = ridge_plot.ridge_outline(index);
                let baseline = index as f64;

                // egui_plot only fills convex polygons; split the area under
                // the curve into trapezoids.
                for pair in outline_points.windows(2) {
                    let [(x0, y0), (x1, y1)] = [pair[0], pair[1]];
                    let quad = vec![[x0, baseline], [x0, y0], [x1, y1], [x1, baseline]];
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::new(quad))
                            .fill_color(fill)
                            .stroke(Stroke::NONE),
                    );
                }

                let points: PlotPoints = outline_points.iter().map(|&(x, y)| [x, y]).collect();
                plot_ui.line(
                    Line::new(points)
                        .name(&ridge_plot.ridges[index].label)
                        .color(outline)
                        .width(1.5),
                );
            }

            if let Some(gate) = gate {
                for bound in [gate.lower, gate.upper] {
                    plot_ui.vline(
                        VLine::new(bound)
                            .name("gate")
                            .color(Color32::DARK_RED)
                            .style(LineStyle::dashed_loose()),
                    );
                }
            }
        });
}

/// Time-point label for a y grid mark sitting on a baseline, else blank.
fn row_label(labels: &[String], y: f64) -> String {
    let row = y.round();
    if (y - row).abs() > 1e-6 || row < 0.0 {
        return String::new();
    }
    labels.get(row as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_label_only_on_baselines() {
        let labels = vec!["0".to_string(), "6".to_string()];
        assert_eq!(row_label(&labels, 0.0), "0");
        assert_eq!(row_label(&labels, 1.0), "6");
        assert_eq!(row_label(&labels, 0.5), "");
        assert_eq!(row_label(&labels, 2.0), "");
        assert_eq!(row_label(&labels, -1.0), "");
    }
}
