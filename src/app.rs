use eframe::egui;

use crate::data::filter::Gate;
use crate::error::{Result, RidgeError};
use crate::plot::RidgePlot;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// Preview – show the ungated plot before saving
// ---------------------------------------------------------------------------

/// Shows a plot and returns once the user is done looking at it.
pub trait Preview {
    /// `gate` is drawn as markers only; the plot itself is not restricted.
    fn show(&mut self, plot: &RidgePlot, gate: Option<&Gate>) -> Result<()>;

    fn requires_display(&self) -> bool {
        true
    }
}

/// Native preview window. Blocks until the window is closed.
#[derive(Debug, Clone)]
pub struct WindowPreview {
    pub inner_size: [f32; 2],
}

impl Default for WindowPreview {
    fn default() -> Self {
        Self {
            inner_size: [1100.0, 750.0],
        }
    }
}

impl Preview for WindowPreview {
    fn show(&mut self, ridge_plot: &RidgePlot, gate: Option<&Gate>) -> Result<()> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size(self.inner_size)
                .with_min_inner_size([600.0, 400.0]),
            ..Default::default()
        };

        let app = PreviewApp::new(ridge_plot.clone(), gate.copied());
        log::info!("Showing preview of {}; close the window to continue", ridge_plot.title);
        eframe::run_native(
            &format!("fcs-ridge – {}", ridge_plot.title),
            options,
            Box::new(|_cc| Ok(Box::new(app))),
        )
        .map_err(|e| RidgeError::Preview(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

/// UI state of the preview window.
pub struct PreviewApp {
    pub plot: RidgePlot,
    pub gate: Option<Gate>,
    /// One flag per ridge, same order as `plot.ridges`.
    pub visible: Vec<bool>,
    pub show_gate: bool,
}

impl PreviewApp {
    pub fn new(plot: RidgePlot, gate: Option<Gate>) -> Self {
        let visible = vec![true; plot.ridges.len()];
        Self {
            plot,
            gate,
            visible,
            show_gate: gate.is_some(),
        }
    }

    pub fn set_all_visible(&mut self, visible: bool) {
        self.visible.iter_mut().for_each(|v| *v = visible);
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }
}

impl eframe::App for PreviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: summary ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, self);
        });

        // ---- Left side panel: time points ----
        egui::SidePanel::left("time_points")
            .default_width(200.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, self);
            });

        // ---- Central panel: ridges ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let gate = self.gate.filter(|_| self.show_gate);
            plot::ridge_plot(ui, &self.plot, &self.visible, gate.as_ref());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::RidgeFill;
    use crate::config::PlotStyle;
    use crate::data::model::ChannelSeries;

    fn app(gate: Option<Gate>) -> PreviewApp {
        let series = vec![
            ChannelSeries { label: "0".into(), values: vec![1.0, 2.0, 3.0] },
            ChannelSeries { label: "6".into(), values: vec![2.0, 3.0, 4.0] },
        ];
        let style = PlotStyle { grid_points: 16, ..PlotStyle::default() };
        let fill = RidgeFill::new(&style.fill, style.alpha).unwrap();
        let plot = RidgePlot::build("A01", &series, &style, fill, None).unwrap();
        PreviewApp::new(plot, gate)
    }

    #[test]
    fn test_new_app_shows_everything() {
        let app = app(Some(Gate::new(1.5, 3.5).unwrap()));
        assert_eq!(app.visible, vec![true, true]);
        assert!(app.show_gate);
        assert!(!self::app(None).show_gate);
    }

    #[test]
    fn test_toggle_visibility() {
        let mut app = app(None);
        app.set_all_visible(false);
        assert_eq!(app.visible_count(), 0);
        app.visible[1] = true;
        assert_eq!(app.visible_count(), 1);
    }

    #[test]
    fn test_window_preview_needs_display() {
        assert!(WindowPreview::default().requires_display());
    }
}
