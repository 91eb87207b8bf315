use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::app::PreviewApp;
use crate::plot::render::format_tick;

// ---------------------------------------------------------------------------
// Left side panel – time points
// ---------------------------------------------------------------------------

/// Render the time-point list with per-row visibility toggles.
pub fn side_panel(ui: &mut Ui, app: &mut PreviewApp) {
    ui.heading("Time points");
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            app.set_all_visible(true);
        }
        if ui.small_button("None").clicked() {
            app.set_all_visible(false);
        }
    });

    let swatch = app.plot.fill.outline_egui();
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // Top row of the plot first, as it reads on screen.
            for index in (0..app.plot.ridges.len()).rev() {
                let ridge = &app.plot.ridges[index];
                let text = RichText::new(format!("{}  ({} events)", ridge.label, ridge.events))
                    .color(swatch);
                let Some(checked) = app.visible.get_mut(index) else {
                    continue;
                };
                ui.checkbox(checked, text);
            }
        });

    if let Some(gate) = app.gate {
        ui.separator();
        ui.checkbox(
            &mut app.show_gate,
            format!("Gate {} – {}", format_tick(gate.lower), format_tick(gate.upper)),
        );
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the summary line above the plot.
pub fn top_bar(ui: &mut Ui, app: &mut PreviewApp) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.strong(app.plot.title.as_str());
        ui.separator();
        ui.label(format!(
            "{} time points, {} visible",
            app.plot.ridges.len(),
            app.visible_count()
        ));
        ui.separator();
        ui.label(format!("channel {}", app.plot.x_label));
        ui.separator();
        ui.label(RichText::new("Close the window to continue").italics());
    });
}
