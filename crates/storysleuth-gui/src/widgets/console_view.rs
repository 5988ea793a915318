/// Streaming console -- timestamped output of the test run and Selenium.
use crate::state::{AppState, ConsoleKind};
use egui::Ui;

/// Draw the console. Only visible rows are laid out, so a full console
/// costs the same per frame as an empty one.
pub fn console_view(ui: &mut Ui, state: &mut AppState) {
    let color_weak = ui.visuals().weak_text_color();
    let color_normal = ui.visuals().text_color();
    let color_accent = ui.visuals().hyperlink_color;
    let color_error = egui::Color32::from_rgb(0xf3, 0x8b, 0xa8);
    let color_stderr = egui::Color32::from_rgb(0xfa, 0xb3, 0x87);

    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Console").strong());
        ui.label(
            egui::RichText::new(format!("{} lines", state.console.len()))
                .size(11.0)
                .color(color_weak),
        );
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("🗑 Clear").clicked() {
                state.clear_console();
            }
            if ui.button("📋 Copy").on_hover_text("Copy the console to the clipboard").clicked() {
                let text: Vec<String> = state
                    .console
                    .iter()
                    .map(|l| format!("[{}] {}", l.timestamp.format("%H:%M:%S"), l.text))
                    .collect();
                ui.ctx().copy_text(text.join("\n"));
            }
            ui.checkbox(&mut state.console_autoscroll, "Follow");
        });
    });

    let row_height = ui.text_style_height(&egui::TextStyle::Monospace);
    egui::Frame::NONE
        .fill(ui.visuals().extreme_bg_color)
        .inner_margin(4.0)
        .show(ui, |ui| {
            egui::ScrollArea::both()
                .auto_shrink([false, false])
                .stick_to_bottom(state.console_autoscroll)
                .show_rows(ui, row_height, state.console.len(), |ui, range| {
                    for line in state.console.range(range) {
                        let color = match line.kind {
                            ConsoleKind::Info => color_accent,
                            ConsoleKind::Stdout => color_normal,
                            ConsoleKind::Stderr => color_stderr,
                            ConsoleKind::Error => color_error,
                        };
                        ui.horizontal(|ui| {
                            ui.label(
                                egui::RichText::new(line.timestamp.format("%H:%M:%S").to_string())
                                    .monospace()
                                    .color(color_weak),
                            );
                            ui.label(egui::RichText::new(&line.text).monospace().color(color));
                        });
                    }
                });
        });
}
