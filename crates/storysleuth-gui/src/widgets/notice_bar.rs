/// Dismissible notices under the toolbar.
use crate::state::{AppState, NoticeLevel};
use egui::Ui;

/// Draw every pending notice with a dismiss button.
pub fn notice_bar(ui: &mut Ui, state: &mut AppState) {
    let mut dismissed = None;
    for (i, notice) in state.notices.iter().enumerate() {
        let (icon, color) = match notice.level {
            NoticeLevel::Info => ("ℹ", ui.visuals().hyperlink_color),
            NoticeLevel::Warning => ("⚠", egui::Color32::from_rgb(0xfa, 0xb3, 0x87)),
            NoticeLevel::Error => ("⛔", egui::Color32::from_rgb(0xf3, 0x8b, 0xa8)),
        };
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(icon).color(color));
            ui.label(egui::RichText::new(&notice.text).color(color));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("✕").on_hover_text("Dismiss").clicked() {
                    dismissed = Some(i);
                }
            });
        });
    }
    if let Some(i) = dismissed {
        state.dismiss_notice(i);
    }
}
