/// Tag tab -- queue stories, then add or remove a metatag on all of them.
use crate::state::AppState;
use crate::widgets::story_list::{story_list, StoryListAction};
use egui::Ui;

/// Draw the Tag tab.
pub fn tag_panel(ui: &mut Ui, state: &mut AppState) {
    let color_muted = ui.visuals().weak_text_color();

    if state.index.is_none() {
        ui.label(
            egui::RichText::new("Scan a story folder first")
                .color(color_muted)
                .italics(),
        );
        return;
    }

    // ── Tag entry and bulk actions ──
    ui.horizontal(|ui| {
        ui.label("Metatag:");
        ui.add(
            egui::TextEdit::singleline(&mut state.tag_input)
                .desired_width(260.0)
                .hint_text("@usecase 12"),
        );
        let has_queue = !state.tag_queue.is_empty();
        if ui
            .add_enabled(has_queue, egui::Button::new("➕ Add to queued"))
            .on_hover_text("Add the metatag to every queued story's Meta: block")
            .clicked()
        {
            state.bulk_tag(true);
        }
        if ui
            .add_enabled(has_queue, egui::Button::new("➖ Remove from queued"))
            .on_hover_text("A bare key removes every value of that key")
            .clicked()
        {
            state.bulk_tag(false);
        }
    });

    ui.separator();

    let mut action = None;
    let log_height = 120.0;
    let list_height = (ui.available_height() - log_height).max(120.0);

    ui.columns(2, |cols| {
        // ── Available ──
        let ui = &mut cols[0];
        ui.horizontal(|ui| {
            ui.strong("Available");
            ui.add(
                egui::TextEdit::singleline(&mut state.tag_filter)
                    .desired_width(160.0)
                    .hint_text("filter"),
            );
            if ui.small_button("All →").clicked() {
                state.queue_all_available();
            }
        });
        let available = state.available_stories();
        ui.label(
            egui::RichText::new(format!("{} stories", available.len()))
                .size(11.0)
                .color(color_muted),
        );
        ui.allocate_ui(egui::vec2(ui.available_width(), list_height), |ui| {
            if let Some(a) = story_list(ui, "available_stories", &available) {
                action = Some((a, true));
            }
        });

        // ── Queued ──
        let ui = &mut cols[1];
        ui.horizontal(|ui| {
            ui.strong("Queued");
            if ui.small_button("← Clear").clicked() {
                state.clear_queue();
            }
        });
        let queued = state.queued_stories();
        ui.label(
            egui::RichText::new(format!("{} stories (double-click to move)", queued.len()))
                .size(11.0)
                .color(color_muted),
        );
        ui.allocate_ui(egui::vec2(ui.available_width(), list_height), |ui| {
            if let Some(a) = story_list(ui, "queued_stories", &queued) {
                action = Some((a, false));
            }
        });
    });

    match action {
        Some((StoryListAction::Picked(rel), true)) => state.queue_story(&rel),
        Some((StoryListAction::Picked(rel), false)) => state.unqueue_story(&rel),
        Some((StoryListAction::Open(path), _)) => state.open_editor(&path),
        None => {}
    }

    // ── Log ──
    ui.separator();
    ui.strong("Log");
    egui::ScrollArea::vertical()
        .id_salt("tag_log")
        .max_height(log_height)
        .auto_shrink([false, true])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for line in &state.tag_log {
                ui.label(egui::RichText::new(line).monospace());
            }
        });
}
