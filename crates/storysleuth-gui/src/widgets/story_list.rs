/// Selectable list of stories with badly named files highlighted.
use egui::Ui;
use storysleuth_core::model::StoryFile;

/// What the user did to a row this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryListAction {
    /// Double click: move the story to the other list.
    Picked(String),
    /// "Open in editor" from the context menu.
    Open(std::path::PathBuf),
}

/// Draw `stories` in a scroll area with id `id`. Invalid names are shown in
/// the warning colour with the reason on hover.
pub fn story_list(ui: &mut Ui, id: &str, stories: &[&StoryFile]) -> Option<StoryListAction> {
    let color_warning = egui::Color32::from_rgb(0xfa, 0xb3, 0x87);
    let row_height = ui.spacing().interact_size.y;
    let mut action = None;

    egui::ScrollArea::vertical()
        .id_salt(id)
        .auto_shrink([false, false])
        .show_rows(ui, row_height, stories.len(), |ui, range| {
            for story in &stories[range] {
                let mut text = egui::RichText::new(story.relative.as_str());
                if story.is_invalid() {
                    text = text.color(color_warning);
                }
                let mut response = ui.selectable_label(false, text);
                if story.is_invalid() {
                    let reasons: Vec<&str> =
                        story.name_issues.iter().map(|i| i.describe()).collect();
                    response = response.on_hover_text(reasons.join("\n"));
                }
                if response.double_clicked() {
                    action = Some(StoryListAction::Picked(story.relative.clone()));
                }
                response.context_menu(|ui| {
                    if ui.button("Open in editor").clicked() {
                        action = Some(StoryListAction::Open(story.path.clone()));
                        ui.close_menu();
                    }
                });
            }
        });

    action
}
