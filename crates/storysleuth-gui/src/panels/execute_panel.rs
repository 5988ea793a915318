/// Execute tab -- test-run inputs, command preview, and the console.
use crate::state::{AppState, RunPhase};
use crate::widgets;
use crate::widgets::toolbar::DOC_LINKS;
use egui::Ui;
use std::path::Path;
use storysleuth_core::settings::Browser;

/// Draw the Execute tab.
pub fn execute_panel(ui: &mut Ui, state: &mut AppState) {
    let color_muted = ui.visuals().weak_text_color();
    let mut changed = false;

    egui::Grid::new("run_inputs")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Meta filter:");
            ui.horizontal(|ui| {
                changed |= ui
                    .add(
                        egui::TextEdit::singleline(&mut state.metafilter)
                            .desired_width(320.0)
                            .hint_text("+smoke -wip"),
                    )
                    .changed();
                let (_, url) = DOC_LINKS[3];
                ui.hyperlink_to("?", url).on_hover_text("jBehave meta-filter syntax");
            });
            ui.end_row();

            ui.label("Run as:");
            ui.horizontal(|ui| {
                changed |= ui
                    .add(
                        egui::TextEdit::singleline(&mut state.run_user)
                            .desired_width(150.0)
                            .hint_text("user"),
                    )
                    .changed();
                changed |= ui
                    .add(
                        egui::TextEdit::singleline(&mut state.run_password)
                            .desired_width(150.0)
                            .password(true)
                            .hint_text("password"),
                    )
                    .changed();
            });
            ui.end_row();

            ui.label("Browser:");
            ui.horizontal(|ui| {
                egui::ComboBox::from_id_salt("run_browser")
                    .selected_text(state.run_browser.label())
                    .show_ui(ui, |ui| {
                        for browser in Browser::ALL {
                            changed |= ui
                                .selectable_value(&mut state.run_browser, browser, browser.label())
                                .changed();
                        }
                    });
                let queued = state.tag_queue.len();
                changed |= ui
                    .add_enabled(
                        queued > 0,
                        egui::Checkbox::new(
                            &mut state.run_queued_only,
                            format!("Only the {queued} queued stories"),
                        ),
                    )
                    .changed();
            });
            ui.end_row();
        });

    if changed {
        state.refresh_command_preview();
    }

    ui.add_space(6.0);

    // ── Run controls ──
    ui.horizontal(|ui| {
        let running = state.is_running();
        if ui
            .add_enabled(
                !running,
                egui::Button::new("▶ Run").min_size(egui::vec2(80.0, 28.0)),
            )
            .clicked()
        {
            state.start_test_run();
        }
        if ui
            .add_enabled(
                running,
                egui::Button::new("⏹ Stop").min_size(egui::vec2(80.0, 28.0)),
            )
            .clicked()
        {
            state.cancel_run();
        }

        let report = state.report_file();
        if ui
            .add_enabled(report.is_some(), egui::Button::new("📊 View Results"))
            .on_disabled_hover_text("No Serenity report has been generated yet")
            .clicked()
        {
            if let Some(path) = report {
                ui.ctx().open_url(egui::OpenUrl::new_tab(file_url(&path)));
            }
        }

        ui.separator();
        run_status(ui, state.run_phase);
    });

    ui.label(
        egui::RichText::new(format!("Working directory: {}", state.working_dir().display()))
            .size(11.0)
            .color(color_muted),
    );

    // ── Command preview ──
    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.strong("Command");
        if state.command_edited {
            ui.label(egui::RichText::new("(edited)").size(11.0).color(color_muted));
            if ui.small_button("Reset").clicked() {
                state.reset_command();
            }
        }
    });
    let edit = ui.add(
        egui::TextEdit::multiline(&mut state.command_text)
            .font(egui::TextStyle::Monospace)
            .desired_rows(2)
            .desired_width(f32::INFINITY),
    );
    if edit.changed() {
        state.command_edited = true;
    }

    ui.add_space(6.0);
    ui.separator();
    widgets::console_view::console_view(ui, state);
}

fn run_status(ui: &mut Ui, phase: RunPhase) {
    let color_success = egui::Color32::from_rgb(0xa6, 0xe3, 0xa1);
    let color_error = egui::Color32::from_rgb(0xf3, 0x8b, 0xa8);
    match phase {
        RunPhase::Idle => {}
        RunPhase::Running => {
            ui.spinner();
            ui.label("Running…");
        }
        RunPhase::Finished(status) => {
            let color = if status.success() {
                color_success
            } else {
                color_error
            };
            ui.label(egui::RichText::new(status.describe()).color(color));
        }
        RunPhase::Failed => {
            ui.label(egui::RichText::new("could not start").color(color_error));
        }
    }
}

/// `file://` URL for a local path, with Windows separators flipped.
pub fn file_url(path: &Path) -> String {
    let text = path.display().to_string().replace('\\', "/");
    if text.starts_with('/') {
        format!("file://{text}")
    } else {
        format!("file:///{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_urls() {
        assert_eq!(
            file_url(Path::new("/srv/site/index.html")),
            "file:///srv/site/index.html"
        );
        assert_eq!(
            file_url(Path::new(r"C:\proj\target\index.html")),
            "file:///C:/proj/target/index.html"
        );
    }
}
