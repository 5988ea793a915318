/// Browse tab -- story root, per-key statistics, values, and the story tree.
use crate::state::{AppPhase, AppState};
use crate::theme::StorySleuthTheme;
use egui::Ui;
use egui_extras::{Column, TableBuilder};
use std::path::PathBuf;
use storysleuth_core::analysis::ReportColumn;
use storysleuth_core::model::format::format_count;
use storysleuth_core::model::{NO_KEY_METATAGS, NO_METATAGS};

/// Draw the Browse tab.
pub fn browse_panel(ui: &mut Ui, state: &mut AppState) {
    root_row(ui, state);
    ui.separator();

    if state.index.is_none() {
        ui.add_space(24.0);
        ui.vertical_centered(|ui| {
            let text = if state.phase == AppPhase::Scanning {
                "Reading stories…"
            } else {
                "Choose a story folder to begin"
            };
            ui.label(
                egui::RichText::new(text)
                    .size(16.0)
                    .color(ui.visuals().weak_text_color()),
            );
        });
        return;
    }

    footer(ui, state);

    ui.columns(3, |cols| {
        key_table(&mut cols[0], state);
        values_list(&mut cols[1], state);
        story_tree(&mut cols[2], state);
    });
}

// ── Story root ──────────────────────────────────────────────────

fn root_row(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.label("Stories:");
        let edit = ui.add(
            egui::TextEdit::singleline(&mut state.story_root_input)
                .desired_width(ui.available_width() - 140.0)
                .hint_text("Folder holding .story files"),
        );
        let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        if ui.button("📁").on_hover_text("Choose story folder").clicked() {
            if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                state.set_story_root(dir);
                return;
            }
        }

        let can_scan = state.phase != AppPhase::Scanning;
        let rescan = ui
            .add_enabled(can_scan, egui::Button::new("🔄 Rescan"))
            .clicked();

        if (submitted || rescan) && can_scan {
            let typed = PathBuf::from(state.story_root_input.trim());
            if typed != state.settings.stories_root() {
                state.set_story_root(typed);
            } else {
                state.rescan();
            }
        }
    });
}

// ── Footer counts ───────────────────────────────────────────────

fn footer(ui: &mut Ui, state: &AppState) {
    let Some(index) = &state.index else {
        return;
    };
    let color_weak = ui.visuals().weak_text_color();
    let color_warning = egui::Color32::from_rgb(0xfa, 0xb3, 0x87);
    ui.horizontal(|ui| {
        let parts = [
            format!("{} stories", format_count(index.stories.len() as u64)),
            format!("{} scenarios", format_count(index.scenario_count() as u64)),
            format!("{} steps", format_count(index.step_count() as u64)),
            format!("{} keys", format_count(state.report.key_count as u64)),
            format!("{} metatags", format_count(state.report.total_values as u64)),
        ];
        ui.label(egui::RichText::new(parts.join("  ·  ")).color(color_weak));
        let invalid = index.invalid_count();
        if invalid > 0 {
            ui.label(
                egui::RichText::new(format!("{invalid} badly named"))
                    .color(color_warning),
            )
            .on_hover_text("Story names must end in .story and contain no spaces");
        }
    });
    ui.add_space(4.0);
}

// ── Key table ───────────────────────────────────────────────────

fn sort_label(state: &AppState, column: ReportColumn, title: &str) -> String {
    if state.sort_column != column {
        return title.to_string();
    }
    let arrow = if state.sort_ascending { "⏶" } else { "⏷" };
    format!("{title} {arrow}")
}

fn key_table(ui: &mut Ui, state: &mut AppState) {
    let theme = StorySleuthTheme::for_mode(state.dark_mode);
    ui.heading("Keys");

    if state.report.rows.is_empty() {
        ui.label(egui::RichText::new(NO_KEY_METATAGS).color(theme.text_muted));
        return;
    }

    let mut sort_clicked = None;
    let mut key_clicked = None;
    let mut matrix_clicked = None;
    let row_height = ui.spacing().interact_size.y;

    ui.push_id("key_table", |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::remainder().at_least(100.0).clip(true))
            .column(Column::auto().at_least(50.0))
            .column(Column::auto().at_least(60.0))
            .column(Column::auto().at_least(70.0))
            .header(row_height, |mut header| {
                for (column, title) in [
                    (ReportColumn::Key, "Key"),
                    (ReportColumn::Count, "Count"),
                    (ReportColumn::Percent, "Percent"),
                    (ReportColumn::Coverage, "Coverage"),
                ] {
                    header.col(|ui| {
                        if ui.button(sort_label(state, column, title)).clicked() {
                            sort_clicked = Some(column);
                        }
                    });
                }
            })
            .body(|body| {
                body.rows(row_height, state.report.rows.len(), |mut row| {
                    let stats = &state.report.rows[row.index()];
                    let selected = state.selected_key.as_deref() == Some(stats.key.as_str());
                    row.col(|ui| {
                        if ui.selectable_label(selected, &stats.key).clicked() {
                            key_clicked = Some(stats.key.clone());
                        }
                    });
                    row.col(|ui| {
                        ui.label(format_count(stats.count as u64));
                    });
                    row.col(|ui| {
                        ui.label(stats.percent_label());
                    });
                    row.col(|ui| {
                        let text = egui::RichText::new(stats.coverage.to_string())
                            .color(theme.coverage_color(stats.coverage));
                        match &stats.category {
                            Some(category) => {
                                let hover = format!(
                                    "{} distinct values against '{category}'\nClick for the coverage matrix",
                                    stats.distinct
                                );
                                if ui.link(text).on_hover_text(hover).clicked() {
                                    matrix_clicked = Some(stats.key.clone());
                                }
                            }
                            None => {
                                ui.label(text)
                                    .on_hover_text("Not bound to a requirement category");
                            }
                        }
                    });
                });
            });
    });

    if let Some(column) = sort_clicked {
        state.sort_report(column);
    }
    if let Some(key) = key_clicked {
        state.select_key(Some(key));
    }
    if let Some(key) = matrix_clicked {
        state.open_matrix(&key);
    }
}

// ── Values ──────────────────────────────────────────────────────

fn values_list(ui: &mut Ui, state: &mut AppState) {
    let color_muted = ui.visuals().weak_text_color();
    ui.heading("Values");
    ui.checkbox(&mut state.values_with_stories, "Show stories");

    let Some(key) = state.selected_key.clone() else {
        ui.label(egui::RichText::new("Select a key").color(color_muted).italics());
        return;
    };
    ui.label(egui::RichText::new(&key).strong());

    let values = state.selected_values();
    let row_height = ui.spacing().interact_size.y;
    egui::ScrollArea::vertical()
        .id_salt("values_list")
        .auto_shrink([false, false])
        .show_rows(ui, row_height, values.len(), |ui, range| {
            for value in &values[range] {
                ui.label(value);
            }
        });
}

// ── Story tree ──────────────────────────────────────────────────

fn story_tree(ui: &mut Ui, state: &mut AppState) {
    let Some(index) = state.index.clone() else {
        return;
    };
    let color_muted = ui.visuals().weak_text_color();
    let color_warning = egui::Color32::from_rgb(0xfa, 0xb3, 0x87);
    ui.heading("Stories");

    if index.is_empty() {
        ui.label(egui::RichText::new(NO_METATAGS).color(color_muted));
        return;
    }

    let mut open = None;
    egui::ScrollArea::vertical()
        .id_salt("story_tree")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for story in &index.stories {
                let mut title = egui::RichText::new(story.relative.as_str());
                if story.is_invalid() {
                    title = title.color(color_warning);
                }
                let header = egui::CollapsingHeader::new(title)
                    .id_salt(&story.relative)
                    .show(ui, |ui| {
                        for tag in &story.metatags {
                            ui.label(
                                egui::RichText::new(&tag.raw)
                                    .monospace()
                                    .color(color_muted),
                            );
                        }
                        for scenario in &story.scenarios {
                            ui.label(format!("Scenario: {}", scenario.title))
                                .on_hover_text(format!(
                                    "Line {}, {} steps",
                                    scenario.line,
                                    scenario.steps.len()
                                ));
                        }
                    });
                if header.header_response.double_clicked() {
                    open = Some(story.path.clone());
                }
                header
                    .header_response
                    .on_hover_text("Double-click to edit");
            }
        });

    if let Some(path) = open {
        state.open_editor(&path);
    }
}
