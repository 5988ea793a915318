/// Coverage matrix window -- which requirement is covered by which story.
use crate::state::AppState;
use egui_extras::{Column, TableBuilder};
use storysleuth_core::model::format::format_percent;

pub fn matrix_window(ctx: &egui::Context, state: &mut AppState) {
    let Some(matrix) = state.matrix.as_ref() else {
        return;
    };

    let mut open = true;
    let mut export = false;
    let color_success = egui::Color32::from_rgb(0xa6, 0xe3, 0xa1);
    let color_error = egui::Color32::from_rgb(0xf3, 0x8b, 0xa8);
    let color_warning = egui::Color32::from_rgb(0xfa, 0xb3, 0x87);

    egui::Window::new(format!("{} → {}", matrix.key, matrix.category))
        .id(egui::Id::new("coverage_matrix"))
        .open(&mut open)
        .default_size([640.0, 480.0])
        .resizable(true)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                let covered = matrix.covered();
                let total = matrix.total();
                let percent = if total == 0 {
                    "n/a".to_string()
                } else {
                    format_percent(covered as f64 * 100.0 / total as f64)
                };
                ui.strong(format!("{covered} of {total} requirements covered ({percent})"));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("📤 Export CSV…").clicked() {
                        export = true;
                    }
                });
            });
            ui.separator();

            let row_height = ui.spacing().interact_size.y;
            let row_count = matrix.rows.len() + matrix.orphans.len();
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::auto().at_least(120.0).clip(true))
                .column(Column::auto().at_least(70.0))
                .column(Column::remainder().clip(true))
                .header(row_height, |mut header| {
                    header.col(|ui| {
                        ui.strong("Requirement");
                    });
                    header.col(|ui| {
                        ui.strong("Covered");
                    });
                    header.col(|ui| {
                        ui.strong("Stories");
                    });
                })
                .body(|body| {
                    body.rows(row_height, row_count, |mut row| {
                        let i = row.index();
                        if let Some(req) = matrix.rows.get(i) {
                            row.col(|ui| {
                                ui.label(&req.id);
                            });
                            row.col(|ui| {
                                if req.is_covered() {
                                    ui.label(egui::RichText::new("✓ yes").color(color_success));
                                } else {
                                    ui.label(egui::RichText::new("✗ no").color(color_error));
                                }
                            });
                            row.col(|ui| {
                                ui.label(req.stories.join(", "));
                            });
                        } else if let Some(orphan) = matrix.orphans.get(i - matrix.rows.len()) {
                            row.col(|ui| {
                                ui.label(egui::RichText::new(&orphan.value).color(color_warning))
                                    .on_hover_text("Tagged in stories but missing from the requirement file");
                            });
                            row.col(|ui| {
                                ui.label(egui::RichText::new("orphan").color(color_warning));
                            });
                            row.col(|ui| {
                                ui.label(orphan.stories.join(", "));
                            });
                        }
                    });
                });
        });

    if export {
        let file_name = format!(
            "coverage-{}.csv",
            matrix.key.trim_start_matches('@').replace(' ', "_")
        );
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(file_name)
            .add_filter("CSV", &["csv"])
            .save_file()
        {
            state.export_matrix(&path);
        }
    }
    if !open {
        state.matrix = None;
    }
}
