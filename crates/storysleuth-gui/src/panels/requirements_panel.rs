/// Requirements tab -- one requirement CSV at a time, as a table.
use crate::state::AppState;
use egui::Ui;
use egui_extras::{Column, TableBuilder};
use storysleuth_core::model::format::format_count;

/// Draw the Requirements tab.
pub fn requirements_panel(ui: &mut Ui, state: &mut AppState) {
    let color_muted = ui.visuals().weak_text_color();
    let color_error = egui::Color32::from_rgb(0xf3, 0x8b, 0xa8);

    if state.requirements.is_empty() {
        ui.add_space(24.0);
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new("No requirement files are configured")
                    .size(16.0)
                    .color(color_muted),
            );
            ui.add_space(8.0);
            if ui.button("⚙ Open settings").clicked() {
                state.open_settings();
            }
        });
        return;
    }

    let categories: Vec<String> = state.requirements.categories().map(str::to_string).collect();

    ui.horizontal(|ui| {
        ui.label("Category:");
        let current = state.selected_category.clone().unwrap_or_default();
        egui::ComboBox::from_id_salt("requirement_category")
            .selected_text(&current)
            .show_ui(ui, |ui| {
                for category in &categories {
                    ui.selectable_value(
                        &mut state.selected_category,
                        Some(category.clone()),
                        category,
                    );
                }
            });

        if let Some(category) = &state.selected_category {
            if let Some(path) = state.requirements.path(category) {
                ui.label(
                    egui::RichText::new(path.display().to_string())
                        .size(11.0)
                        .color(color_muted),
                );
            }
        }
    });

    ui.separator();

    let Some(category) = state.selected_category.clone() else {
        return;
    };

    // A category whose file failed to load gets a file prompt instead of a
    // table.
    if let Some(err) = state.requirements.error(&category).map(str::to_string) {
        ui.label(egui::RichText::new(err).color(color_error));
        ui.add_space(8.0);
        if ui.button("📂 Choose requirement file…").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .set_title(format!("Requirement file for {category}"))
                .add_filter("CSV", &["csv"])
                .pick_file()
            {
                state.reload_requirement(&category, path);
            }
        }
        return;
    }

    let Some(table) = state.requirements.table(&category) else {
        return;
    };

    ui.label(
        egui::RichText::new(format!("{} requirements", format_count(table.count() as u64)))
            .strong(),
    );
    ui.add_space(4.0);

    let row_height = ui.spacing().interact_size.y;
    let columns = table.headers.len().max(1);
    ui.push_id(("requirement_table", &category), |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(60.0).clip(true), columns - 1)
            .column(Column::remainder())
            .header(row_height, |mut header| {
                for title in &table.headers {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(row_height, table.rows.len(), |mut row| {
                    let cells = &table.rows[row.index()];
                    for i in 0..columns {
                        row.col(|ui| {
                            ui.label(cells.get(i).map(String::as_str).unwrap_or(""));
                        });
                    }
                });
            });
    });
}
