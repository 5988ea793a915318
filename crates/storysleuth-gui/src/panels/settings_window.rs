/// Settings window -- edits the JSON settings file.
use crate::state::{AppState, SettingsForm};
use std::path::PathBuf;
use storysleuth_core::settings::Browser;

/// Draw the settings window while a form is open. Save writes the file and
/// applies it; Cancel or the close button discards the form.
pub fn settings_window(ctx: &egui::Context, state: &mut AppState) {
    let Some(mut form) = state.settings_form.take() else {
        return;
    };

    let mut open = true;
    let mut save = false;
    let mut cancel = false;
    let settings_path = state.settings_path.display().to_string();

    egui::Window::new("⚙ Settings")
        .open(&mut open)
        .default_width(560.0)
        .resizable(true)
        .collapsible(false)
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(&settings_path)
                    .size(11.0)
                    .color(ui.visuals().weak_text_color()),
            );
            ui.separator();

            egui::ScrollArea::vertical()
                .max_height(480.0)
                .show(ui, |ui| {
                    stories_section(ui, &mut form);
                    requirements_section(ui, &mut form);
                    coverage_section(ui, &mut form);
                    runner_section(ui, &mut form);
                    selenium_section(ui, &mut form);
                });

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("💾 Save").clicked() {
                    save = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

    if save {
        state.apply_settings(form.into_settings());
    } else if open && !cancel {
        state.settings_form = Some(form);
    }
}

/// Single-line editor for a path field.
fn path_edit(ui: &mut egui::Ui, path: &mut PathBuf, hint: &str) -> bool {
    let mut text = path.display().to_string();
    let changed = ui
        .add(
            egui::TextEdit::singleline(&mut text)
                .desired_width(340.0)
                .hint_text(hint),
        )
        .changed();
    if changed {
        *path = PathBuf::from(text);
    }
    changed
}

fn optional_path_edit(ui: &mut egui::Ui, path: &mut Option<PathBuf>, hint: &str) {
    let mut value = path.clone().unwrap_or_default();
    if path_edit(ui, &mut value, hint) {
        *path = (!value.as_os_str().is_empty()).then_some(value);
    }
}

fn stories_section(ui: &mut egui::Ui, form: &mut SettingsForm) {
    ui.heading("Stories");
    ui.horizontal(|ui| {
        path_edit(ui, &mut form.settings.stories, "story root");
        if ui.button("📁").clicked() {
            if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                form.settings.stories = dir;
            }
        }
    });
    let scan = &mut form.settings.scan;
    ui.checkbox(&mut scan.skip_hidden, "Skip hidden files and folders");
    ui.checkbox(&mut scan.follow_links, "Follow symbolic links");
    ui.checkbox(&mut scan.story_files_only, "Only read files ending in .story");
    ui.add_space(8.0);
}

fn requirements_section(ui: &mut egui::Ui, form: &mut SettingsForm) {
    ui.heading("Requirement files");
    let mut remove = None;
    egui::Grid::new("settings_requirements")
        .num_columns(3)
        .show(ui, |ui| {
            for (category, path) in form.settings.requirements.iter_mut() {
                ui.label(category);
                ui.horizontal(|ui| {
                    path_edit(ui, path, "file.csv");
                    if ui.button("📂").clicked() {
                        if let Some(file) = rfd::FileDialog::new()
                            .add_filter("CSV", &["csv"])
                            .pick_file()
                        {
                            *path = file;
                        }
                    }
                });
                if ui.small_button("✕").on_hover_text("Remove category").clicked() {
                    remove = Some(category.clone());
                }
                ui.end_row();
            }
        });
    if let Some(category) = remove {
        form.settings.requirements.remove(&category);
    }
    ui.horizontal(|ui| {
        ui.add(
            egui::TextEdit::singleline(&mut form.new_category)
                .desired_width(160.0)
                .hint_text("new category"),
        );
        let name = form.new_category.trim().to_string();
        if ui
            .add_enabled(!name.is_empty(), egui::Button::new("Add"))
            .clicked()
        {
            form.settings.requirements.entry(name).or_default();
            form.new_category.clear();
        }
    });
    ui.add_space(8.0);
}

fn coverage_section(ui: &mut egui::Ui, form: &mut SettingsForm) {
    ui.heading("Coverage bindings");
    ui.label(
        egui::RichText::new("Metatag key → requirement category it is measured against")
            .size(11.0)
            .color(ui.visuals().weak_text_color()),
    );
    let categories: Vec<String> = form.settings.requirements.keys().cloned().collect();
    let mut remove = None;
    egui::Grid::new("settings_coverage")
        .num_columns(3)
        .show(ui, |ui| {
            for (key, category) in form.settings.coverage.iter_mut() {
                ui.label(key);
                egui::ComboBox::from_id_salt(("coverage_binding", key.as_str()))
                    .selected_text(category.as_str())
                    .show_ui(ui, |ui| {
                        for c in &categories {
                            ui.selectable_value(category, c.clone(), c);
                        }
                    });
                if ui.small_button("✕").on_hover_text("Remove binding").clicked() {
                    remove = Some(key.clone());
                }
                ui.end_row();
            }
        });
    if let Some(key) = remove {
        form.settings.coverage.remove(&key);
    }
    ui.horizontal(|ui| {
        ui.add(
            egui::TextEdit::singleline(&mut form.new_binding)
                .desired_width(160.0)
                .hint_text("@key"),
        );
        let key = storysleuth_core::editing::normalize_tag(&form.new_binding);
        if ui
            .add_enabled(key.is_some(), egui::Button::new("Add"))
            .clicked()
        {
            if let Some(key) = key {
                let category = categories.first().cloned().unwrap_or_default();
                form.settings.coverage.entry(key).or_insert(category);
            }
            form.new_binding.clear();
        }
    });
    ui.add_space(8.0);
}

fn runner_section(ui: &mut egui::Ui, form: &mut SettingsForm) {
    ui.heading("Test runner");
    let runner = &mut form.settings.runner;
    egui::Grid::new("settings_runner")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Program:");
            ui.text_edit_singleline(&mut runner.program);
            ui.end_row();

            ui.label("Goals:");
            ui.text_edit_singleline(&mut form.goals);
            ui.end_row();

            ui.label("Remote URL:");
            ui.text_edit_singleline(&mut runner.remote_url);
            ui.end_row();

            ui.label("Default browser:");
            egui::ComboBox::from_id_salt("settings_browser")
                .selected_text(runner.browser.label())
                .show_ui(ui, |ui| {
                    for browser in Browser::ALL {
                        ui.selectable_value(&mut runner.browser, browser, browser.label());
                    }
                });
            ui.end_row();

            ui.label("Screenshots:");
            ui.text_edit_singleline(&mut runner.screenshots);
            ui.end_row();

            ui.label("");
            ui.checkbox(&mut runner.ignore_failures, "Keep going when tests fail");
            ui.end_row();

            ui.label("Maven settings:");
            optional_path_edit(ui, &mut runner.maven_settings, "settings.xml");
            ui.end_row();

            ui.label("Working directory:");
            optional_path_edit(ui, &mut runner.working_dir, "nearest folder with pom.xml");
            ui.end_row();

            ui.label("Report:");
            path_edit(ui, &mut runner.report_path, "target/site/serenity/index.html");
            ui.end_row();

            ui.label("User property:");
            ui.text_edit_singleline(&mut runner.user_property);
            ui.end_row();

            ui.label("Password property:");
            ui.text_edit_singleline(&mut runner.password_property);
            ui.end_row();

            ui.label("Extra arguments:");
            ui.text_edit_singleline(&mut form.extra_args);
            ui.end_row();

            ui.label("Timeout:");
            ui.horizontal(|ui| {
                let mut limited = runner.timeout_secs.is_some();
                if ui.checkbox(&mut limited, "").changed() {
                    runner.timeout_secs = limited.then_some(3_600);
                }
                if let Some(secs) = runner.timeout_secs.as_mut() {
                    ui.add(egui::DragValue::new(secs).range(1..=86_400).suffix(" s"));
                }
            });
            ui.end_row();
        });
    ui.add_space(8.0);
}

fn selenium_section(ui: &mut egui::Ui, form: &mut SettingsForm) {
    ui.heading("Selenium server");
    let selenium = &mut form.settings.selenium;
    egui::Grid::new("settings_selenium")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Java:");
            ui.text_edit_singleline(&mut selenium.java);
            ui.end_row();

            ui.label("Server jar:");
            path_edit(ui, &mut selenium.server_jar, "selenium-server-standalone.jar");
            ui.end_row();

            ui.label("IE driver:");
            path_edit(ui, &mut selenium.ie_driver, "IEDriverServer.exe");
            ui.end_row();

            ui.label("Port:");
            ui.add(egui::DragValue::new(&mut selenium.port).range(1..=65_535));
            ui.end_row();
        });
}
