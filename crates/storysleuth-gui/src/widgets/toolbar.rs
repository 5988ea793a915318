/// Top action bar -- menus, scan controls, theme toggle, and branding.
use crate::state::{AppPhase, AppState};
use egui::Ui;
use storysleuth_core::analysis::OutlineKind;

/// Documentation links carried in the Documentation menu.
pub const DOC_LINKS: [(&str, &str); 4] = [
    ("jBehave", "http://jbehave.org/"),
    ("Serenity", "http://thucydides.info/docs/serenity/"),
    ("Selenium", "http://www.seleniumhq.org/docs/"),
    (
        "jBehave meta filtering",
        "http://jbehave.org/reference/stable/meta-filtering.html",
    ),
];

/// Draw the toolbar.
pub fn toolbar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        // App title -- uses the egui accent/hyperlink colour so it adapts to
        // dark and light mode automatically.
        ui.label(
            egui::RichText::new("🔍 StorySleuth")
                .size(18.0)
                .strong()
                .color(ui.visuals().hyperlink_color),
        );

        ui.separator();

        file_menu(ui, state);
        run_menu(ui, state);
        ui.menu_button("Documentation", |ui| {
            for (label, url) in DOC_LINKS {
                ui.hyperlink_to(label, url);
            }
        });
        ui.menu_button("Help", |ui| {
            if ui.button("About StorySleuth").clicked() {
                state.show_about = true;
                ui.close_menu();
            }
        });

        ui.separator();

        // Rescan button.
        let can_scan = state.phase != AppPhase::Scanning;
        if ui
            .add_enabled(
                can_scan,
                egui::Button::new("🔄 Rescan").min_size(egui::vec2(80.0, 28.0)),
            )
            .on_hover_text("Re-read every story under the story root")
            .clicked()
        {
            state.rescan();
        }

        // Stop button (only during scan).
        let can_stop = state.phase == AppPhase::Scanning;
        if ui
            .add_enabled(
                can_stop,
                egui::Button::new("⏹ Stop").min_size(egui::vec2(70.0, 28.0)),
            )
            .clicked()
        {
            state.cancel_scan();
        }

        // Right-aligned controls.
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("ℹ").on_hover_text("About StorySleuth").clicked() {
                state.show_about = true;
            }

            // ── Theme toggle (☀ light / 🌙 dark) ──────────────────
            let theme_label = if state.dark_mode { "☀" } else { "🌙" };
            let theme_tip = if state.dark_mode {
                "Switch to light mode"
            } else {
                "Switch to dark mode"
            };
            if ui.button(theme_label).on_hover_text(theme_tip).clicked() {
                state.dark_mode = !state.dark_mode;
            }

            if state.selenium_handle.is_some() {
                ui.separator();
                ui.label(
                    egui::RichText::new("● Selenium")
                        .size(11.0)
                        .color(egui::Color32::from_rgb(0xa6, 0xe3, 0xa1)),
                );
            }
        });
    });
}

fn file_menu(ui: &mut Ui, state: &mut AppState) {
    ui.menu_button("File", |ui| {
        if ui.button("📁 Choose story folder…").clicked() {
            ui.close_menu();
            let mut dialog = rfd::FileDialog::new().set_title("Choose story folder");
            let current = state.settings.stories_root();
            if current.is_dir() {
                dialog = dialog.set_directory(current);
            }
            if let Some(dir) = dialog.pick_folder() {
                state.set_story_root(dir);
            }
        }
        if ui.button("⚙ Settings…").clicked() {
            ui.close_menu();
            state.open_settings();
        }

        ui.separator();

        let has_index = state.index.is_some();
        for kind in OutlineKind::ALL {
            if ui.add_enabled(has_index, egui::Button::new(kind.label())).clicked() {
                ui.close_menu();
                if let Some(path) = rfd::FileDialog::new()
                    .set_file_name(kind.default_file_name())
                    .add_filter("Text", &["txt"])
                    .save_file()
                {
                    state.export_outline(kind, &path);
                }
            }
        }

        ui.separator();

        if ui
            .add_enabled(has_index, egui::Button::new("📤 Export coverage CSV…"))
            .clicked()
        {
            ui.close_menu();
            if let Some(path) = rfd::FileDialog::new()
                .set_file_name("coverage.csv")
                .add_filter("CSV", &["csv"])
                .save_file()
            {
                state.export_report(&path);
            }
        }

        ui.separator();

        if ui.button("Exit").clicked() {
            ui.close_menu();
            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });
}

fn run_menu(ui: &mut Ui, state: &mut AppState) {
    ui.menu_button("Run", |ui| {
        let running = state.selenium_handle.is_some();
        if ui
            .add_enabled(!running, egui::Button::new("Start Selenium server"))
            .on_hover_text(format!("Listens on port {}", state.settings.selenium.port))
            .clicked()
        {
            ui.close_menu();
            state.start_selenium();
        }
        if ui
            .add_enabled(running, egui::Button::new("Stop Selenium server"))
            .clicked()
        {
            ui.close_menu();
            state.stop_selenium();
        }
    });
}
