/// Main `eframe::App` implementation for StorySleuth.
///
/// This is the top-level UI layout that composes all panels and widgets.
use crate::panels;
use crate::state::{AppPhase, AppState, NoticeLevel, Tab};
use crate::theme::StorySleuthTheme;
use crate::widgets;
use storysleuth_core::settings::Settings;

/// Pre-built application state.
///
/// Construct this **before** calling `eframe::run_native` so that settings,
/// requirement files, and the initial scan kick-off are done before the OS
/// window is created and the first frame has something to show.
pub struct StorySleuthState {
    pub(crate) inner: AppState,
}

impl StorySleuthState {
    /// Load settings and requirement files, then start scanning the story
    /// root. Call this before `eframe::run_native`.
    pub fn build() -> Self {
        let path = Settings::default_path();
        let (settings, load_error) = match Settings::load(&path) {
            Ok(settings) => (settings, None),
            Err(err) => {
                let settings = Settings {
                    source: Some(path.clone()),
                    ..Settings::default()
                };
                (settings, Some(err))
            }
        };

        let mut state = AppState::with_settings(settings, path);
        if let Some(err) = load_error {
            state.push_notice(
                NoticeLevel::Warning,
                format!("{err} -- using default settings"),
            );
        }
        for category in state
            .requirements
            .categories()
            .filter(|c| state.requirements.error(c).is_some())
            .map(str::to_string)
            .collect::<Vec<_>>()
        {
            state.push_notice(
                NoticeLevel::Warning,
                format!("Requirement file for '{category}' could not be loaded"),
            );
        }

        // Auto-scan the configured story root on startup.
        if !state.settings.stories.as_os_str().is_empty() {
            state.rescan();
        }

        Self { inner: state }
    }
}

/// The StorySleuth application.
pub struct StorySleuthApp {
    state: AppState,
}

impl StorySleuthApp {
    /// Create a new application instance from pre-built state.
    ///
    /// The state should have been constructed by [`StorySleuthState::build()`]
    /// *before* `eframe::run_native` is called.
    pub fn with_state(cc: &eframe::CreationContext<'_>, state: StorySleuthState) -> Self {
        // ── Font: Segoe UI ────────────────────────────────────────────────
        // Register Segoe UI as the highest-priority proportional font on
        // Windows. Monospace stays on the egui default so the editor and
        // console keep fixed-width columns.
        if cfg!(windows) {
            let system_root =
                std::env::var("SystemRoot").unwrap_or_else(|_| "C:\\Windows".to_string());
            let font_path = format!("{system_root}\\Fonts\\segoeui.ttf");

            let mut fonts = egui::FontDefinitions::default();
            match std::fs::read(&font_path) {
                Ok(bytes) => {
                    fonts.font_data.insert(
                        "SegoeUI".to_owned(),
                        egui::FontData::from_owned(bytes).into(),
                    );
                    fonts
                        .families
                        .entry(egui::FontFamily::Proportional)
                        .or_default()
                        .insert(0, "SegoeUI".to_owned());
                    tracing::info!("Loaded Segoe UI from {}", font_path);
                }
                Err(e) => {
                    tracing::warn!(
                        "Could not load Segoe UI from {}: {} -- using default font",
                        font_path,
                        e
                    );
                }
            }
            cc.egui_ctx.set_fonts(fonts);
        }

        StorySleuthTheme::for_mode(state.inner.dark_mode).apply(&cc.egui_ctx);

        Self { state: state.inner }
    }
}

impl Drop for StorySleuthApp {
    /// Kill child processes still running when the window closes.
    fn drop(&mut self) {
        self.state.cancel_scan();
        self.state.cancel_run();
        self.state.stop_selenium();
    }
}

impl eframe::App for StorySleuthApp {
    /// Override the GPU clear colour to match the active theme background,
    /// preventing a colour mismatch flash between frames.
    fn clear_color(&self, visuals: &egui::Visuals) -> [f32; 4] {
        let [r, g, b, a] = visuals.panel_fill.to_array();
        [
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ]
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ── Apply theme ───────────────────────────────────────────────────
        // Called every frame so that toggling dark_mode takes effect
        // immediately on the next rendered frame.
        StorySleuthTheme::for_mode(self.state.dark_mode).apply(ctx);

        // ── Process background messages ───────────────────────────────────
        let scan_changed = self.state.process_scan_messages();
        let run_changed = self.state.process_run_messages();
        if scan_changed || run_changed {
            ctx.request_repaint();
        }

        // Keep polling while anything runs in the background.
        let busy = self.state.phase == AppPhase::Scanning
            || self.state.is_running()
            || self.state.selenium_handle.is_some();
        if busy {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        // ── Top toolbar ───────────────────────────────────────────────────
        egui::TopBottomPanel::top("toolbar")
            .min_height(36.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                widgets::toolbar::toolbar(ui, &mut self.state);
                ui.add_space(4.0);
            });

        if !self.state.notices.is_empty() {
            egui::TopBottomPanel::top("notices").show(ctx, |ui| {
                widgets::notice_bar::notice_bar(ui, &mut self.state);
            });
        }

        // ── Windows ───────────────────────────────────────────────────────
        self.about_window(ctx);
        self.scan_errors_window(ctx);
        panels::settings_window::settings_window(ctx, &mut self.state);
        panels::editor_window::editor_window(ctx, &mut self.state);
        panels::matrix_window::matrix_window(ctx, &mut self.state);

        // ── Bottom status bar ─────────────────────────────────────────────
        egui::TopBottomPanel::bottom("status_bar")
            .min_height(24.0)
            .show(ctx, |ui| {
                ui.add_space(2.0);
                widgets::status_bar::status_bar(ui, &mut self.state);
                ui.add_space(2.0);
            });

        // ── Central panel (tabs) ──────────────────────────────────────────
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tab in Tab::ALL {
                    ui.selectable_value(&mut self.state.tab, tab, tab.label());
                }
            });
            ui.separator();

            match self.state.tab {
                Tab::Requirements => {
                    panels::requirements_panel::requirements_panel(ui, &mut self.state)
                }
                Tab::Browse => panels::browse_panel::browse_panel(ui, &mut self.state),
                Tab::Tag => panels::tag_panel::tag_panel(ui, &mut self.state),
                Tab::Execute => panels::execute_panel::execute_panel(ui, &mut self.state),
            }
        });
    }
}

impl StorySleuthApp {
    fn about_window(&mut self, ctx: &egui::Context) {
        let mut show_about = self.state.show_about;
        egui::Window::new("About StorySleuth")
            .open(&mut show_about)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .fixed_size([340.0, 0.0])
            .show(ctx, |ui| {
                // Use theme-aware colours so the dialog looks correct in both
                // dark and light mode.
                let accent = ui.visuals().hyperlink_color;
                let muted = ui.visuals().weak_text_color();
                let normal = ui.visuals().text_color();
                let strong = ui.visuals().strong_text_color();

                ui.vertical_centered(|ui| {
                    ui.add_space(8.0);
                    ui.label(
                        egui::RichText::new("🔍 StorySleuth")
                            .size(24.0)
                            .strong()
                            .color(accent),
                    );
                    ui.add_space(4.0);
                    ui.label(
                        egui::RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                            .size(13.0)
                            .color(muted),
                    );
                    ui.add_space(12.0);
                    ui.label(
                        egui::RichText::new(
                            "Browse and tag jBehave story files.\n\
                             Metatag statistics, requirement coverage,\n\
                             and an embedded Serenity test-run console.",
                        )
                        .size(12.0)
                        .color(normal),
                    );
                    ui.add_space(12.0);
                    ui.separator();
                    ui.add_space(8.0);
                    ui.label(
                        egui::RichText::new("Developed by Swatto")
                            .size(13.0)
                            .strong()
                            .color(strong),
                    );
                    ui.add_space(4.0);
                    ui.hyperlink_to(
                        "github.com/Swatto86/StorySleuth",
                        "https://github.com/Swatto86/StorySleuth",
                    );
                    ui.add_space(4.0);
                    ui.label(
                        egui::RichText::new("MIT License")
                            .size(11.0)
                            .color(muted),
                    );
                    ui.add_space(4.0);
                    ui.label(
                        egui::RichText::new("Built with Rust & egui")
                            .size(11.0)
                            .color(muted),
                    );
                    ui.add_space(8.0);
                });
            });
        self.state.show_about = show_about;
    }

    fn scan_errors_window(&mut self, ctx: &egui::Context) {
        let mut open = self.state.show_scan_errors;
        egui::Window::new("Unreadable files")
            .open(&mut open)
            .default_size([520.0, 320.0])
            .show(ctx, |ui| {
                let muted = ui.visuals().weak_text_color();
                if self.state.scan_error_count as usize > self.state.scan_errors.len() {
                    ui.label(
                        egui::RichText::new(format!(
                            "Showing the first {} of {}",
                            self.state.scan_errors.len(),
                            self.state.scan_error_count
                        ))
                        .color(muted),
                    );
                }
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        for (path, message) in &self.state.scan_errors {
                            ui.label(egui::RichText::new(path).strong());
                            ui.label(egui::RichText::new(message).color(muted));
                            ui.add_space(4.0);
                        }
                    });
            });
        self.state.show_scan_errors = open;
    }
}
