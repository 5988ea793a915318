/// Bottom status bar -- scan progress, index statistics, and run state.
use crate::state::{AppPhase, AppState, RunPhase};
use egui::Ui;
use storysleuth_core::model::format::{format_count, format_duration};

/// Draw the status bar at the bottom of the window.
pub fn status_bar(ui: &mut Ui, state: &mut AppState) {
    // Extract theme-adaptive colours once for this frame.
    let color_accent = ui.visuals().hyperlink_color;
    let color_weak = ui.visuals().weak_text_color();
    let color_normal = ui.visuals().text_color();
    let color_warning = egui::Color32::from_rgb(0xfa, 0xb3, 0x87);
    let color_success = egui::Color32::from_rgb(0xa6, 0xe3, 0xa1);

    ui.horizontal(|ui| {
        match state.phase {
            AppPhase::Idle => {
                let text = if state.scan_was_cancelled {
                    "Scan stopped"
                } else {
                    "Ready"
                };
                ui.label(egui::RichText::new(text).size(12.0).color(color_weak));
            }
            AppPhase::Scanning => {
                ui.spinner();

                let display_path = truncate_path(&state.scan_current_path, 60);
                ui.label(
                    egui::RichText::new(format!("Scanning {display_path}..."))
                        .size(12.0)
                        .color(color_normal),
                );

                ui.separator();

                ui.label(
                    egui::RichText::new(format!(
                        "{} / {} files read",
                        format_count(state.scan_files_parsed),
                        format_count(state.scan_files_found)
                    ))
                    .size(12.0)
                    .color(color_normal),
                );
            }
            AppPhase::Results => {
                if let Some(index) = state.index.clone() {
                    let (status_text, status_color) = if state.scan_was_cancelled {
                        ("\u{23f9} Scan stopped (previous results)", color_warning)
                    } else {
                        ("\u{2713} Scan complete", color_success)
                    };
                    ui.label(
                        egui::RichText::new(status_text)
                            .size(12.0)
                            .color(status_color),
                    );

                    ui.separator();

                    ui.label(
                        egui::RichText::new(format!(
                            "{} stories",
                            format_count(index.stories.len() as u64)
                        ))
                        .size(12.0)
                        .color(color_normal),
                    );

                    ui.separator();

                    ui.label(
                        egui::RichText::new(format!(
                            "{} keys, {} metatags",
                            format_count(state.report.key_count as u64),
                            format_count(state.report.total_values as u64)
                        ))
                        .size(12.0)
                        .color(color_accent),
                    );

                    if let Some(duration) = state.scan_duration {
                        ui.separator();
                        ui.label(
                            egui::RichText::new(format_duration(duration))
                                .size(12.0)
                                .color(color_weak),
                        );
                    }

                    if state.scan_error_count > 0 {
                        ui.separator();
                        if ui
                            .link(
                                egui::RichText::new(format!(
                                    "{} unreadable",
                                    format_count(state.scan_error_count)
                                ))
                                .size(12.0)
                                .color(color_warning),
                            )
                            .on_hover_text("Show files that could not be read")
                            .clicked()
                        {
                            state.show_scan_errors = true;
                        }
                    }
                }
            }
        }

        // Run state, right-aligned.
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let (text, color) = match state.run_phase {
                RunPhase::Idle => return,
                RunPhase::Running => ("▶ Test run in progress".to_string(), color_accent),
                RunPhase::Finished(status) if status.success() => {
                    (format!("Test run {}", status.describe()), color_success)
                }
                RunPhase::Finished(status) => {
                    (format!("Test run {}", status.describe()), color_warning)
                }
                RunPhase::Failed => ("Test run could not start".to_string(), color_warning),
            };
            ui.label(egui::RichText::new(text).size(12.0).color(color));
        });
    });
}

/// Truncate a path string to fit within `max_len` characters,
/// replacing the middle with "..." if needed.
pub fn truncate_path(path: &str, max_len: usize) -> String {
    let chars: Vec<char> = path.chars().collect();
    if chars.len() <= max_len {
        return path.to_string();
    }
    let half = (max_len.saturating_sub(3)) / 2;
    let head: String = chars[..half].iter().collect();
    let tail: String = chars[chars.len() - half..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_paths_are_untouched() {
        assert_eq!(truncate_path("a/b.story", 60), "a/b.story");
    }

    #[test]
    fn long_paths_keep_both_ends() {
        let path = format!("start/{}/end.story", "x".repeat(100));
        let out = truncate_path(&path, 21);
        assert_eq!(out.chars().count(), 21);
        assert!(out.starts_with("start/"));
        assert!(out.ends_with("d.story"));
    }

    #[test]
    fn multibyte_paths_do_not_split_characters() {
        let path = "é".repeat(80);
        assert_eq!(truncate_path(&path, 11).chars().count(), 11);
    }
}
