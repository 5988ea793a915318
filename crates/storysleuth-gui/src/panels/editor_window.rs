/// Story editor window with syntax highlighting.
use crate::state::AppState;
use crate::theme::StorySleuthTheme;
use egui::text::{LayoutJob, TextFormat};
use egui::{Color32, FontId};
use storysleuth_core::model::line::{classify, keyword_span};
use storysleuth_core::model::LineKind;

/// Build a highlighted layout for story text. Each line is coloured by its
/// classification; step keywords get their own colour.
pub fn highlight(text: &str, theme: &StorySleuthTheme, font_id: FontId) -> LayoutJob {
    let mut job = LayoutJob::default();
    let format = |color: Color32| TextFormat::simple(font_id.clone(), color);

    for line in text.split_inclusive('\n') {
        let kind = classify(line);
        let body_color = match kind {
            LineKind::Step(_) => theme.text_primary,
            other => theme.line_color(other),
        };
        match keyword_span(line) {
            Some(span) => {
                let keyword_color = match kind {
                    LineKind::Step(_) => theme.step_keyword,
                    other => theme.line_color(other),
                };
                job.append(&line[..span.start], 0.0, format(body_color));
                job.append(&line[span.clone()], 0.0, format(keyword_color));
                job.append(&line[span.end..], 0.0, format(body_color));
            }
            None => job.append(line, 0.0, format(body_color)),
        }
    }
    job
}

/// Draw the editor window while a story is open.
pub fn editor_window(ctx: &egui::Context, state: &mut AppState) {
    let Some(editor) = state.editor.as_mut() else {
        return;
    };

    let theme = StorySleuthTheme::for_mode(state.dark_mode);
    let mut open = true;
    let mut save = false;
    let mut font_delta = 0.0;
    let title = if editor.is_dirty() {
        format!("✏ {} *", editor.title)
    } else {
        format!("✏ {}", editor.title)
    };

    egui::Window::new(title)
        .id(egui::Id::new("story_editor"))
        .open(&mut open)
        .default_size([720.0, 560.0])
        .resizable(true)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(editor.is_dirty(), egui::Button::new("💾 Save"))
                    .clicked()
                {
                    save = true;
                }
                ui.separator();
                if ui.button("A−").on_hover_text("Smaller text").clicked() {
                    font_delta = -1.0;
                }
                ui.label(format!("{:.0} pt", editor.font_size));
                if ui.button("A+").on_hover_text("Larger text").clicked() {
                    font_delta = 1.0;
                }
                ui.checkbox(&mut editor.monospace, "Monospace");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(editor.path.display().to_string())
                            .size(11.0)
                            .color(ui.visuals().weak_text_color()),
                    );
                });
            });
            ui.separator();

            let font_id = if editor.monospace {
                FontId::monospace(editor.font_size)
            } else {
                FontId::proportional(editor.font_size)
            };
            let mut layouter = |ui: &egui::Ui, text: &str, wrap_width: f32| {
                let mut job = highlight(text, &theme, font_id.clone());
                job.wrap.max_width = wrap_width;
                ui.fonts(|f| f.layout_job(job))
            };

            egui::ScrollArea::both()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut editor.text)
                            .code_editor()
                            .desired_width(f32::INFINITY)
                            .layouter(&mut layouter),
                    );
                });

            // Ctrl+S saves.
            if ui.input_mut(|i| i.consume_key(egui::Modifiers::COMMAND, egui::Key::S)) {
                save = true;
            }
        });

    if font_delta != 0.0 {
        state.change_editor_font(font_delta);
    }
    if save {
        state.save_editor();
    }
    if !open {
        state.close_editor();
    }
}
