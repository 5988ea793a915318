/// Colour scheme and visual theme for StorySleuth.
///
/// Provides both dark and light palettes. All colour constants are defined
/// here so the panels reference semantically-named values (story syntax,
/// coverage, console streams) rather than raw hex codes.
use egui::{Color32, Stroke, Visuals};
use storysleuth_core::analysis::Coverage;
use storysleuth_core::model::LineKind;

/// Semantic colour palette for StorySleuth.
pub struct StorySleuthTheme {
    pub background: Color32,
    pub surface: Color32,
    pub surface_hover: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,
    pub accent: Color32,
    pub error: Color32,
    pub warning: Color32,
    pub success: Color32,
    pub separator: Color32,
    pub selection: Color32,

    // ── Story syntax ──
    pub narrative: Color32,
    pub scenario: Color32,
    pub meta_keyword: Color32,
    pub metatag: Color32,
    pub step_keyword: Color32,
    pub examples: Color32,
    pub table_row: Color32,
    pub comment: Color32,

    // ── Coverage bar ──
    pub coverage_low: Color32,
    pub coverage_high: Color32,
}

impl StorySleuthTheme {
    /// Dark theme -- the default.
    pub fn dark() -> Self {
        Self {
            background: Color32::from_rgb(0x1e, 0x1e, 0x2e),
            surface: Color32::from_rgb(0x2a, 0x2a, 0x3c),
            surface_hover: Color32::from_rgb(0x35, 0x35, 0x4a),
            text_primary: Color32::from_rgb(0xe4, 0xe4, 0xe8),
            text_secondary: Color32::from_rgb(0xb8, 0xb8, 0xc4),
            text_muted: Color32::from_rgb(0x6c, 0x70, 0x86),
            accent: Color32::from_rgb(0x89, 0xb4, 0xfa),
            error: Color32::from_rgb(0xf3, 0x8b, 0xa8),
            warning: Color32::from_rgb(0xfa, 0xb3, 0x87),
            success: Color32::from_rgb(0xa6, 0xe3, 0xa1),
            separator: Color32::from_rgb(0x3a, 0x3a, 0x50),
            selection: Color32::from_rgb(0x28, 0x3a, 0x5c),
            narrative: Color32::from_rgb(0x94, 0xe2, 0xd5),
            scenario: Color32::from_rgb(0x89, 0xb4, 0xfa),
            meta_keyword: Color32::from_rgb(0xcb, 0xa6, 0xf7),
            metatag: Color32::from_rgb(0xf9, 0xe2, 0xaf),
            step_keyword: Color32::from_rgb(0xa6, 0xe3, 0xa1),
            examples: Color32::from_rgb(0xfa, 0xb3, 0x87),
            table_row: Color32::from_rgb(0xb8, 0xb8, 0xc4),
            comment: Color32::from_rgb(0x6c, 0x70, 0x86),
            coverage_low: Color32::from_rgb(0xf3, 0x8b, 0xa8),
            coverage_high: Color32::from_rgb(0xa6, 0xe3, 0xa1),
        }
    }

    /// Light theme -- optional toggle.
    pub fn light() -> Self {
        Self {
            background: Color32::from_rgb(0xf5, 0xf5, 0xf5),
            surface: Color32::from_rgb(0xff, 0xff, 0xff),
            surface_hover: Color32::from_rgb(0xe8, 0xe8, 0xef),
            text_primary: Color32::from_rgb(0x1e, 0x1e, 0x2e),
            text_secondary: Color32::from_rgb(0x4a, 0x4a, 0x5a),
            text_muted: Color32::from_rgb(0x8a, 0x8a, 0x9a),
            accent: Color32::from_rgb(0x3a, 0x6f, 0xd8),
            error: Color32::from_rgb(0xd0, 0x40, 0x50),
            warning: Color32::from_rgb(0xd0, 0x80, 0x20),
            success: Color32::from_rgb(0x30, 0x98, 0x30),
            separator: Color32::from_rgb(0xd0, 0xd0, 0xd8),
            selection: Color32::from_rgba_premultiplied(0x3a, 0x6f, 0xd8, 0x30),
            narrative: Color32::from_rgb(0x17, 0x92, 0x99),
            scenario: Color32::from_rgb(0x1e, 0x66, 0xf5),
            meta_keyword: Color32::from_rgb(0x88, 0x39, 0xef),
            metatag: Color32::from_rgb(0xa0, 0x6a, 0x00),
            step_keyword: Color32::from_rgb(0x30, 0x88, 0x30),
            examples: Color32::from_rgb(0xd0, 0x60, 0x10),
            table_row: Color32::from_rgb(0x4a, 0x4a, 0x5a),
            comment: Color32::from_rgb(0x8a, 0x8a, 0x9a),
            coverage_low: Color32::from_rgb(0xd0, 0x50, 0x60),
            coverage_high: Color32::from_rgb(0x60, 0xb0, 0x60),
        }
    }

    /// Get the palette for the current mode.
    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self::dark()
        } else {
            Self::light()
        }
    }

    /// Apply this theme to an egui context.
    pub fn apply(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        let mut visuals = if self.background.r() < 128 {
            Visuals::dark()
        } else {
            Visuals::light()
        };

        visuals.panel_fill = self.background;
        visuals.window_fill = self.surface;
        visuals.extreme_bg_color = self.background;
        visuals.faint_bg_color = self.surface;
        visuals.selection.bg_fill = self.selection;
        visuals.selection.stroke = Stroke::new(1.0, self.accent);
        visuals.hyperlink_color = self.accent;

        visuals.widgets.noninteractive.bg_fill = self.surface;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_primary);
        visuals.widgets.inactive.bg_fill = self.surface;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_secondary);
        visuals.widgets.hovered.bg_fill = self.surface_hover;
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.accent);
        visuals.widgets.active.bg_fill = self.accent;
        visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.background);

        visuals.window_stroke = Stroke::new(1.0, self.separator);

        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(8.0, 4.0);
        style.spacing.button_padding = egui::vec2(8.0, 4.0);

        ctx.set_style(style);
    }

    /// Colour for a whole story line in the editor. Steps use the body
    /// colour here; their keyword is coloured separately.
    pub fn line_color(&self, kind: LineKind) -> Color32 {
        match kind {
            LineKind::Narrative => self.narrative,
            LineKind::Scenario => self.scenario,
            LineKind::MetaKeyword => self.meta_keyword,
            LineKind::Metatag => self.metatag,
            LineKind::Examples => self.examples,
            LineKind::TableRow => self.table_row,
            LineKind::Comment => self.comment,
            LineKind::Step(_) | LineKind::Blank | LineKind::Text => self.text_primary,
        }
    }

    /// Coverage cell colour: interpolated for percentages, muted otherwise.
    pub fn coverage_color(&self, coverage: Coverage) -> Color32 {
        match coverage {
            Coverage::Percent(p) => {
                lerp_color(self.coverage_low, self.coverage_high, (p / 100.0) as f32)
            }
            Coverage::Unavailable => self.warning,
            Coverage::Untracked => self.text_muted,
        }
    }
}

/// Linear interpolation between two colours.
fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    Color32::from_rgb(
        (a.r() as f32 * (1.0 - t) + b.r() as f32 * t) as u8,
        (a.g() as f32 * (1.0 - t) + b.g() as f32 * t) as u8,
        (a.b() as f32 * (1.0 - t) + b.b() as f32 * t) as u8,
    )
}
