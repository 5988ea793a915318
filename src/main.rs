//! StorySleuth -- desktop browser and tagger for BDD story files.
//!
//! Thin binary entry point. All logic lives in the `storysleuth-core`
//! and `storysleuth-gui` crates.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() -> anyhow::Result<()> {
    // Initialise structured logging. `RUST_LOG` overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("StorySleuth {} starting", env!("CARGO_PKG_VERSION"));

    let icon = storysleuth_gui::icon::generate_icon(64);

    // Settings, requirement files and the first scan are set up before the
    // window opens so the first frame already has content.
    let state = storysleuth_gui::StorySleuthState::build();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("StorySleuth -- BDD Story Browser")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 560.0])
            .with_icon(icon)
            // Avoids a white fill before the first OpenGL frame on Windows.
            .with_transparent(true),
        ..Default::default()
    };

    eframe::run_native(
        "StorySleuth",
        options,
        Box::new(|cc| {
            Ok(Box::new(storysleuth_gui::StorySleuthApp::with_state(
                cc, state,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))?;

    Ok(())
}
