use eframe::egui;
use medimark::gui::{AppConfig, EditorApp};
use medimark::logging;

fn main() -> anyhow::Result<()> {
    logging::init(cfg!(debug_assertions));

    let config = AppConfig::from_env();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([900.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "medimark",
        native_options,
        Box::new(move |_cc| Box::new(EditorApp::new(config))),
    )
    .map_err(|e| anyhow::anyhow!("eframe exited with error: {e}"))?;
    Ok(())
}
