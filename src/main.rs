mod app;
mod color;
mod config;
mod data;
mod error;
mod render;
mod state;
mod structure;
mod ui;

use std::path::PathBuf;

use app::DashboardApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // Data folder: first argument, default the working directory.
    let root = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let config = DashboardConfig::load_or_default(&root);
    log::info!("Data folder {}", config.root.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Text Mined Crystal Structure Database of Superconductors",
        options,
        Box::new(|cc| {
            // Install image loaders so the optional logo can be shown.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(DashboardApp::new(config)))
        }),
    )
}
