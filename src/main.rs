// src/main.rs
mod app;
mod ui;
mod video;

use eframe::egui;
use rep_tracker::TrackerConfig;
use tracing::{error, info};

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cameras = video::list_cameras();
    info!("Found {} camera(s)", cameras.len());
    for (i, name) in cameras.iter().enumerate() {
        info!("  [{}] {}", i, name);
    }

    let config = TrackerConfig::load_or_default();
    info!(
        exercise = %config.exercise,
        frame_rate = config.frame_rate,
        "starting repetition tracker"
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0]),
        centered: true,
        ..Default::default()
    };

    let result = eframe::run_native(
        "Repetition Tracker",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(ui::create_visuals());
            Box::new(app::RepTrackerApp::new(cc, config))
        }),
    );

    if let Err(e) = result {
        error!("Error running application: {:?}", e);
    }
}
