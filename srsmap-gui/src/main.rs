mod app;

use eframe::egui;

use crate::app::SrsMappingApp;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("SRS Mapping")
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SRS Mapping",
        options,
        Box::new(|cc| Ok(Box::new(SrsMappingApp::new(cc)))),
    )
}
