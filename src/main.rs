mod app;
mod config;
mod memory;
mod util;

use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use eframe::egui::vec2;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph snapshot JSON (`{"nodes": [...], "edges": [...]}`). Shows a sample graph if omitted.
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Layout tuning JSON with optional `simulation` and `view` sections.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Canvas width; the layout is centered on half of it.
    #[arg(long, default_value_t = 800.0)]
    width: f32,

    /// Canvas height; the layout is centered on half of it.
    #[arg(long, default_value_t = 600.0)]
    height: f32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => config::load_layout_config(path)?,
        None => config::LayoutConfig::default(),
    };
    let canvas_size = vec2(args.width.max(1.0), args.height.max(1.0));

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "memgraph explorer",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::MemoryGraphApp::new(
                cc,
                args.graph.clone(),
                config,
                canvas_size,
            )))
        }),
    )
    .map_err(|error| anyhow!("failed to start the viewer: {error}"))
}
