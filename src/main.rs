mod app;
mod bubble;
mod config;
mod ledger;
mod util;

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;
use eframe::egui::vec2;

use bubble::{AmountUnit, PaletteKind};
use config::{Config, Overrides};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Transaction export to open on start (.csv or .json).
    file: Option<PathBuf>,
    /// JSON file with layout, palette and simulation settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Minimum gap between bubbles, in pixels.
    #[arg(long)]
    padding: Option<f32>,
    /// Smallest radius any bubble is drawn with.
    #[arg(long)]
    min_radius: Option<f32>,
    #[arg(long, value_enum)]
    amount_unit: Option<AmountUnit>,
    #[arg(long, value_enum)]
    palette: Option<PaletteKind>,
    #[arg(long, default_value_t = 1440.0)]
    width: f32,
    #[arg(long, default_value_t = 920.0)]
    height: f32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?.apply(Overrides {
        padding: args.padding,
        min_radius: args.min_radius,
        amount_unit: args.amount_unit,
        palette: args.palette,
    });
    config.validate().context("invalid configuration")?;
    let palette = config.palette()?;
    log::info!(
        "padding {} min radius {} unit {} palette {}",
        config.padding,
        config.min_radius,
        config.amount_unit.label(),
        config.palette.kind.label()
    );

    let window_size = vec2(args.width.max(320.0), args.height.max(240.0));
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size(window_size)
            .with_drag_and_drop(true),
        ..Default::default()
    };

    let initial_file = args.file;
    eframe::run_native(
        "bubble-map",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::BubbleMapApp::new(
                cc,
                config,
                palette,
                initial_file,
                window_size,
            )))
        }),
    )
    .map_err(|error| anyhow!("failed to run the window: {error}"))
}
