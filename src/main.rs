mod engine;
mod model;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::engine::api_client::HttpGameApi;
use crate::model::catalog::Catalog;
use crate::model::game_save::SaveSlot;

#[derive(Parser, Debug)]
#[command(author, version, about = "Desktop client for Chronica Martis", long_about = None)]
struct Cli {
    /// Base URL of the game server.
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server: String,
    /// Directory for the local save instead of the platform data dir.
    #[arg(long)]
    save_dir: Option<PathBuf>,
    /// Prefills the game name on the setup form.
    #[arg(long)]
    player_name: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    let cli = Cli::parse();
    info!(server = %cli.server, "starting client");

    let catalog = Arc::new(Catalog::bundled().context("bundled game tables are corrupt")?);
    let save = match cli.save_dir {
        Some(dir) => SaveSlot::in_dir(dir),
        None => SaveSlot::default_location(),
    };

    let session = save.load_session();
    if session.is_some() {
        info!("restoring the saved server session");
    }
    let api = HttpGameApi::new(&cli.server, session.as_deref())?;
    let (cmd_tx, resp_rx, _worker) = engine::engine::spawn(api);
    let settings = ui::settings_io::load_settings();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Chronica Martis")
            .with_inner_size([1440.0, 900.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Chronica Martis",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(ui::app::ChronicaApp::new(
                cmd_tx,
                resp_rx,
                save,
                settings,
                catalog,
                cli.player_name,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("ui loop failed: {e}"))?;

    Ok(())
}
