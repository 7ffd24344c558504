mod app;
mod config;
mod logging;
mod model;
mod net;
mod runtime;
mod ui;

use anyhow::{Context, Result};
use std::sync::mpsc;

use app::App;
use config::parse_args;
use logging::init as init_logging;
use net::Fetcher;
use runtime::{init_terminal, restore_terminal, run_app};
use tracing::{debug, info, warn};

fn main() -> Result<()> {
    let config = parse_args()?;
    let _log_guard = init_logging(&config);
    info!("aircraft-panel starting");
    debug!("config path: {}", config.config_path.display());
    debug!("endpoint: {}", config.url);

    let (tx, rx) = mpsc::channel();
    let fetcher = Fetcher::new(config.url.clone(), config.timeout, config.insecure, tx)
        .context("Failed to build HTTP client")?;

    let mut terminal = init_terminal().context("Failed to initialise terminal")?;
    let res = run_app(
        &mut terminal,
        App::new(config.url.clone(), config.auto_refresh),
        &fetcher,
        rx,
    );
    restore_terminal(&mut terminal)?;

    if let Err(err) = &res {
        warn!("runtime error: {err}");
    }
    info!("aircraft-panel exited");
    res
}
