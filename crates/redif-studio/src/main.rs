use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use redif_engine::logging::{init_logging, LoggingConfig};
use redif_sim::{SimConfig, Simulator};

/// Usage: `redif [config.toml]`
///
/// Mouse wheel zooms around the pointer, left button draws, right button
/// erases, ArrowUp/ArrowDown change the diffusion rate, W/S/A/D move the light
/// and Escape quits.
fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => {
            let path = Path::new(&path);
            let config = SimConfig::load(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?;
            log::info!("configuration loaded from {}", path.display());
            config
        }
        None => SimConfig::default(),
    };

    Simulator::new(config).run()
}
