use anyhow::{Context, Result};
use camdict_common::observability::init_logging;
use camdict_config::{CamdictConfig, CamdictConfigLoader};
use camdict_runtime::CamdictRuntime;
use clap::Parser;
use std::time::Duration;

mod cli;
mod commands;
mod server;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // 1) Load config (env wins)
    let cfg: CamdictConfig = CamdictConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let mut log = cfg.logging.to_log_config("camdict");
    log.emit_stderr |= cli.command.is_server();
    let log_path = init_logging(log)?;
    tracing::debug!(path = %log_path.display(), config = %cli.config.display(), "app.started");

    let runtime = CamdictRuntime::build("camdict", None)?;
    let handle = runtime.handle();
    let _ctrl_c = handle.cancel_on_ctrl_c();

    let result = runtime.block_on(commands::run(cli.command, cfg, handle));
    runtime.shutdown(Duration::from_secs(1));
    result
}
