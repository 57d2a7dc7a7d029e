use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cfg = rate_governor::config::Config::parse();
    init_logging(&cfg)?;
    rate_governor::app::run(cfg)
}

// The demo owns the terminal, so logs only go somewhere when a file is given
// (or when just dumping settings).
fn init_logging(cfg: &rate_governor::config::Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Some(path) = cfg.log_file.as_deref() {
        let file = File::create(path)
            .with_context(|| format!("create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if cfg.dump_settings {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
