use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod catalog;
mod cli;
mod config;
mod semantic;
#[cfg(test)]
mod tests;
mod web;

use app::AppContext;
use cli::{ConfigArgs, Command};
use config::Config;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries `recommend` output, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_overrides(config: &mut Config, overrides: ConfigArgs) {
    if let Some(catalog) = overrides.catalog {
        config.catalog_path = catalog;
    }
    if let Some(top_k) = overrides.top_k {
        config.top_k = top_k;
    }
    if let Some(model) = overrides.model {
        config.model = model;
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = cli::Args::parse();

    let mut config = Config::load().context("failed to load configuration")?;
    apply_overrides(&mut config, args.overrides);

    match args.command {
        Command::Serve { port, lazy } => {
            if let Some(port) = port {
                config.port = port;
            }
            if lazy {
                config.warm_cache = false;
            }
            config.validate().context("invalid configuration")?;

            let app = AppContext::bootstrap(config).context("failed to start")?;
            web::start_daemon(app)
        }

        Command::Recommend { query } => {
            config.warm_cache = false;
            config.validate().context("invalid configuration")?;

            let app = AppContext::bootstrap(config).context("failed to start")?;
            let result = app.recommend(&query)?;

            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}
