// src/main.rs

use clap::Parser;
use gridstore::cli::{self, Cli};
use gridstore::settings::io::load_app_settings;
use gridstore::settings::AppSettings;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_logging(settings: &AppSettings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_app_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load settings, using defaults: {}", e);
            AppSettings::default()
        }
    };
    init_logging(&settings);

    match cli::run(cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
