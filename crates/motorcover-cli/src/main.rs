mod app;
mod commands;

use anyhow::{Context, Result};
use app::{render_config, App};
use commands::{CommandLine, Commands};
use motorcover_core::{AppConfig, InsuranceRecord};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// How often the watch command re-reads feature toggles.
const TOGGLE_POLL_INTERVAL: Duration = Duration::from_secs(5);

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,motorcover=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CommandLine::parse_args();

    init_tracing();
    info!("Starting MotorCover v{}", env!("CARGO_PKG_VERSION"));

    let config =
        AppConfig::load_validated(cli.config.as_deref()).context("invalid configuration")?;

    match cli.command {
        Commands::CheckConfig => {
            print!("{}", render_config(&config)?);
            Ok(())
        }
        Commands::Insurances { pin } => {
            let app = App::build(&config).await?;
            let records = app.insurances(&pin).await?;
            print_json(&records)?;
            app.close().await;
            Ok(())
        }
        Commands::Vehicles { keys, concurrent } => {
            let app = App::build(&config).await?;
            let vehicles = app.vehicles(keys, concurrent).await;
            print_json(&vehicles)?;
            app.close().await;
            Ok(())
        }
        Commands::Watch { pin, every } => {
            let path = match cli.config {
                Some(path) => path,
                None => AppConfig::config_path()?,
            };
            let app = App::build(&config).await?;
            app.toggles()
                .reload_from_file(&path)
                .with_context(|| format!("cannot watch {}", path.display()))?;
            let _watcher = app.toggles().watch(path, TOGGLE_POLL_INTERVAL);

            app.watch(
                &pin,
                Duration::from_secs(every.max(1)),
                tokio::signal::ctrl_c(),
                print_json::<[InsuranceRecord]>,
            )
            .await?;

            app.close().await;
            Ok(())
        }
    }
}
