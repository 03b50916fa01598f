pub mod types;
pub mod config;
pub mod data;
pub mod classify;
pub mod interaction;
pub mod viewport;
pub mod pick;
pub mod compose;
pub mod export;
pub mod session;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the data, apply the given commands and print the resulting frame
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Session command to apply before rendering (repeatable), e.g. "toggle" or "click 640 400"
        #[arg(short, long = "event", value_name = "COMMAND")]
        events: Vec<String>,
    },
    /// Interactive session: commands on stdin, one JSON frame per line on stdout
    Session {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Write the classified points as a GeoJSON FeatureCollection
    Export {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long, value_name = "FILE", default_value = "points.geojson")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries frames, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Map credential may come from a local .env file
    if let Ok(path) = dotenvy::dotenv() {
        info!(path = ?path, "loaded environment file");
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { config, events } => {
            info!(config = ?config, "rendering frame");
            let app_config = config::AppConfig::load_from_file(&config)?;

            let records = data::load_records_or_empty(app_config.data.clone()).await;
            let mut ui = session::Session::new(app_config);
            ui.load(records);

            for event in &events {
                let command: session::Command = event
                    .parse()
                    .map_err(|e| anyhow::anyhow!("Invalid event {:?}: {}", event, e))?;
                ui.apply(command)
                    .map_err(|e| anyhow::anyhow!("Failed to apply {:?}: {}", event, e))?;
            }

            println!("{}", serde_json::to_string_pretty(&ui.frame())?);
        }
        Commands::Session { config } => {
            info!(config = ?config, "starting session");
            let app_config = config::AppConfig::load_from_file(&config)?;

            let input = tokio::io::BufReader::new(tokio::io::stdin());
            session::run(app_config, input, std::io::stdout()).await?;
        }
        Commands::Export { config, output } => {
            info!(config = ?config, "exporting points");
            let app_config = config::AppConfig::load_from_file(&config)?;

            let records = data::load_records_or_empty(app_config.data.clone()).await;
            export::write_geojson(&records, &app_config, &output)?;
        }
    }

    Ok(())
}
