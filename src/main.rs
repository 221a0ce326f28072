use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use venuemap::config::LoggingConfig;
use venuemap::{Coordinate, HttpVenueSource, VenueMapConfig, web};

/// Nearby courts as map markers and a list panel
#[derive(Debug, Parser)]
#[command(name = "venuemap", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the view once and print the markers and the list panel
    Render {
        /// Position fix to locate at, as `lat,lon`
        #[arg(long)]
        at: Option<Coordinate>,
    },
    /// Serve the rendered preview page
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = VenueMapConfig::load_from_path(cli.config)?;
    init_logging(&config.logging, cli.verbose);

    match cli.command {
        Command::Render { at } => {
            let source = HttpVenueSource::new(&config.endpoint)?;
            tracing::debug!("Using courts endpoint {}", source.url());
            let view = web::build_view(&config, source, at).await;

            if let Some(map) = view.map() {
                println!(
                    "Map centered on {} at zoom {}",
                    map.center().format_coordinates(),
                    map.zoom()
                );
                for (id, marker) in map.markers() {
                    println!(
                        "  marker {} at {}",
                        id.0,
                        marker.position.format_coordinates()
                    );
                }
            }
            println!("{}", view.render_panel());
        }
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            web::run(config).await?;
        }
    }

    Ok(())
}
