use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use screen_search::cli::commands::{cmd_inspect, cmd_replay};
use screen_search::cli::config::{Cli, Commands, build_service_config, load_config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Resolve settings: CLI > config > defaults
    let config = load_config(cli.config.as_deref());
    let service_config = build_service_config(&config, cli.query.as_deref(), cli.api_level);

    match cli.command {
        Commands::Inspect { tree } => {
            cmd_inspect(&tree, &service_config)?;
        }
        Commands::Replay { session } => {
            let searched = cmd_replay(&session, service_config, cli.verbose).await?;
            if !searched {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
