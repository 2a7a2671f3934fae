use crate::config::{Config, get_config_path, load_config};
use crate::gateway;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "smsbridge")]
#[command(about = "Relay Twilio SMS/MMS webhooks into a Mattermost channel")]
#[command(version)]
pub struct Cli {
    /// Path to config.json (default: ~/.smsbridge/config.json)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    Serve {
        /// Override server.host
        #[arg(long)]
        host: Option<String>,
        /// Override server.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Validate the configuration and print it with secrets redacted
    Check,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            apply_server_overrides(&mut config, host, port);
            config.validate()?;
            gateway::serve(&config).await?;
        }
        Commands::Check => {
            let path = match cli.config {
                Some(path) => path,
                None => get_config_path()?,
            };
            println!("Configuration OK ({})", path.display());
            println!("{:#?}", config);
        }
    }

    Ok(())
}

fn apply_server_overrides(config: &mut Config, host: Option<String>, port: Option<u16>) {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
}
