// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! MAP client command-line shell.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use map_client::bluetooth::MasConnector;
use map_client::config::Config;
use map_client::shell::Shell;
use map_client::storage::History;

#[derive(Debug, Parser)]
#[command(name = "map-client", about = "Bluetooth Message Access Profile client", version)]
struct Cli {
    /// Bluetooth address of the phone to connect to on startup
    #[arg(short, long)]
    address: Option<String>,

    /// RFCOMM channel of the Message Access Server (SDP lookup when omitted)
    #[arg(short, long)]
    channel: Option<u8>,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("map_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    info!("Starting MAP client v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_overrides(cli.address, cli.channel);
    info!("Configuration loaded");

    // Initialize storage
    let history = if config.history.enabled {
        match History::open(&config.history_path(), config.history.max_entries) {
            Ok(history) => Some(history),
            Err(e) => {
                warn!("Command history unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let connector = MasConnector::new(&config.bluetooth).await?;
    let startup_address = config.bluetooth.address.clone();
    let mut shell = Shell::new(config, connector, history);

    if let Some(address) = startup_address {
        if let Err(e) = shell.connect(&address, None).await {
            error!("Failed to connect to {}: {:#}", address, e);
        }
    }

    shell.run(BufReader::new(tokio::io::stdin())).await?;

    info!("MAP client stopped");
    Ok(())
}
