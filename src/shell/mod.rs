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

//! Interactive MAP shell.
//!
//! Reads command lines, parses them with clap and dispatches them to the
//! MAP client. Errors are reported per command and never end the loop.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

use crate::bluetooth::{Connector, MAS_TARGET_UUID};
use crate::config::Config;
use crate::map::{
    GetMessageOptions, Listing, MapClient, MessagesListingOptions, Navigation, ParameterSet,
    PropertyValue, PushMessageOptions, StatusIndicator,
};
use crate::obex::ObexSession;
use crate::storage::{History, Outcome};

const PROMPT: &str = "map> ";

/// Default number of entries shown by `history`.
const HISTORY_SHOWN: u32 = 20;

/// One parsed shell line.
#[derive(Debug, Parser)]
#[command(name = "map", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ShellCommand {
    /// Connect to a phone's Message Access Server
    Connect {
        address: String,
        #[arg(long)]
        channel: Option<u8>,
    },
    /// Close the OBEX session
    Disconnect,
    /// List sub-folders of the current folder
    Folders {
        #[arg(short = 'c', long = "count")]
        max_list_count: Option<u16>,
        #[arg(short = 'o', long = "offset")]
        list_start_offset: Option<u16>,
    },
    /// List messages in a folder
    Messages {
        /// Child folder; the current folder when omitted
        folder: Option<String>,
        #[arg(short = 'c', long = "count")]
        max_list_count: Option<u16>,
        #[arg(short = 'o', long = "offset")]
        list_start_offset: Option<u16>,
        /// Bit mask of message types to leave out
        #[arg(short = 't', long = "type", default_value_t = 0)]
        message_type: u8,
        /// 0 = all, 1 = unread, 2 = read
        #[arg(short = 'u', long = "read-status", default_value_t = 0,
              value_parser = clap::value_parser!(u8).range(0..=2))]
        read_status: u8,
        #[arg(short = 'n', long = "new", default_value_t = 0)]
        new_message: u8,
    },
    /// Fetch one message by handle
    Message {
        handle: String,
        #[arg(short = 'a', long, default_value_t = 1,
              value_parser = clap::value_parser!(u8).range(0..=1))]
        attachment: u8,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
        charset: u8,
        /// Write the message to a file instead of printing it
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Change folder; accepts paths such as "..", "/" or "/telecom/msg"
    Cd {
        name: Option<String>,
        #[arg(long)]
        to_parent: bool,
        #[arg(long)]
        to_root: bool,
    },
    /// Print the current folder
    Pwd,
    /// Set the read (0) or deleted (1) status of a message
    Status {
        handle: String,
        #[arg(short = 'i', long = "indicator", default_value_t = 0,
              value_parser = clap::value_parser!(u8).range(0..=1))]
        indicator: u8,
        #[arg(short = 'v', long = "value", default_value_t = 1,
              value_parser = clap::value_parser!(u8).range(0..=1))]
        value: u8,
    },
    /// Push a bMessage file into a folder
    Push {
        folder: String,
        file: PathBuf,
        #[arg(long, default_value_t = 0)]
        transparent: u8,
        #[arg(long, default_value_t = 1)]
        retry: u8,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
        charset: u8,
    },
    /// Ask the phone to check for new messages
    UpdateInbox,
    /// Show recent commands
    History { count: Option<u32> },
    /// Disconnect and exit
    #[command(alias = "q", alias = "exit")]
    Quit,
}

impl ShellCommand {
    /// Parse one input line.
    pub fn parse_line(line: &str) -> std::result::Result<Self, clap::Error> {
        ShellLine::try_parse_from(line.split_whitespace()).map(|l| l.command)
    }
}

/// Whether the loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive shell state.
pub struct Shell<C: Connector> {
    config: Config,
    connector: C,
    client: Option<MapClient<ObexSession<C::Stream>>>,
    history: Option<History>,
}

impl<C: Connector> Shell<C> {
    pub fn new(config: Config, connector: C, history: Option<History>) -> Self {
        Self {
            config,
            connector,
            client: None,
            history,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Current folder, if connected.
    pub fn current_folder(&self) -> Option<String> {
        self.client.as_ref().map(MapClient::current_folder)
    }

    /// Read and run lines until EOF, `quit` or Ctrl-C, then disconnect.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<()> {
        let mut lines = input.lines();

        loop {
            print_prompt();

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    info!("Interrupted");
                    break;
                }
            };

            let Some(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            if self.run_line(&line).await == Flow::Quit {
                break;
            }
        }

        self.disconnect().await
    }

    /// Parse and execute one line, reporting any failure.
    pub async fn run_line(&mut self, line: &str) -> Flow {
        let command = match ShellCommand::parse_line(line) {
            Ok(command) => command,
            Err(e) => {
                // clap renders help and usage errors itself
                let _ = e.print();
                return Flow::Continue;
            }
        };

        let result = self.execute(command).await;
        let outcome = if result.is_ok() {
            Outcome::Ok
        } else {
            Outcome::Failed
        };
        self.record(line.trim(), outcome);

        match result {
            Ok(flow) => flow,
            Err(e) => {
                error!("{:#}", e);
                eprintln!("error: {:#}", e);
                Flow::Continue
            }
        }
    }

    /// Execute a parsed command.
    pub async fn execute(&mut self, command: ShellCommand) -> Result<Flow> {
        match command {
            ShellCommand::Connect { address, channel } => {
                self.connect(&address, channel).await?;
            }
            ShellCommand::Disconnect => {
                if self.client.is_none() {
                    warn!("Not connected");
                }
                self.disconnect().await?;
            }
            ShellCommand::Folders {
                max_list_count,
                list_start_offset,
            } => {
                let count = max_list_count.unwrap_or(self.config.listing.max_list_count);
                let offset = list_start_offset.unwrap_or(self.config.listing.list_start_offset);
                let listing = self.client()?.get_folder_listing(count, offset).await?;
                print_listing(&listing);
            }
            ShellCommand::Messages {
                folder,
                max_list_count,
                list_start_offset,
                message_type,
                read_status,
                new_message,
            } => {
                let options = MessagesListingOptions {
                    max_list_count: max_list_count
                        .unwrap_or(self.config.listing.max_list_count),
                    list_start_offset: list_start_offset
                        .unwrap_or(self.config.listing.list_start_offset),
                    filter_message_type: message_type,
                    filter_read_status: read_status,
                    new_message,
                    ..Default::default()
                };
                let listing = self
                    .client()?
                    .get_messages_listing(folder.as_deref().unwrap_or(""), &options)
                    .await?;
                print_listing(&listing);
            }
            ShellCommand::Message {
                handle,
                attachment,
                charset,
                output,
            } => {
                let options = GetMessageOptions {
                    attachment,
                    charset: charset.try_into()?,
                    fraction_request: None,
                };
                let message = self.client()?.get_message(&handle, &options).await?;
                match output {
                    Some(path) => {
                        tokio::fs::write(&path, &message.body)
                            .await
                            .with_context(|| format!("failed to write {}", path.display()))?;
                        println!("Saved {} bytes to {}", message.body.len(), path.display());
                    }
                    None => print_listing(&message),
                }
            }
            ShellCommand::Cd {
                name,
                to_parent,
                to_root,
            } => {
                let name = name.unwrap_or_default();
                let client = self.client()?;
                if client.set_folder(&name, to_parent, to_root).await? == Navigation::AlreadyAtRoot {
                    println!("Already at the root folder");
                }
                println!("{}", client.current_folder());
            }
            ShellCommand::Pwd => {
                println!("{}", self.client()?.current_folder());
            }
            ShellCommand::Status {
                handle,
                indicator,
                value,
            } => {
                let indicator = StatusIndicator::try_from(indicator)?;
                let response = self
                    .client()?
                    .set_message_status(&handle, indicator, value != 0)
                    .await?;
                println!("{}", response.code);
            }
            ShellCommand::Push {
                folder,
                file,
                transparent,
                retry,
                charset,
            } => {
                let bmessage = tokio::fs::read(&file)
                    .await
                    .with_context(|| format!("failed to read {}", file.display()))?;
                let options = PushMessageOptions {
                    transparent,
                    retry,
                    charset: charset.try_into()?,
                };
                let response = self
                    .client()?
                    .push_message(&folder, &bmessage, &options)
                    .await?;
                println!("{}", response.code);
            }
            ShellCommand::UpdateInbox => {
                let response = self.client()?.update_inbox().await?;
                println!("{}", response.code);
            }
            ShellCommand::History { count } => {
                let history = self
                    .history
                    .as_ref()
                    .ok_or_else(|| anyhow!("history is disabled"))?;
                for entry in history.get_recent(count.unwrap_or(HISTORY_SHOWN))?.iter().rev() {
                    println!(
                        "[{}] {:<6} {}",
                        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        entry.outcome,
                        entry.command
                    );
                }
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Open the link and the OBEX session, replacing any existing one.
    pub async fn connect(&mut self, address: &str, channel: Option<u8>) -> Result<()> {
        if self.client.is_some() {
            info!("Closing the current session first");
            self.disconnect().await?;
        }

        let channel = channel.or(self.config.bluetooth.rfcomm_channel);
        let stream = self.connector.connect(address, channel).await?;

        let mut session = ObexSession::new(stream)
            .with_max_packet_length(self.config.obex.max_packet_length);
        let info = session.connect(MAS_TARGET_UUID.as_bytes()).await?;
        println!(
            "Connected to {} (max packet length {})",
            address, info.max_packet_length
        );

        self.client = Some(MapClient::new(session));
        Ok(())
    }

    /// Close the session if one is open.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            let mut session = client.into_transport();
            session.disconnect().await?;
            println!("Disconnected");
        }
        Ok(())
    }

    fn client(&mut self) -> Result<&mut MapClient<ObexSession<C::Stream>>> {
        match self.client.as_mut() {
            Some(client) => Ok(client),
            None => bail!("not connected; use 'connect <address>' first"),
        }
    }

    fn record(&self, line: &str, outcome: Outcome) {
        if let Some(history) = &self.history {
            if let Err(e) = history.add(line, outcome) {
                warn!("Failed to record history: {}", e);
            }
        }
    }
}

fn print_prompt() {
    print!("{}", PROMPT);
    let _ = std::io::stdout().flush();
}

fn print_listing(listing: &Listing) {
    print_params(&listing.params);
    if !listing.body.is_empty() {
        println!("{}", listing.text());
    }
}

fn print_params(params: &ParameterSet) {
    for (tag, value) in params.iter() {
        match value {
            PropertyValue::Uint(n) => println!("{}: {}", tag, n),
            PropertyValue::Bytes(b) => println!("{}: {}", tag, String::from_utf8_lossy(b)),
        }
    }
}
