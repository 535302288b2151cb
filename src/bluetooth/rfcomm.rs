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

//! RFCOMM connection to a Message Server Equipment.

use anyhow::{anyhow, Context, Result};
use bluer::rfcomm::{Profile, Role, SocketAddr, Stream};
use bluer::{Adapter, Address, Session};
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use super::constants::{timeouts, MAS_SERVICE_UUID};
use crate::config::BluetoothConfig;

/// Opens a byte stream to a Message Access Server.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Stream: AsyncRead + AsyncWrite + Unpin;

    async fn connect(&mut self, address: &str, channel: Option<u8>) -> Result<Self::Stream>;
}

/// BlueZ adapter used to reach the server.
pub struct MasConnector {
    session: Session,
    adapter: Adapter,
}

impl MasConnector {
    /// Open a BlueZ session on the configured (or default) adapter.
    pub async fn new(config: &BluetoothConfig) -> Result<Self> {
        info!("Initializing Bluetooth...");

        let session = Session::new().await?;
        let adapter = match config.adapter.as_deref() {
            Some(name) => session.adapter(name)?,
            None => session.default_adapter().await?,
        };
        info!("Using Bluetooth adapter: {}", adapter.name());

        if !adapter.is_powered().await? {
            info!("Powering on Bluetooth adapter...");
            adapter.set_powered(true).await?;
        }

        Ok(Self { session, adapter })
    }

    /// Connect to the MAS of `address`.
    ///
    /// With a known RFCOMM `channel` the socket is opened directly. Otherwise
    /// a client profile for the MAS service class is registered and BlueZ
    /// resolves the channel through SDP.
    pub async fn connect(&self, address: &str, channel: Option<u8>) -> Result<Stream> {
        let address: Address = address
            .parse()
            .with_context(|| format!("invalid Bluetooth address: {}", address))?;

        match channel {
            Some(channel) => {
                info!("Connecting to {} on RFCOMM channel {}", address, channel);
                let stream = Stream::connect(SocketAddr::new(address, channel)).await?;
                info!("RFCOMM connection established");
                Ok(stream)
            }
            None => self.connect_profile(address).await,
        }
    }

    async fn connect_profile(&self, address: Address) -> Result<Stream> {
        info!("Connecting to {} via MAS profile ({})", address, MAS_SERVICE_UUID);

        let profile = Profile {
            uuid: MAS_SERVICE_UUID,
            role: Some(Role::Client),
            require_authentication: Some(false),
            require_authorization: Some(false),
            auto_connect: Some(false),
            ..Default::default()
        };
        let mut handle = self.session.register_profile(profile).await?;
        let device = self.adapter.device(address)?;

        let request = tokio::time::timeout(timeouts::PROFILE_CONNECT, async {
            tokio::select! {
                res = device.connect_profile(&MAS_SERVICE_UUID) => match res {
                    Ok(()) => handle.next().await.ok_or_else(|| anyhow!("profile handle closed")),
                    Err(err) => Err(err.into()),
                },
                req = handle.next() => req.ok_or_else(|| anyhow!("profile handle closed")),
            }
        })
        .await
        .map_err(|_| anyhow!("timed out waiting for MAS connection from {}", address))??;

        if request.device() != address {
            warn!(
                "Profile connection from unexpected device {}",
                request.device()
            );
        }

        let stream = request.accept()?;
        info!("RFCOMM connection established");
        Ok(stream)
    }
}

impl Connector for MasConnector {
    type Stream = Stream;

    async fn connect(&mut self, address: &str, channel: Option<u8>) -> Result<Stream> {
        MasConnector::connect(self, address, channel).await
    }
}
