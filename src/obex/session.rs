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

//! OBEX client session over an async byte stream.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::header::{Header, PREFIX_SIZE};
use super::packet::{
    opcode, read_packet, setpath, Request, Response, ResponseCode, MIN_PACKET_LENGTH,
    PACKET_HEADER_SIZE,
};
use super::transport::{GetResponse, ObexTransport};
use crate::error::{ObexError, Result};

/// Largest packet this client accepts.
pub const DEFAULT_MAX_PACKET_LENGTH: u16 = 0xFFFF;

/// Parameters negotiated by CONNECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectInfo {
    pub connection_id: Option<u32>,
    pub max_packet_length: u16,
    pub who: Option<Vec<u8>>,
}

/// An OBEX client session.
///
/// Requests are strictly sequential: each call writes one request and waits
/// for its response before returning.
pub struct ObexSession<S> {
    stream: S,
    local_max_packet: u16,
    peer_max_packet: u16,
    connection_id: Option<u32>,
    connected: bool,
}

impl<S> ObexSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a connected stream. Call [`connect`](Self::connect) before any
    /// other request.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            local_max_packet: DEFAULT_MAX_PACKET_LENGTH,
            peer_max_packet: MIN_PACKET_LENGTH,
            connection_id: None,
            connected: false,
        }
    }

    /// Set the max packet length announced in CONNECT.
    pub fn with_max_packet_length(mut self, max: u16) -> Self {
        self.local_max_packet = max.max(MIN_PACKET_LENGTH);
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn connection_id(&self) -> Option<u32> {
        self.connection_id
    }

    /// Packet size used for outgoing requests.
    pub fn max_packet_length(&self) -> u16 {
        self.peer_max_packet
    }

    /// Give back the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Send CONNECT with a Target header.
    pub async fn connect(&mut self, target: &[u8]) -> Result<ConnectInfo> {
        info!("OBEX connect (target {})", hex::encode(target));

        let request = Request::connect(self.local_max_packet, vec![Header::Target(target.to_vec())]);
        let response = self.exchange(&request, 4).await?;

        let peer_max = response.max_packet_length().ok_or_else(|| {
            ObexError::Protocol("CONNECT response without max packet length".to_string())
        })?;
        if peer_max < MIN_PACKET_LENGTH {
            warn!(
                "Peer announced max packet length {}, using {}",
                peer_max, MIN_PACKET_LENGTH
            );
        }
        self.peer_max_packet = peer_max.max(MIN_PACKET_LENGTH).min(self.local_max_packet);
        self.connection_id = response.connection_id();
        self.connected = true;

        let who = response.headers.iter().find_map(|h| match h {
            Header::Who(who) => Some(who.clone()),
            _ => None,
        });

        info!(
            "OBEX connected: connection id {:?}, max packet length {}",
            self.connection_id, self.peer_max_packet
        );
        Ok(ConnectInfo {
            connection_id: self.connection_id,
            max_packet_length: self.peer_max_packet,
            who,
        })
    }

    /// Send DISCONNECT and mark the session closed.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let request = Request::disconnect(self.session_headers());
        let result = self.exchange(&request, 0).await;
        self.connected = false;
        self.connection_id = None;
        result.map(|_| info!("OBEX disconnected"))
    }

    /// GET an object, following Continue responses until the final one.
    pub async fn get(&mut self, name: Option<&str>, headers: Vec<Header>) -> Result<GetResponse> {
        self.ensure_connected()?;

        let mut first = self.session_headers();
        if let Some(name) = name {
            first.push(Header::Name(name.to_string()));
        }
        first.extend(headers);

        let mut request = Request::get(first);
        let mut result = GetResponse::default();
        let mut rounds = 0usize;

        loop {
            let response = self.exchange(&request, 0).await?;
            rounds += 1;
            for header in response.headers {
                match header {
                    Header::Body(data) | Header::EndOfBody(data) => {
                        result.body.extend_from_slice(&data)
                    }
                    other => result.headers.push(other),
                }
            }
            if response.code != ResponseCode::Continue {
                break;
            }
            request = Request::get(self.session_headers());
        }

        debug!(
            "GET {:?} complete: {} bytes in {} round(s)",
            name,
            result.body.len(),
            rounds
        );
        Ok(result)
    }

    /// PUT `body` as `name`, splitting it over as many packets as needed.
    pub async fn put(&mut self, name: &str, body: &[u8], headers: Vec<Header>) -> Result<Response> {
        self.ensure_connected()?;

        let mut first = self.session_headers();
        first.push(Header::Name(name.to_string()));
        first.extend(headers);

        let mut pending = first;
        let mut remaining = body;

        loop {
            let request_headers_len: usize = pending.iter().map(Header::encoded_len).sum();
            let capacity = (self.peer_max_packet as usize)
                .checked_sub(PACKET_HEADER_SIZE + request_headers_len + PREFIX_SIZE)
                .ok_or_else(|| {
                    ObexError::Protocol(format!(
                        "PUT headers ({} bytes) exceed max packet length {}",
                        request_headers_len, self.peer_max_packet
                    ))
                })?;

            let is_final = remaining.len() <= capacity;
            let (chunk, rest) = remaining.split_at(remaining.len().min(capacity));
            remaining = rest;

            let mut packet_headers = std::mem::take(&mut pending);
            packet_headers.push(if is_final {
                Header::EndOfBody(chunk.to_vec())
            } else {
                Header::Body(chunk.to_vec())
            });

            let response = self
                .exchange(&Request::put(is_final, packet_headers), 0)
                .await?;

            if is_final {
                debug!("PUT {} complete: {} bytes", name, body.len());
                return Ok(response);
            }
            if response.code != ResponseCode::Continue {
                return Err(ObexError::Protocol(format!(
                    "PUT {}: expected Continue, got {}",
                    name, response.code
                )));
            }
            pending = self.session_headers();
        }
    }

    /// SETPATH into `name`, to the parent, or to the root.
    pub async fn set_path(&mut self, name: Option<&str>, to_parent: bool) -> Result<Response> {
        self.ensure_connected()?;

        let mut flags = setpath::DONT_CREATE;
        if to_parent {
            flags |= setpath::BACKUP;
        }

        let mut headers = self.session_headers();
        match name {
            Some(name) => headers.push(Header::Name(name.to_string())),
            // An empty Name without BACKUP resets to the root folder.
            None if !to_parent => headers.push(Header::Name(String::new())),
            None => {}
        }

        debug!("SETPATH name={:?} to_parent={}", name, to_parent);
        self.exchange(&Request::set_path(flags, headers), 0).await
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(ObexError::NotConnected)
        }
    }

    fn session_headers(&self) -> Vec<Header> {
        self.connection_id
            .map(Header::ConnectionId)
            .into_iter()
            .collect()
    }

    /// Write one request and read its response. Failure codes become errors.
    async fn exchange(&mut self, request: &Request, prefix_len: usize) -> Result<Response> {
        let len = request.encoded_len();
        let limit = if request.opcode == opcode::CONNECT {
            MIN_PACKET_LENGTH
        } else {
            self.peer_max_packet
        };
        if len > limit as usize {
            return Err(ObexError::Protocol(format!(
                "request of {} bytes exceeds max packet length {}",
                len, limit
            )));
        }

        let bytes = request.encode()?;
        debug!("-> opcode 0x{:02X}, {} bytes", request.opcode, bytes.len());
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;

        let packet = read_packet(&mut self.stream).await?;
        let response = Response::decode(&packet, prefix_len)?;
        debug!("<- {}, {} bytes", response.code, packet.len());

        if response.code.is_success() {
            Ok(response)
        } else {
            warn!(
                "Request 0x{:02X} failed with {}",
                request.opcode, response.code
            );
            Err(ObexError::Failure(response.code))
        }
    }
}

impl<S> ObexTransport for ObexSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn get(&mut self, name: Option<&str>, headers: Vec<Header>) -> Result<GetResponse> {
        ObexSession::get(self, name, headers).await
    }

    async fn put(&mut self, name: &str, body: &[u8], headers: Vec<Header>) -> Result<Response> {
        ObexSession::put(self, name, body, headers).await
    }

    async fn set_path(&mut self, name: Option<&str>, to_parent: bool) -> Result<Response> {
        ObexSession::set_path(self, name, to_parent).await
    }
}
