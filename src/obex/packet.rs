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

//! OBEX packet framing.
//!
//! ```text
//! ┌──────────────┬──────────┬─────────────────┬─────────┐
//! │ Opcode/Code  │ Length   │ Prefix          │ Headers │
//! │ 1 byte       │ u16 BE   │ opcode-specific │         │
//! └──────────────┴──────────┴─────────────────┴─────────┘
//! ```
//! `Length` covers the whole packet.

use std::fmt;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::header::{decode_headers, Header};
use crate::error::{ObexError, Result};

/// Opcode + length.
pub const PACKET_HEADER_SIZE: usize = 3;

/// Smallest max packet length a peer may announce.
pub const MIN_PACKET_LENGTH: u16 = 255;

/// OBEX protocol version sent in CONNECT.
pub const OBEX_VERSION: u8 = 0x10;

/// Request opcodes.
pub mod opcode {
    pub const CONNECT: u8 = 0x80;
    pub const DISCONNECT: u8 = 0x81;
    pub const PUT: u8 = 0x02;
    pub const GET: u8 = 0x03;
    pub const SETPATH: u8 = 0x85;
    pub const ABORT: u8 = 0xFF;

    /// Final bit of PUT/GET.
    pub const FINAL: u8 = 0x80;
}

/// SETPATH flags.
pub mod setpath {
    /// Back up one level before applying the name.
    pub const BACKUP: u8 = 0x01;
    /// Do not create the folder if it does not exist.
    pub const DONT_CREATE: u8 = 0x02;
}

/// Response code, final bit stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Continue,
    Success,
    Created,
    Accepted,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    RequestTimeout,
    Conflict,
    PreconditionFailed,
    UnsupportedMediaType,
    InternalServerError,
    NotImplemented,
    ServiceUnavailable,
    Other(u8),
}

impl ResponseCode {
    /// Parse a response byte; the final bit is ignored.
    pub fn from_u8(value: u8) -> Self {
        match value & 0x7F {
            0x10 => Self::Continue,
            0x20 => Self::Success,
            0x21 => Self::Created,
            0x22 => Self::Accepted,
            0x40 => Self::BadRequest,
            0x41 => Self::Unauthorized,
            0x43 => Self::Forbidden,
            0x44 => Self::NotFound,
            0x45 => Self::MethodNotAllowed,
            0x46 => Self::NotAcceptable,
            0x48 => Self::RequestTimeout,
            0x49 => Self::Conflict,
            0x4C => Self::PreconditionFailed,
            0x4F => Self::UnsupportedMediaType,
            0x50 => Self::InternalServerError,
            0x51 => Self::NotImplemented,
            0x53 => Self::ServiceUnavailable,
            other => Self::Other(other),
        }
    }

    /// Code byte without the final bit.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Continue => 0x10,
            Self::Success => 0x20,
            Self::Created => 0x21,
            Self::Accepted => 0x22,
            Self::BadRequest => 0x40,
            Self::Unauthorized => 0x41,
            Self::Forbidden => 0x43,
            Self::NotFound => 0x44,
            Self::MethodNotAllowed => 0x45,
            Self::NotAcceptable => 0x46,
            Self::RequestTimeout => 0x48,
            Self::Conflict => 0x49,
            Self::PreconditionFailed => 0x4C,
            Self::UnsupportedMediaType => 0x4F,
            Self::InternalServerError => 0x50,
            Self::NotImplemented => 0x51,
            Self::ServiceUnavailable => 0x53,
            Self::Other(v) => v & 0x7F,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(
            self,
            Self::Continue | Self::Success | Self::Created | Self::Accepted
        )
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(v) => write!(f, "response 0x{:02X}", v),
            known => write!(f, "{:?} (0x{:02X})", known, known.as_u8()),
        }
    }
}

/// Outgoing request packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub opcode: u8,
    pub prefix: Vec<u8>,
    pub headers: Vec<Header>,
}

impl Request {
    pub fn connect(max_packet_length: u16, headers: Vec<Header>) -> Self {
        let mut prefix = vec![OBEX_VERSION, 0x00];
        prefix.extend_from_slice(&max_packet_length.to_be_bytes());
        Self {
            opcode: opcode::CONNECT,
            prefix,
            headers,
        }
    }

    pub fn disconnect(headers: Vec<Header>) -> Self {
        Self {
            opcode: opcode::DISCONNECT,
            prefix: Vec::new(),
            headers,
        }
    }

    /// Final GET. This client never splits GET request headers.
    pub fn get(headers: Vec<Header>) -> Self {
        Self {
            opcode: opcode::GET | opcode::FINAL,
            prefix: Vec::new(),
            headers,
        }
    }

    pub fn put(is_final: bool, headers: Vec<Header>) -> Self {
        let code = if is_final {
            opcode::PUT | opcode::FINAL
        } else {
            opcode::PUT
        };
        Self {
            opcode: code,
            prefix: Vec::new(),
            headers,
        }
    }

    pub fn set_path(flags: u8, headers: Vec<Header>) -> Self {
        Self {
            opcode: opcode::SETPATH,
            prefix: vec![flags, 0x00],
            headers,
        }
    }

    /// Size of the encoded packet.
    pub fn encoded_len(&self) -> usize {
        PACKET_HEADER_SIZE
            + self.prefix.len()
            + self.headers.iter().map(Header::encoded_len).sum::<usize>()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_packet(self.opcode, &self.prefix, &self.headers)
    }

    /// Parse a request packet. Used by servers and tests.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (code, body) = split_packet(bytes)?;
        let prefix_len = match code {
            opcode::CONNECT => 4,
            opcode::SETPATH => 2,
            _ => 0,
        };
        if body.len() < prefix_len {
            return Err(ObexError::Protocol(format!(
                "request 0x{:02X} too short for its {} byte prefix",
                code, prefix_len
            )));
        }
        Ok(Self {
            opcode: code,
            prefix: body[..prefix_len].to_vec(),
            headers: decode_headers(&body[prefix_len..])?,
        })
    }

    /// Strip the final bit from PUT/GET opcodes.
    pub fn base_opcode(&self) -> u8 {
        match self.opcode & !opcode::FINAL {
            op @ (opcode::PUT | opcode::GET) => op,
            _ => self.opcode,
        }
    }

    pub fn is_final(&self) -> bool {
        self.opcode & opcode::FINAL != 0
    }
}

/// Incoming response packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: ResponseCode,
    pub prefix: Vec<u8>,
    pub headers: Vec<Header>,
}

impl Response {
    pub fn new(code: ResponseCode, headers: Vec<Header>) -> Self {
        Self {
            code,
            prefix: Vec::new(),
            headers,
        }
    }

    /// CONNECT response carrying version, flags and max packet length.
    pub fn connect(code: ResponseCode, max_packet_length: u16, headers: Vec<Header>) -> Self {
        let mut prefix = vec![OBEX_VERSION, 0x00];
        prefix.extend_from_slice(&max_packet_length.to_be_bytes());
        Self {
            code,
            prefix,
            headers,
        }
    }

    /// Max packet length announced in a CONNECT response.
    pub fn max_packet_length(&self) -> Option<u16> {
        match self.prefix.as_slice() {
            [_, _, hi, lo] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }

    /// Encode with the final bit set. Used by servers and tests.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_packet(self.code.as_u8() | 0x80, &self.prefix, &self.headers)
    }

    /// Parse a response whose opcode-specific prefix is `prefix_len` bytes.
    pub fn decode(bytes: &[u8], prefix_len: usize) -> Result<Self> {
        let (code, body) = split_packet(bytes)?;
        let code = ResponseCode::from_u8(code);
        // Failure responses may omit the prefix entirely.
        let prefix_len = if body.len() < prefix_len && !code.is_success() {
            0
        } else {
            prefix_len
        };
        if body.len() < prefix_len {
            return Err(ObexError::Protocol(format!(
                "response too short for its {} byte prefix",
                prefix_len
            )));
        }
        Ok(Self {
            code,
            prefix: body[..prefix_len].to_vec(),
            headers: decode_headers(&body[prefix_len..])?,
        })
    }

    /// Concatenated Body and EndOfBody payloads.
    pub fn body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for header in &self.headers {
            if let Header::Body(data) | Header::EndOfBody(data) = header {
                body.extend_from_slice(data);
            }
        }
        body
    }

    pub fn connection_id(&self) -> Option<u32> {
        self.headers.iter().find_map(|h| match h {
            Header::ConnectionId(id) => Some(*id),
            _ => None,
        })
    }
}

fn encode_packet(code: u8, prefix: &[u8], headers: &[Header]) -> Result<Vec<u8>> {
    let headers_len: usize = headers.iter().map(Header::encoded_len).sum();
    let total = PACKET_HEADER_SIZE + prefix.len() + headers_len;
    let length = u16::try_from(total)
        .map_err(|_| ObexError::Protocol(format!("packet of {} bytes is too long", total)))?;

    let mut out = Vec::with_capacity(total);
    out.push(code);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(prefix);
    for header in headers {
        header.encode_into(&mut out)?;
    }
    Ok(out)
}

fn split_packet(bytes: &[u8]) -> Result<(u8, &[u8])> {
    if bytes.len() < PACKET_HEADER_SIZE {
        return Err(ObexError::Protocol(format!(
            "packet too short: {} bytes",
            bytes.len()
        )));
    }
    let length = u16::from_be_bytes([bytes[1], bytes[2]]) as usize;
    if length != bytes.len() {
        return Err(ObexError::Protocol(format!(
            "packet length mismatch: declared {}, got {}",
            length,
            bytes.len()
        )));
    }
    Ok((bytes[0], &bytes[PACKET_HEADER_SIZE..]))
}

/// Read exactly one packet from `reader`.
pub async fn read_packet<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let mut head = [0u8; PACKET_HEADER_SIZE];
    reader.read_exact(&mut head).await?;

    let length = u16::from_be_bytes([head[1], head[2]]) as usize;
    if length < PACKET_HEADER_SIZE {
        return Err(ObexError::Protocol(format!(
            "invalid packet length {}",
            length
        )));
    }

    let mut packet = vec![0u8; length];
    packet[..PACKET_HEADER_SIZE].copy_from_slice(&head);
    reader.read_exact(&mut packet[PACKET_HEADER_SIZE..]).await?;
    Ok(packet)
}
