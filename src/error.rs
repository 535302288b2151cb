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

//! Error types for the MAP client library layers.

use thiserror::Error;

use crate::obex::ResponseCode;

/// Errors raised while encoding or decoding Application Parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Tag id is not part of the known registry.
    #[error("unknown application parameter tag 0x{0:02X}")]
    UnknownTag(u8),

    /// An entry declares more payload bytes than remain.
    #[error("truncated entry for tag 0x{tag:02X}: declared {declared} bytes, {available} available")]
    TruncatedEntry {
        tag: u8,
        declared: usize,
        available: usize,
    },

    /// Input ended inside an entry header.
    #[error("truncated container: {remaining} trailing byte(s) at offset {offset}")]
    TruncatedContainer { offset: usize, remaining: usize },

    /// Value does not fit the width declared for its tag.
    #[error("value out of range for {name}: {detail}")]
    ValueOutOfRange { name: &'static str, detail: String },

    /// Same tag id seen twice in one container.
    #[error("duplicate application parameter {name} (0x{tag:02X})")]
    DuplicateTag { tag: u8, name: &'static str },

    /// Fixed-width entry whose declared length disagrees with the registry.
    #[error("length mismatch for {name}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Integer given for a variable-width tag, or bytes for a fixed-width one.
    #[error("value type does not match the width class of {name}")]
    TypeMismatch { name: &'static str },
}

/// Errors raised by the OBEX layer.
#[derive(Debug, Error)]
pub enum ObexError {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with a non-success response code.
    #[error("request failed: {0}")]
    Failure(ResponseCode),

    /// Malformed packet or header.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Operation attempted without an established session.
    #[error("not connected")]
    NotConnected,

    /// Application Parameters could not be encoded or decoded.
    #[error("application parameters: {0}")]
    Params(#[from] CodecError),
}

impl ObexError {
    /// Response code of a server-reported failure, if this is one.
    pub fn response_code(&self) -> Option<ResponseCode> {
        match self {
            ObexError::Failure(code) => Some(*code),
            _ => None,
        }
    }
}

/// Errors raised by folder navigation.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// Folder name is empty, `.`/`..`, or contains a path separator.
    #[error("invalid folder name {0:?}")]
    InvalidName(String),

    /// No folder name and no direction given.
    #[error("either a folder name or a direction (parent/root) is required")]
    InvalidAction,

    /// A path-change call failed; the path reflects all calls that succeeded.
    #[error("path change failed at {path}: {source}")]
    Transport {
        path: String,
        #[source]
        source: ObexError,
    },
}

/// Errors raised by MAP requests.
#[derive(Debug, Error)]
pub enum MapError {
    #[error(transparent)]
    Obex(#[from] ObexError),

    #[error(transparent)]
    Params(#[from] CodecError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

/// Result type alias for OBEX operations.
pub type Result<T> = std::result::Result<T, ObexError>;
