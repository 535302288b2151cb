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

//! Single Application Parameter entry encoding.
//!
//! Entry layout:
//! ```text
//! ┌────────┬────────┬──────────────────────┐
//! │ Tag ID │ Length │ Value                │
//! │ 1 byte │ 1 byte │ `Length` bytes       │
//! └────────┴────────┴──────────────────────┘
//! ```
//!
//! Fixed-width values are unsigned big-endian integers.

use crate::error::CodecError;

use super::tags::{lookup, Tag, WidthClass};

/// Size of the tag id + length prefix.
pub const ENTRY_HEADER_SIZE: usize = 2;

/// Longest variable-width value (length field is one byte).
pub const MAX_VARIABLE_LENGTH: usize = u8::MAX as usize;

/// Decoded value of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Value of a one/two/four/eight byte parameter.
    Uint(u64),
    /// Raw value of a variable-width parameter.
    Bytes(Vec<u8>),
}

impl PropertyValue {
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Self::Uint(v) => Some(*v),
            Self::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Uint(_) => None,
            Self::Bytes(b) => Some(b),
        }
    }
}

impl From<u8> for PropertyValue {
    fn from(v: u8) -> Self {
        Self::Uint(v.into())
    }
}

impl From<u16> for PropertyValue {
    fn from(v: u16) -> Self {
        Self::Uint(v.into())
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        Self::Uint(v.into())
    }
}

impl From<u64> for PropertyValue {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Uint(v.into())
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<&[u8]> for PropertyValue {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Bytes(v.as_bytes().to_vec())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Bytes(v.into_bytes())
    }
}

/// Append the encoded entry for `tag` to `out`.
///
/// On error nothing is written.
pub fn encode_into(tag: Tag, value: &PropertyValue, out: &mut Vec<u8>) -> Result<(), CodecError> {
    let descriptor = tag.descriptor();
    match (descriptor.width, value) {
        (WidthClass::Variable, PropertyValue::Bytes(bytes)) => {
            if bytes.len() > MAX_VARIABLE_LENGTH {
                return Err(CodecError::ValueOutOfRange {
                    name: descriptor.name,
                    detail: format!(
                        "{} bytes exceeds the {} byte limit",
                        bytes.len(),
                        MAX_VARIABLE_LENGTH
                    ),
                });
            }
            out.push(tag.id());
            out.push(bytes.len() as u8);
            out.extend_from_slice(bytes);
            Ok(())
        }
        (width, PropertyValue::Uint(v)) => {
            let (Some(size), Some(max)) = (width.fixed_width(), width.max_value()) else {
                return Err(CodecError::TypeMismatch {
                    name: descriptor.name,
                });
            };
            if *v > max {
                return Err(CodecError::ValueOutOfRange {
                    name: descriptor.name,
                    detail: format!("{} does not fit in {} byte(s)", v, size),
                });
            }
            out.push(tag.id());
            out.push(size as u8);
            out.extend_from_slice(&v.to_be_bytes()[8 - size..]);
            Ok(())
        }
        (_, PropertyValue::Bytes(_)) => Err(CodecError::TypeMismatch {
            name: descriptor.name,
        }),
    }
}

/// Encode a single entry.
pub fn encode(tag: Tag, value: &PropertyValue) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(ENTRY_HEADER_SIZE + 8);
    encode_into(tag, value, &mut out)?;
    Ok(out)
}

/// Decode the entry at the start of `bytes`.
///
/// Returns the tag, its value and the number of bytes consumed. Trailing
/// bytes after the entry are left untouched.
pub fn decode(bytes: &[u8]) -> Result<(Tag, PropertyValue, usize), CodecError> {
    if bytes.len() < ENTRY_HEADER_SIZE {
        return Err(CodecError::TruncatedContainer {
            offset: 0,
            remaining: bytes.len(),
        });
    }

    let tag_id = bytes[0];
    let declared = bytes[1] as usize;
    let descriptor = lookup(tag_id)?;

    let available = bytes.len() - ENTRY_HEADER_SIZE;
    if available < declared {
        return Err(CodecError::TruncatedEntry {
            tag: tag_id,
            declared,
            available,
        });
    }
    let payload = &bytes[ENTRY_HEADER_SIZE..ENTRY_HEADER_SIZE + declared];

    let value = match descriptor.width.fixed_width() {
        Some(expected) => {
            if declared != expected {
                return Err(CodecError::LengthMismatch {
                    name: descriptor.name,
                    expected,
                    actual: declared,
                });
            }
            let mut buf = [0u8; 8];
            buf[8 - expected..].copy_from_slice(payload);
            PropertyValue::Uint(u64::from_be_bytes(buf))
        }
        None => PropertyValue::Bytes(payload.to_vec()),
    };

    Ok((descriptor.tag, value, ENTRY_HEADER_SIZE + declared))
}
