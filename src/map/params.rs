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

//! Application Parameters container.
//!
//! A container is an OBEX byte-sequence header holding concatenated
//! parameter entries:
//! ```text
//! ┌────────┬───────────────┬──────────────────────────┐
//! │ Code   │ Total length  │ Entries                  │
//! │ 1 byte │ u16 BE        │ Total length - 3 bytes   │
//! └────────┴───────────────┴──────────────────────────┘
//! ```

use tracing::debug;

use crate::error::CodecError;
use crate::obex::header::{self, Header};

use super::property::{self, PropertyValue, ENTRY_HEADER_SIZE};
use super::tags::Tag;

/// One slot in a parameter set. Slots without a value are never encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub tag: Tag,
    pub value: Option<PropertyValue>,
}

/// Ordered set of Application Parameters, at most one per tag.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    entries: Vec<Parameter>,
}

/// Two sets are equal when their populated entries match in order; unset
/// slots are ignored.
impl PartialEq for ParameterSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for ParameterSet {}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `tag` to `value`, keeping its original position if already present.
    ///
    /// Returns the previous value.
    pub fn insert(&mut self, tag: Tag, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        self.set(tag, Some(value.into()))
    }

    /// Set or clear `tag`. A cleared slot keeps its position but is skipped
    /// when encoding.
    pub fn set(&mut self, tag: Tag, value: Option<PropertyValue>) -> Option<PropertyValue> {
        match self.entries.iter_mut().find(|p| p.tag == tag) {
            Some(slot) => std::mem::replace(&mut slot.value, value),
            None => {
                self.entries.push(Parameter { tag, value });
                None
            }
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, tag: Tag, value: impl Into<PropertyValue>) -> Self {
        self.insert(tag, value);
        self
    }

    /// Builder form of [`set`](Self::set) for optional values.
    pub fn with_optional<V: Into<PropertyValue>>(mut self, tag: Tag, value: Option<V>) -> Self {
        self.set(tag, value.map(Into::into));
        self
    }

    pub fn remove(&mut self, tag: Tag) -> Option<PropertyValue> {
        let index = self.entries.iter().position(|p| p.tag == tag)?;
        self.entries.remove(index).value
    }

    pub fn get(&self, tag: Tag) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|p| p.tag == tag)
            .and_then(|p| p.value.as_ref())
    }

    pub fn get_uint(&self, tag: Tag) -> Option<u64> {
        self.get(tag).and_then(PropertyValue::as_uint)
    }

    pub fn get_bytes(&self, tag: Tag) -> Option<&[u8]> {
        self.get(tag).and_then(PropertyValue::as_bytes)
    }

    /// Populated entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (Tag, &PropertyValue)> {
        self.entries
            .iter()
            .filter_map(|p| p.value.as_ref().map(|v| (p.tag, v)))
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True when nothing would be encoded.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|p| p.value.is_none())
    }

    /// Concatenated entries without the container header.
    pub fn encode_entries(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        for (tag, value) in self.iter() {
            property::encode_into(tag, value, &mut out)?;
        }
        Ok(out)
    }

    /// Application Parameters header for a request, `None` when the set is
    /// empty and the header must be left out.
    pub fn to_header(&self) -> Result<Option<Header>, CodecError> {
        if self.is_empty() {
            return Ok(None);
        }
        let entries = self.encode_entries()?;
        debug!("Application parameters: {}", hex::encode(&entries));
        Ok(Some(Header::AppParameters(entries)))
    }

    /// Decode the first Application Parameters header in `headers`.
    ///
    /// A response without one yields an empty set.
    pub fn from_headers(headers: &[Header]) -> Result<Self, CodecError> {
        headers
            .iter()
            .find_map(|h| match h {
                Header::AppParameters(payload) => Some(decode_container(payload)),
                _ => None,
            })
            .unwrap_or_else(|| Ok(Self::new()))
    }
}

/// Encode `params` into a full container with the given header `code`.
///
/// Returns an empty buffer when no parameter has a value; callers must then
/// omit the header from the request entirely.
pub fn encode_container(code: u8, params: &ParameterSet) -> Result<Vec<u8>, CodecError> {
    if params.is_empty() {
        return Ok(Vec::new());
    }

    let entries = params.encode_entries()?;
    let mut out = Vec::with_capacity(header::PREFIX_SIZE + entries.len());
    header::write_byte_sequence(code, &entries, &mut out).map_err(|_| {
        CodecError::ValueOutOfRange {
            name: "ApplicationParameters",
            detail: format!("{} bytes of entries exceed a u16 length", entries.len()),
        }
    })?;

    debug!(
        "Encoded {} application parameter(s): {}",
        params.len(),
        hex::encode(&out)
    );
    Ok(out)
}

/// Encode `params` as an OBEX Application Parameters header (code 0x4C).
pub fn encode_app_parameters(params: &ParameterSet) -> Result<Vec<u8>, CodecError> {
    encode_container(header::id::APP_PARAMETERS, params)
}

/// Decode the entries of a container payload (header already stripped).
pub fn decode_container(payload: &[u8]) -> Result<ParameterSet, CodecError> {
    let mut params = ParameterSet::new();
    let mut offset = 0;

    while offset < payload.len() {
        let rest = &payload[offset..];
        if rest.len() < ENTRY_HEADER_SIZE {
            return Err(CodecError::TruncatedContainer {
                offset,
                remaining: rest.len(),
            });
        }

        let (tag, value, consumed) = property::decode(rest).map_err(|e| match e {
            CodecError::TruncatedEntry { .. } => CodecError::TruncatedContainer {
                offset,
                remaining: rest.len(),
            },
            other => other,
        })?;

        if params.get(tag).is_some() {
            return Err(CodecError::DuplicateTag {
                tag: tag.id(),
                name: tag.name(),
            });
        }
        params.insert(tag, value);
        offset += consumed;
    }

    debug!("Decoded {} application parameter(s)", params.len());
    Ok(params)
}

/// Split a full container into its code and entry payload.
pub fn split_container(bytes: &[u8]) -> Result<(u8, &[u8]), CodecError> {
    if bytes.len() < header::PREFIX_SIZE {
        return Err(CodecError::TruncatedContainer {
            offset: 0,
            remaining: bytes.len(),
        });
    }
    let total = u16::from_be_bytes([bytes[1], bytes[2]]) as usize;
    if total < header::PREFIX_SIZE || total > bytes.len() {
        return Err(CodecError::TruncatedContainer {
            offset: header::PREFIX_SIZE,
            remaining: bytes.len() - header::PREFIX_SIZE,
        });
    }
    Ok((bytes[0], &bytes[header::PREFIX_SIZE..total]))
}
