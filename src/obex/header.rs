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

//! OBEX header encoding and decoding.
//!
//! The two high bits of a header id select its encoding:
//! ```text
//! 00  null-terminated UTF-16BE text, u16 BE length prefix
//! 01  byte sequence, u16 BE length prefix
//! 10  single byte
//! 11  four byte u32 BE
//! ```
//! Length prefixes count the id and the length field itself.

use crate::error::{ObexError, Result};

/// Size of the id + u16 length prefix of text and byte-sequence headers.
pub const PREFIX_SIZE: usize = 3;

/// Header ids used by the MAP client.
pub mod id {
    pub const NAME: u8 = 0x01;
    pub const DESCRIPTION: u8 = 0x05;
    pub const TYPE: u8 = 0x42;
    pub const LENGTH: u8 = 0xC3;
    pub const TARGET: u8 = 0x46;
    pub const BODY: u8 = 0x48;
    pub const END_OF_BODY: u8 = 0x49;
    pub const WHO: u8 = 0x4A;
    pub const APP_PARAMETERS: u8 = 0x4C;
    pub const CONNECTION_ID: u8 = 0xCB;

    /// Encoding class mask.
    pub const KIND_MASK: u8 = 0xC0;
    pub const KIND_UNICODE: u8 = 0x00;
    pub const KIND_BYTES: u8 = 0x40;
    pub const KIND_BYTE: u8 = 0x80;
    pub const KIND_U32: u8 = 0xC0;
}

/// A single OBEX header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Name(String),
    Description(String),
    /// MIME-style object type, e.g. `x-bt/MAP-msg-listing`.
    Type(String),
    Length(u32),
    Target(Vec<u8>),
    Who(Vec<u8>),
    ConnectionId(u32),
    /// Application Parameters entries, without the 3-byte header prefix.
    AppParameters(Vec<u8>),
    Body(Vec<u8>),
    EndOfBody(Vec<u8>),
    /// Any header this client does not interpret. `data` holds the raw value.
    Other { id: u8, data: Vec<u8> },
}

impl Header {
    pub fn id(&self) -> u8 {
        match self {
            Header::Name(_) => id::NAME,
            Header::Description(_) => id::DESCRIPTION,
            Header::Type(_) => id::TYPE,
            Header::Length(_) => id::LENGTH,
            Header::Target(_) => id::TARGET,
            Header::Who(_) => id::WHO,
            Header::ConnectionId(_) => id::CONNECTION_ID,
            Header::AppParameters(_) => id::APP_PARAMETERS,
            Header::Body(_) => id::BODY,
            Header::EndOfBody(_) => id::END_OF_BODY,
            Header::Other { id, .. } => *id,
        }
    }

    /// Append the wire form of this header to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Header::Name(text) | Header::Description(text) => {
                write_unicode(self.id(), text, out)
            }
            Header::Type(mime) => {
                let mut data = Vec::with_capacity(mime.len() + 1);
                data.extend_from_slice(mime.as_bytes());
                data.push(0);
                write_byte_sequence(id::TYPE, &data, out)
            }
            Header::Length(v) | Header::ConnectionId(v) => {
                out.push(self.id());
                out.extend_from_slice(&v.to_be_bytes());
                Ok(())
            }
            Header::Target(data)
            | Header::Who(data)
            | Header::AppParameters(data)
            | Header::Body(data)
            | Header::EndOfBody(data) => write_byte_sequence(self.id(), data, out),
            Header::Other { id, data } => match id & id::KIND_MASK {
                id::KIND_BYTE => {
                    let [value] = data.as_slice() else {
                        return Err(ObexError::Protocol(format!(
                            "header 0x{:02X} needs exactly 1 byte, got {}",
                            id,
                            data.len()
                        )));
                    };
                    out.push(*id);
                    out.push(*value);
                    Ok(())
                }
                id::KIND_U32 => {
                    if data.len() != 4 {
                        return Err(ObexError::Protocol(format!(
                            "header 0x{:02X} needs exactly 4 bytes, got {}",
                            id,
                            data.len()
                        )));
                    }
                    out.push(*id);
                    out.extend_from_slice(data);
                    Ok(())
                }
                _ => write_byte_sequence(*id, data, out),
            },
        }
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        match self {
            Header::Name(text) | Header::Description(text) => {
                if text.is_empty() {
                    PREFIX_SIZE
                } else {
                    PREFIX_SIZE + (text.encode_utf16().count() + 1) * 2
                }
            }
            Header::Type(mime) => PREFIX_SIZE + mime.len() + 1,
            Header::Length(_) | Header::ConnectionId(_) => 5,
            Header::Target(data)
            | Header::Who(data)
            | Header::AppParameters(data)
            | Header::Body(data)
            | Header::EndOfBody(data) => PREFIX_SIZE + data.len(),
            Header::Other { id, data } => match id & id::KIND_MASK {
                id::KIND_BYTE => 2,
                id::KIND_U32 => 5,
                _ => PREFIX_SIZE + data.len(),
            },
        }
    }
}

/// Write `[id][u16 length][data]`.
pub fn write_byte_sequence(id: u8, data: &[u8], out: &mut Vec<u8>) -> Result<()> {
    let total = u16::try_from(PREFIX_SIZE + data.len()).map_err(|_| {
        ObexError::Protocol(format!(
            "header 0x{:02X} payload of {} bytes is too long",
            id,
            data.len()
        ))
    })?;
    out.push(id);
    out.extend_from_slice(&total.to_be_bytes());
    out.extend_from_slice(data);
    Ok(())
}

fn write_unicode(id: u8, text: &str, out: &mut Vec<u8>) -> Result<()> {
    if text.is_empty() {
        return write_byte_sequence(id, &[], out);
    }
    let mut data = Vec::with_capacity((text.len() + 1) * 2);
    for unit in text.encode_utf16().chain(std::iter::once(0)) {
        data.extend_from_slice(&unit.to_be_bytes());
    }
    write_byte_sequence(id, &data, out)
}

fn read_unicode(id: u8, data: &[u8]) -> Result<String> {
    if data.len() % 2 != 0 {
        return Err(ObexError::Protocol(format!(
            "header 0x{:02X} has odd UTF-16 length {}",
            id,
            data.len()
        )));
    }
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16(&units)
        .map_err(|e| ObexError::Protocol(format!("header 0x{:02X}: {}", id, e)))
}

fn read_ascii(id: u8, data: &[u8]) -> Result<String> {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8(data[..end].to_vec())
        .map_err(|e| ObexError::Protocol(format!("header 0x{:02X}: {}", id, e)))
}

/// Encode a list of headers.
pub fn encode_headers(headers: &[Header]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(headers.iter().map(Header::encoded_len).sum());
    for header in headers {
        header.encode_into(&mut out)?;
    }
    Ok(out)
}

/// Decode every header in `bytes`.
pub fn decode_headers(mut bytes: &[u8]) -> Result<Vec<Header>> {
    let mut headers = Vec::new();

    while let Some(&hid) = bytes.first() {
        let (header, consumed) = match hid & id::KIND_MASK {
            id::KIND_BYTE => {
                let value = *bytes
                    .get(1)
                    .ok_or_else(|| truncated(hid, 2, bytes.len()))?;
                (
                    Header::Other {
                        id: hid,
                        data: vec![value],
                    },
                    2,
                )
            }
            id::KIND_U32 => {
                if bytes.len() < 5 {
                    return Err(truncated(hid, 5, bytes.len()));
                }
                let value = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
                let header = match hid {
                    id::LENGTH => Header::Length(value),
                    id::CONNECTION_ID => Header::ConnectionId(value),
                    _ => Header::Other {
                        id: hid,
                        data: bytes[1..5].to_vec(),
                    },
                };
                (header, 5)
            }
            _ => {
                if bytes.len() < PREFIX_SIZE {
                    return Err(truncated(hid, PREFIX_SIZE, bytes.len()));
                }
                let total = u16::from_be_bytes([bytes[1], bytes[2]]) as usize;
                if total < PREFIX_SIZE || total > bytes.len() {
                    return Err(truncated(hid, total, bytes.len()));
                }
                let data = &bytes[PREFIX_SIZE..total];
                let header = match hid {
                    id::NAME => Header::Name(read_unicode(hid, data)?),
                    id::DESCRIPTION => Header::Description(read_unicode(hid, data)?),
                    id::TYPE => Header::Type(read_ascii(hid, data)?),
                    id::TARGET => Header::Target(data.to_vec()),
                    id::WHO => Header::Who(data.to_vec()),
                    id::APP_PARAMETERS => Header::AppParameters(data.to_vec()),
                    id::BODY => Header::Body(data.to_vec()),
                    id::END_OF_BODY => Header::EndOfBody(data.to_vec()),
                    _ => Header::Other {
                        id: hid,
                        data: data.to_vec(),
                    },
                };
                (header, total)
            }
        };
        headers.push(header);
        bytes = &bytes[consumed..];
    }

    Ok(headers)
}

fn truncated(id: u8, needed: usize, available: usize) -> ObexError {
    ObexError::Protocol(format!(
        "header 0x{:02X} truncated: needs {} bytes, {} available",
        id, needed, available
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_header_utf16() {
        let bytes = encode_headers(&[Header::Name("inbox".into())]).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x01, 0x00, 0x0F, 0x00, b'i', 0x00, b'n', 0x00, b'b', 0x00, b'o', 0x00, b'x',
                0x00, 0x00
            ]
        );
        assert_eq!(Header::Name("inbox".into()).encoded_len(), bytes.len());
    }

    #[test]
    fn test_empty_name_is_bare_prefix() {
        let bytes = encode_headers(&[Header::Name(String::new())]).unwrap();
        assert_eq!(bytes, vec![0x01, 0x00, 0x03]);
        assert_eq!(decode_headers(&bytes).unwrap(), vec![Header::Name(String::new())]);
    }

    #[test]
    fn test_type_header_is_null_terminated() {
        let header = Header::Type("x-bt/message".into());
        let bytes = encode_headers(&[header.clone()]).unwrap();
        assert_eq!(&bytes[..3], &[0x42, 0x00, 0x10]);
        assert_eq!(*bytes.last().unwrap(), 0x00);
        assert_eq!(decode_headers(&bytes).unwrap(), vec![header]);
    }

    #[test]
    fn test_connection_id_and_app_parameters() {
        let headers = vec![
            Header::ConnectionId(0x0102_0304),
            Header::AppParameters(vec![0x01, 0x02, 0x04, 0x00]),
        ];
        let bytes = encode_headers(&headers).unwrap();
        assert_eq!(
            bytes,
            vec![0xCB, 0x01, 0x02, 0x03, 0x04, 0x4C, 0x00, 0x07, 0x01, 0x02, 0x04, 0x00]
        );
        assert_eq!(decode_headers(&bytes).unwrap(), headers);
    }

    #[test]
    fn test_unknown_headers_are_kept() {
        let bytes = [0x97, 0x01, 0xD4, 0x00, 0x00, 0x00, 0x09, 0x7F, 0x00, 0x04, 0xAA];
        let headers = decode_headers(&bytes).unwrap();
        assert_eq!(
            headers,
            vec![
                Header::Other { id: 0x97, data: vec![0x01] },
                Header::Other { id: 0xD4, data: vec![0, 0, 0, 9] },
                Header::Other { id: 0x7F, data: vec![0xAA] },
            ]
        );
        assert_eq!(encode_headers(&headers).unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_truncated_headers() {
        assert!(decode_headers(&[0x48, 0x00, 0x08, 0x01]).is_err());
        assert!(decode_headers(&[0xCB, 0x00, 0x01]).is_err());
        assert!(decode_headers(&[0x48, 0x00, 0x02]).is_err());
        assert!(decode_headers(&[0x97]).is_err());
    }

    #[test]
    fn test_odd_unicode_length_rejected() {
        assert!(decode_headers(&[0x01, 0x00, 0x04, 0x41]).is_err());
    }
}
