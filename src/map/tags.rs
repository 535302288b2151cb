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

//! Application Parameter tag registry.
//!
//! Every MAP Application Parameter is identified on the wire by a one-byte
//! tag id. The registry maps each known id to its canonical name and the
//! width of its value. It is a `static` table; new ids are appended at the
//! end without touching existing entries.

use crate::error::CodecError;

/// Wire width of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthClass {
    OneByte,
    TwoByte,
    FourByte,
    EightByte,
    Variable,
}

impl WidthClass {
    /// Fixed payload width in bytes, `None` for variable-width values.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::OneByte => Some(1),
            Self::TwoByte => Some(2),
            Self::FourByte => Some(4),
            Self::EightByte => Some(8),
            Self::Variable => None,
        }
    }

    /// Largest integer representable in this width.
    pub const fn max_value(self) -> Option<u64> {
        match self {
            Self::OneByte => Some(u8::MAX as u64),
            Self::TwoByte => Some(u16::MAX as u64),
            Self::FourByte => Some(u32::MAX as u64),
            Self::EightByte => Some(u64::MAX),
            Self::Variable => None,
        }
    }
}

/// Known MAP Application Parameter tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Tag {
    MaxListCount = 0x01,
    ListStartOffset = 0x02,
    FilterMessageType = 0x03,
    FilterPeriodBegin = 0x04,
    EndFilterPeriodEnd = 0x05,
    FilterReadStatus = 0x06,
    FilterRecipient = 0x07,
    FilterOriginator = 0x08,
    FilterPriority = 0x09,
    Attachment = 0x0A,
    Transparent = 0x0B,
    Retry = 0x0C,
    NewMessage = 0x0D,
    NotificationStatus = 0x0E,
    MasInstanceId = 0x0F,
    ParameterMask = 0x10,
    FolderListingSize = 0x11,
    ListingSize = 0x12,
    SubjectLength = 0x13,
    Charset = 0x14,
    FractionRequest = 0x15,
    FractionDeliver = 0x16,
    StatusIndicator = 0x17,
    StatusValue = 0x18,
    MseTime = 0x19,
    DatabaseIdentifier = 0x1A,
    ConversationListingVersionCounter = 0x1B,
    PresenceAvailability = 0x1C,
    PresenceText = 0x1D,
    LastActivity = 0x1E,
    FilterLastActivityBegin = 0x1F,
    FilterLastActivityEnd = 0x20,
    ChatState = 0x21,
    ConversationId = 0x22,
    FolderVersionCounter = 0x23,
    FilterMessageHandle = 0x24,
    NotificationFilterMask = 0x25,
    ConvParameterMask = 0x26,
    OwnerUci = 0x27,
    ExtendedData = 0x28,
    MapSupportedFeatures = 0x29,
    MessageHandle = 0x2A,
    ModifyText = 0x2B,
}

/// Immutable description of one registered tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDescriptor {
    pub tag: Tag,
    pub width: WidthClass,
    pub name: &'static str,
}

impl TagDescriptor {
    /// Raw tag id as it appears on the wire.
    pub const fn id(&self) -> u8 {
        self.tag as u8
    }
}

const fn entry(tag: Tag, width: WidthClass, name: &'static str) -> TagDescriptor {
    TagDescriptor { tag, width, name }
}

use WidthClass::{FourByte, OneByte, TwoByte, Variable};

/// Registry indexed by `tag_id - 1`.
static REGISTRY: [TagDescriptor; 43] = [
    entry(Tag::MaxListCount, TwoByte, "MaxListCount"),
    entry(Tag::ListStartOffset, TwoByte, "ListStartOffset"),
    entry(Tag::FilterMessageType, OneByte, "FilterMessageType"),
    entry(Tag::FilterPeriodBegin, Variable, "FilterPeriodBegin"),
    entry(Tag::EndFilterPeriodEnd, Variable, "EndFilterPeriodEnd"),
    entry(Tag::FilterReadStatus, OneByte, "FilterReadStatus"),
    entry(Tag::FilterRecipient, Variable, "FilterRecipient"),
    entry(Tag::FilterOriginator, Variable, "FilterOriginator"),
    entry(Tag::FilterPriority, OneByte, "FilterPriority"),
    entry(Tag::Attachment, OneByte, "Attachment"),
    entry(Tag::Transparent, OneByte, "Transparent"),
    entry(Tag::Retry, OneByte, "Retry"),
    entry(Tag::NewMessage, OneByte, "NewMessage"),
    entry(Tag::NotificationStatus, OneByte, "NotificationStatus"),
    entry(Tag::MasInstanceId, OneByte, "MASInstanceID"),
    entry(Tag::ParameterMask, FourByte, "ParameterMask"),
    entry(Tag::FolderListingSize, TwoByte, "FolderListingSize"),
    entry(Tag::ListingSize, TwoByte, "ListingSize"),
    entry(Tag::SubjectLength, OneByte, "SubjectLength"),
    entry(Tag::Charset, OneByte, "Charset"),
    entry(Tag::FractionRequest, OneByte, "FractionRequest"),
    entry(Tag::FractionDeliver, OneByte, "FractionDeliver"),
    entry(Tag::StatusIndicator, OneByte, "StatusIndicator"),
    entry(Tag::StatusValue, OneByte, "StatusValue"),
    entry(Tag::MseTime, Variable, "MSETime"),
    entry(Tag::DatabaseIdentifier, Variable, "DatabaseIdentifier"),
    entry(
        Tag::ConversationListingVersionCounter,
        Variable,
        "ConversationListingVersionCounter",
    ),
    entry(Tag::PresenceAvailability, OneByte, "PresenceAvailability"),
    entry(Tag::PresenceText, Variable, "PresenceText"),
    entry(Tag::LastActivity, Variable, "LastActivity"),
    entry(Tag::FilterLastActivityBegin, Variable, "FilterLastActivityBegin"),
    entry(Tag::FilterLastActivityEnd, Variable, "FilterLastActivityEnd"),
    entry(Tag::ChatState, OneByte, "ChatState"),
    entry(Tag::ConversationId, Variable, "ConversationID"),
    entry(Tag::FolderVersionCounter, Variable, "FolderVersionCounter"),
    entry(Tag::FilterMessageHandle, Variable, "FilterMessageHandle"),
    entry(Tag::NotificationFilterMask, FourByte, "NotificationFilterMask"),
    entry(Tag::ConvParameterMask, FourByte, "ConvParameterMask"),
    entry(Tag::OwnerUci, Variable, "OwnerUCI"),
    entry(Tag::ExtendedData, Variable, "ExtendedData"),
    entry(Tag::MapSupportedFeatures, FourByte, "MapSupportedFeatures"),
    entry(Tag::MessageHandle, Variable, "MessageHandle"),
    entry(Tag::ModifyText, OneByte, "ModifyText"),
];

/// Look up the descriptor for a raw tag id.
pub fn lookup(tag_id: u8) -> Result<&'static TagDescriptor, CodecError> {
    tag_id
        .checked_sub(1)
        .and_then(|index| REGISTRY.get(index as usize))
        .ok_or(CodecError::UnknownTag(tag_id))
}

/// All registered descriptors in tag id order.
pub fn all() -> &'static [TagDescriptor] {
    &REGISTRY
}

impl Tag {
    /// Registry entry for this tag.
    pub fn descriptor(self) -> &'static TagDescriptor {
        // Every variant has an entry at `id - 1`; checked by tests.
        &REGISTRY[self as usize - 1]
    }

    /// Canonical parameter name.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Value width on the wire.
    pub fn width(self) -> WidthClass {
        self.descriptor().width
    }

    /// Raw tag id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Resolve a canonical name (case-insensitive) to its tag.
    pub fn from_name(name: &str) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .map(|d| d.tag)
    }
}

impl TryFrom<u8> for Tag {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        lookup(value).map(|d| d.tag)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_index_matches_tag_id() {
        for (index, descriptor) in all().iter().enumerate() {
            assert_eq!(descriptor.id() as usize, index + 1, "{}", descriptor.name);
        }
    }

    #[test]
    fn test_registry_is_injective() {
        let ids: HashSet<u8> = all().iter().map(|d| d.id()).collect();
        let names: HashSet<&str> = all().iter().map(|d| d.name).collect();
        assert_eq!(ids.len(), all().len());
        assert_eq!(names.len(), all().len());
    }

    #[test]
    fn test_lookup_known_tags() {
        let max = lookup(0x01).unwrap();
        assert_eq!(max.tag, Tag::MaxListCount);
        assert_eq!(max.width, WidthClass::TwoByte);

        assert_eq!(lookup(0x10).unwrap().width, WidthClass::FourByte);
        assert_eq!(lookup(0x1A).unwrap().name, "DatabaseIdentifier");
        assert_eq!(lookup(0x2B).unwrap().tag, Tag::ModifyText);
    }

    #[test]
    fn test_lookup_unknown_tags() {
        assert_eq!(lookup(0x00), Err(CodecError::UnknownTag(0x00)));
        assert_eq!(lookup(0x2C), Err(CodecError::UnknownTag(0x2C)));
        assert_eq!(lookup(0xFF), Err(CodecError::UnknownTag(0xFF)));
    }

    #[test]
    fn test_width_classes() {
        let one_byte = [0x03, 0x06, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x1C, 0x21, 0x2B];
        let two_byte = [0x01, 0x02, 0x11, 0x12];
        let four_byte = [0x10, 0x25, 0x26, 0x29];

        for id in 0x01..=0x2B_u8 {
            let expected = if one_byte.contains(&id) {
                WidthClass::OneByte
            } else if two_byte.contains(&id) {
                WidthClass::TwoByte
            } else if four_byte.contains(&id) {
                WidthClass::FourByte
            } else {
                WidthClass::Variable
            };
            assert_eq!(lookup(id).unwrap().width, expected, "tag 0x{:02X}", id);
        }
    }

    #[test]
    fn test_tag_names() {
        assert_eq!(Tag::MasInstanceId.name(), "MASInstanceID");
        assert_eq!(Tag::from_name("listingsize"), Some(Tag::ListingSize));
        assert_eq!(Tag::from_name("nope"), None);
        assert_eq!(Tag::try_from(0x12).unwrap(), Tag::ListingSize);
        assert_eq!(Tag::MseTime.to_string(), "MSETime");
    }
}
