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

//! Message Access Profile client.
//!
//! Application Parameters codec, folder navigation and the MAP request
//! builders on top of an OBEX transport.

pub mod client;
pub mod folder;
pub mod params;
pub mod property;
pub mod tags;

pub use client::{
    Charset, GetMessageOptions, Listing, MapClient, MessagesListingOptions, PushMessageOptions,
    StatusIndicator,
};
pub use folder::{FolderNavigator, Navigation};
pub use params::{decode_container, encode_app_parameters, encode_container, ParameterSet};
pub use property::PropertyValue;
pub use tags::{Tag, TagDescriptor, WidthClass};
