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

//! OBEX client layer.
//!
//! Packet framing, headers and a sequential client session used to carry
//! MAP requests.

pub mod header;
pub mod packet;
pub mod session;
pub mod transport;

pub use header::Header;
pub use packet::{Request, Response, ResponseCode};
pub use session::{ConnectInfo, ObexSession, DEFAULT_MAX_PACKET_LENGTH};
pub use transport::{GetResponse, ObexTransport};
