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

//! Bluetooth identifiers for the Message Access Service.

use uuid::Uuid;

/// OBEX Target of the Message Access Service, sent in CONNECT.
pub const MAS_TARGET_UUID: Uuid = Uuid::from_u128(0xbb582b40_420c_11db_b0de_0800200c9a66);

/// Message Access Server service class (0x1132).
pub const MAS_SERVICE_UUID: Uuid = Uuid::from_u128(0x00001132_0000_1000_8000_00805F9B34FB);

/// Connection timeouts.
pub mod timeouts {
    use std::time::Duration;

    /// Wait for BlueZ to hand over the profile connection.
    pub const PROFILE_CONNECT: Duration = Duration::from_secs(30);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mas_target_bytes() {
        assert_eq!(
            MAS_TARGET_UUID.as_bytes(),
            &[
                0xBB, 0x58, 0x2B, 0x40, 0x42, 0x0C, 0x11, 0xDB, 0xB0, 0xDE, 0x08, 0x00, 0x20, 0x0C,
                0x9A, 0x66
            ]
        );
    }

    #[test]
    fn test_service_uuid_short_form() {
        assert_eq!(
            MAS_SERVICE_UUID.to_string(),
            "00001132-0000-1000-8000-00805f9b34fb"
        );
    }
}
