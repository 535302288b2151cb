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

//! Request primitives the MAP layer needs from an OBEX session.

use super::header::Header;
use super::packet::Response;
use crate::error::{CodecError, Result};
use crate::map::ParameterSet;

/// Result of a completed GET.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetResponse {
    /// Non-body headers from every response packet, in arrival order.
    pub headers: Vec<Header>,
    /// Concatenated Body/EndOfBody payloads.
    pub body: Vec<u8>,
}

impl GetResponse {
    /// Application Parameters sent back by the server.
    pub fn app_parameters(&self) -> std::result::Result<ParameterSet, CodecError> {
        ParameterSet::from_headers(&self.headers)
    }

    /// Body as text, lossily decoded.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// OBEX client operations used by the MAP layer.
///
/// A server-reported failure is always an `Err`; an `Ok` result means the
/// server answered with a success code. Calls run one at a time: each
/// future completes before the next request is issued.
#[allow(async_fn_in_trait)]
pub trait ObexTransport {
    /// GET an object, optionally by name.
    async fn get(&mut self, name: Option<&str>, headers: Vec<Header>) -> Result<GetResponse>;

    /// PUT `body` under `name`.
    async fn put(&mut self, name: &str, body: &[u8], headers: Vec<Header>) -> Result<Response>;

    /// SETPATH into `name`, to the parent when `to_parent` is set, or to the
    /// root when neither is given.
    async fn set_path(&mut self, name: Option<&str>, to_parent: bool) -> Result<Response>;
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;

    use super::*;
    use crate::error::ObexError;
    use crate::obex::ResponseCode;

    /// One recorded transport call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Get {
            name: Option<String>,
            headers: Vec<Header>,
        },
        Put {
            name: String,
            body: Vec<u8>,
            headers: Vec<Header>,
        },
        SetPath {
            name: Option<String>,
            to_parent: bool,
        },
    }

    /// Transport that records calls and answers from scripted queues.
    /// Empty queues answer with plain success.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        pub calls: Vec<Call>,
        pub get_replies: VecDeque<std::result::Result<GetResponse, ResponseCode>>,
        pub put_replies: VecDeque<std::result::Result<(), ResponseCode>>,
        pub set_path_replies: VecDeque<std::result::Result<(), ResponseCode>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script the n-th upcoming set_path call (0-based) to fail.
        pub fn fail_set_path_at(mut self, index: usize, code: ResponseCode) -> Self {
            while self.set_path_replies.len() <= index {
                self.set_path_replies.push_back(Ok(()));
            }
            self.set_path_replies[index] = Err(code);
            self
        }

        pub fn set_path_calls(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::SetPath { .. }))
                .count()
        }
    }

    fn success() -> Response {
        Response::new(ResponseCode::Success, Vec::new())
    }

    impl ObexTransport for MockTransport {
        async fn get(&mut self, name: Option<&str>, headers: Vec<Header>) -> Result<GetResponse> {
            self.calls.push(Call::Get {
                name: name.map(str::to_string),
                headers,
            });
            match self.get_replies.pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(code)) => Err(ObexError::Failure(code)),
                None => Ok(GetResponse::default()),
            }
        }

        async fn put(&mut self, name: &str, body: &[u8], headers: Vec<Header>) -> Result<Response> {
            self.calls.push(Call::Put {
                name: name.to_string(),
                body: body.to_vec(),
                headers,
            });
            match self.put_replies.pop_front() {
                Some(Err(code)) => Err(ObexError::Failure(code)),
                _ => Ok(success()),
            }
        }

        async fn set_path(&mut self, name: Option<&str>, to_parent: bool) -> Result<Response> {
            self.calls.push(Call::SetPath {
                name: name.map(str::to_string),
                to_parent,
            });
            match self.set_path_replies.pop_front() {
                Some(Err(code)) => Err(ObexError::Failure(code)),
                _ => Ok(success()),
            }
        }
    }
}
