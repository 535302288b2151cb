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

//! Message Access Profile client requests.

use tracing::{error, info};

use super::folder::{FolderNavigator, Navigation};
use super::params::ParameterSet;
use super::tags::Tag;
use crate::error::{CodecError, MapError, NavigationError};
use crate::obex::{Header, ObexTransport, Response};

/// Object types sent in the Type header.
pub mod mime {
    pub const FOLDER_LISTING: &str = "x-obex/folder-listing";
    pub const MESSAGE_LISTING: &str = "x-bt/MAP-msg-listing";
    pub const MESSAGE: &str = "x-bt/message";
    pub const MESSAGE_STATUS: &str = "x-bt/messageStatus";
    pub const MESSAGE_UPDATE: &str = "x-bt/MAP-messageUpdate";
}

/// Body of PUTs that carry no object.
const FILLER_BODY: &[u8] = b"0";

/// Default MaxListCount for listings.
pub const DEFAULT_MAX_LIST_COUNT: u16 = 1024;

/// Charset of delivered or pushed messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Charset {
    Native = 0,
    #[default]
    Utf8 = 1,
}

impl TryFrom<u8> for Charset {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Native),
            1 => Ok(Self::Utf8),
            other => Err(CodecError::ValueOutOfRange {
                name: "Charset",
                detail: format!("{} is not 0 (native) or 1 (UTF-8)", other),
            }),
        }
    }
}

/// Which status flag of a message to modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusIndicator {
    Read = 0,
    Deleted = 1,
}

impl TryFrom<u8> for StatusIndicator {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Read),
            1 => Ok(Self::Deleted),
            other => Err(CodecError::ValueOutOfRange {
                name: "StatusIndicator",
                detail: format!("{} is not 0 (read) or 1 (deleted)", other),
            }),
        }
    }
}

/// Options for a messages listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagesListingOptions {
    pub max_list_count: u16,
    pub list_start_offset: u16,
    pub subject_length: Option<u8>,
    pub parameter_mask: Option<u32>,
    /// Bit mask of message types to leave out.
    pub filter_message_type: u8,
    pub filter_period_begin: Option<String>,
    pub filter_period_end: Option<String>,
    /// 0 = all, 1 = unread only, 2 = read only.
    pub filter_read_status: u8,
    pub filter_recipient: Option<String>,
    pub filter_originator: Option<String>,
    pub filter_priority: Option<u8>,
    pub new_message: u8,
}

impl Default for MessagesListingOptions {
    fn default() -> Self {
        Self {
            max_list_count: DEFAULT_MAX_LIST_COUNT,
            list_start_offset: 0,
            subject_length: None,
            parameter_mask: None,
            filter_message_type: 0,
            filter_period_begin: None,
            filter_period_end: None,
            filter_read_status: 0,
            filter_recipient: None,
            filter_originator: None,
            filter_priority: None,
            new_message: 0,
        }
    }
}

impl MessagesListingOptions {
    fn to_params(&self) -> ParameterSet {
        ParameterSet::new()
            .with(Tag::MaxListCount, self.max_list_count)
            .with(Tag::ListStartOffset, self.list_start_offset)
            .with_optional(Tag::SubjectLength, self.subject_length)
            .with_optional(Tag::ParameterMask, self.parameter_mask)
            .with(Tag::FilterMessageType, self.filter_message_type)
            .with_optional(Tag::FilterPeriodBegin, self.filter_period_begin.as_deref())
            .with_optional(Tag::EndFilterPeriodEnd, self.filter_period_end.as_deref())
            .with(Tag::FilterReadStatus, self.filter_read_status)
            .with_optional(Tag::FilterRecipient, self.filter_recipient.as_deref())
            .with_optional(Tag::FilterOriginator, self.filter_originator.as_deref())
            .with_optional(Tag::FilterPriority, self.filter_priority)
            .with(Tag::NewMessage, self.new_message)
    }
}

/// Options for fetching one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetMessageOptions {
    /// 1 to include attachments.
    pub attachment: u8,
    pub charset: Charset,
    pub fraction_request: Option<u8>,
}

impl Default for GetMessageOptions {
    fn default() -> Self {
        Self {
            attachment: 1,
            charset: Charset::Utf8,
            fraction_request: None,
        }
    }
}

/// Options for pushing a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushMessageOptions {
    pub transparent: u8,
    pub retry: u8,
    pub charset: Charset,
}

impl Default for PushMessageOptions {
    fn default() -> Self {
        Self {
            transparent: 0,
            retry: 1,
            charset: Charset::Utf8,
        }
    }
}

/// A listing or message object returned by GET.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Application Parameters from the response.
    pub params: ParameterSet,
    pub body: Vec<u8>,
}

impl Listing {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// FolderListingSize or ListingSize, whichever the server sent.
    pub fn listing_size(&self) -> Option<u64> {
        self.params
            .get_uint(Tag::ListingSize)
            .or_else(|| self.params.get_uint(Tag::FolderListingSize))
    }
}

/// MAP client bound to one OBEX session.
pub struct MapClient<T> {
    transport: T,
    folder: FolderNavigator,
}

impl<T: ObexTransport> MapClient<T> {
    /// Start at the root folder of a connected session.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            folder: FolderNavigator::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn current_folder(&self) -> String {
        self.folder.path()
    }

    /// List the sub-folders of the current folder.
    pub async fn get_folder_listing(
        &mut self,
        max_list_count: u16,
        list_start_offset: u16,
    ) -> Result<Listing, MapError> {
        info!(
            "Requesting get_folder_listing (max_list_count={}, list_start_offset={})",
            max_list_count, list_start_offset
        );
        let params = ParameterSet::new()
            .with(Tag::MaxListCount, max_list_count)
            .with(Tag::ListStartOffset, list_start_offset);
        let headers = request_headers(mime::FOLDER_LISTING, &params)?;

        self.fetch("get_folder_listing", None, headers).await
    }

    /// List messages in `folder`, a child of the current folder
    /// (empty for the current folder itself).
    pub async fn get_messages_listing(
        &mut self,
        folder: &str,
        options: &MessagesListingOptions,
    ) -> Result<Listing, MapError> {
        info!(
            "Requesting get_messages_listing for '{}' with {:?}",
            folder, options
        );
        let headers = request_headers(mime::MESSAGE_LISTING, &options.to_params())?;

        self.fetch("get_messages_listing", Some(folder), headers).await
    }

    /// Fetch the bMessage with the given handle.
    pub async fn get_message(
        &mut self,
        handle: &str,
        options: &GetMessageOptions,
    ) -> Result<Listing, MapError> {
        info!("Requesting get_message '{}' with {:?}", handle, options);
        let params = ParameterSet::new()
            .with(Tag::Attachment, options.attachment)
            .with(Tag::Charset, options.charset as u8)
            .with_optional(Tag::FractionRequest, options.fraction_request);
        let headers = request_headers(mime::MESSAGE, &params)?;

        self.fetch("get_message", Some(handle), headers).await
    }

    /// Set the read or deleted flag of a message.
    pub async fn set_message_status(
        &mut self,
        handle: &str,
        indicator: StatusIndicator,
        value: bool,
    ) -> Result<Response, MapError> {
        info!(
            "Requesting set_message_status '{}' ({:?} = {})",
            handle, indicator, value
        );
        let params = ParameterSet::new()
            .with(Tag::StatusIndicator, indicator as u8)
            .with(Tag::StatusValue, value);
        let headers = request_headers(mime::MESSAGE_STATUS, &params)?;

        self.send("set_message_status", handle, FILLER_BODY, headers)
            .await
    }

    /// Push a bMessage into `folder`.
    pub async fn push_message(
        &mut self,
        folder: &str,
        bmessage: &[u8],
        options: &PushMessageOptions,
    ) -> Result<Response, MapError> {
        info!(
            "Requesting push_message to '{}' ({} bytes) with {:?}",
            folder,
            bmessage.len(),
            options
        );
        let params = ParameterSet::new()
            .with(Tag::Transparent, options.transparent)
            .with(Tag::Retry, options.retry)
            .with(Tag::Charset, options.charset as u8);
        let headers = request_headers(mime::MESSAGE, &params)?;

        self.send("push_message", folder, bmessage, headers).await
    }

    /// Ask the server to check for new messages.
    pub async fn update_inbox(&mut self) -> Result<Response, MapError> {
        info!("Requesting update_inbox");
        let headers = request_headers(mime::MESSAGE_UPDATE, &ParameterSet::new())?;

        self.send("update_inbox", "", FILLER_BODY, headers).await
    }

    /// Change folder: `to_root` wins over `to_parent`, otherwise walk the
    /// path `name`.
    ///
    /// A leading `/` starts from the root, `..` steps up one level and `.`
    /// is skipped. Walking stops at the first failed step.
    pub async fn set_folder(
        &mut self,
        name: &str,
        to_parent: bool,
        to_root: bool,
    ) -> Result<Navigation, MapError> {
        info!(
            "Setting current folder (name='{}', to_parent={}, to_root={})",
            name, to_parent, to_root
        );

        if to_root {
            return Ok(self.folder.reset_to_root(&mut self.transport).await?);
        }
        if to_parent {
            return Ok(self.folder.ascend_to_parent(&mut self.transport).await?);
        }
        if name.is_empty() {
            error!("Not a valid action: a folder name or to_parent/to_root is required");
            return Err(NavigationError::InvalidAction.into());
        }

        let mut outcome = Navigation::Changed;
        if name.starts_with('/') {
            outcome = self.folder.reset_to_root(&mut self.transport).await?;
        }
        for part in name.split('/').filter(|p| !p.is_empty() && *p != ".") {
            outcome = if part == ".." {
                self.folder.ascend_to_parent(&mut self.transport).await?
            } else {
                self.folder.descend(&mut self.transport, part).await?
            };
        }
        Ok(outcome)
    }

    async fn fetch(
        &mut self,
        operation: &str,
        name: Option<&str>,
        headers: Vec<Header>,
    ) -> Result<Listing, MapError> {
        let response = self.transport.get(name, headers).await.map_err(|e| {
            error!("{} failed: {}", operation, e);
            e
        })?;

        let params = response.app_parameters().map_err(|e| {
            error!("{}: bad application parameters in response: {}", operation, e);
            e
        })?;

        Ok(Listing {
            params,
            body: response.body,
        })
    }

    async fn send(
        &mut self,
        operation: &str,
        name: &str,
        body: &[u8],
        headers: Vec<Header>,
    ) -> Result<Response, MapError> {
        self.transport
            .put(name, body, headers)
            .await
            .map_err(|e| {
                error!("{} failed for '{}': {}", operation, name, e);
                e.into()
            })
    }
}

/// Type header plus Application Parameters when there are any.
fn request_headers(mime: &str, params: &ParameterSet) -> Result<Vec<Header>, CodecError> {
    let mut headers = vec![Header::Type(mime.to_string())];
    if let Some(app_params) = params.to_header()? {
        headers.push(app_params);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::params::decode_container;
    use crate::obex::transport::mock::{Call, MockTransport};
    use crate::obex::{GetResponse, ResponseCode};

    fn app_params(headers: &[Header]) -> Option<ParameterSet> {
        headers.iter().find_map(|h| match h {
            Header::AppParameters(p) => Some(decode_container(p).unwrap()),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_folder_listing_request() {
        let mut transport = MockTransport::new();
        transport.get_replies.push_back(Ok(GetResponse {
            headers: vec![Header::AppParameters(vec![0x11, 0x02, 0x00, 0x05])],
            body: b"<folder-listing/>".to_vec(),
        }));
        let mut client = MapClient::new(transport);

        let listing = client.get_folder_listing(1024, 0).await.unwrap();
        assert_eq!(listing.listing_size(), Some(5));
        assert_eq!(listing.text(), "<folder-listing/>");

        let Call::Get { name, headers } = &client.transport().calls[0] else {
            panic!("expected GET");
        };
        assert_eq!(*name, None);
        assert_eq!(headers[0], Header::Type("x-obex/folder-listing".into()));
        assert_eq!(
            headers[1],
            Header::AppParameters(vec![0x01, 0x02, 0x04, 0x00, 0x02, 0x02, 0x00, 0x00])
        );
    }

    #[tokio::test]
    async fn test_messages_listing_parameters() {
        let mut client = MapClient::new(MockTransport::new());
        let options = MessagesListingOptions {
            max_list_count: 10,
            filter_read_status: 1,
            filter_originator: Some("alice".into()),
            ..Default::default()
        };

        client.get_messages_listing("inbox", &options).await.unwrap();

        let Call::Get { name, headers } = &client.transport().calls[0] else {
            panic!("expected GET");
        };
        assert_eq!(name.as_deref(), Some("inbox"));
        assert_eq!(headers[0], Header::Type("x-bt/MAP-msg-listing".into()));

        let params = app_params(headers).unwrap();
        let tags: Vec<Tag> = params.iter().map(|(t, _)| t).collect();
        assert_eq!(
            tags,
            vec![
                Tag::MaxListCount,
                Tag::ListStartOffset,
                Tag::FilterMessageType,
                Tag::FilterReadStatus,
                Tag::FilterOriginator,
                Tag::NewMessage,
            ]
        );
        assert_eq!(params.get_uint(Tag::MaxListCount), Some(10));
        assert_eq!(params.get_bytes(Tag::FilterOriginator), Some(&b"alice"[..]));
    }

    #[tokio::test]
    async fn test_get_message_failure_is_surfaced() {
        let mut transport = MockTransport::new();
        transport.get_replies.push_back(Err(ResponseCode::NotFound));
        let mut client = MapClient::new(transport);

        let err = client
            .get_message("20000100001", &GetMessageOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MapError::Obex(ref e) if e.response_code() == Some(ResponseCode::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_bad_response_parameters_are_surfaced() {
        let mut transport = MockTransport::new();
        transport.get_replies.push_back(Ok(GetResponse {
            headers: vec![Header::AppParameters(vec![0x12, 0x02, 0x00])],
            body: Vec::new(),
        }));
        let mut client = MapClient::new(transport);

        let err = client.get_folder_listing(10, 0).await.unwrap_err();
        assert!(matches!(err, MapError::Params(CodecError::TruncatedContainer { .. })));
    }

    #[tokio::test]
    async fn test_set_message_status() {
        let mut client = MapClient::new(MockTransport::new());
        client
            .set_message_status("20000100001", StatusIndicator::Deleted, true)
            .await
            .unwrap();

        let Call::Put { name, body, headers } = &client.transport().calls[0] else {
            panic!("expected PUT");
        };
        assert_eq!(name, "20000100001");
        assert_eq!(body, b"0");
        assert_eq!(headers[0], Header::Type("x-bt/messageStatus".into()));
        assert_eq!(
            headers[1],
            Header::AppParameters(vec![0x17, 0x01, 0x01, 0x18, 0x01, 0x01])
        );
    }

    #[tokio::test]
    async fn test_push_message() {
        let mut client = MapClient::new(MockTransport::new());
        let bmessage = b"BEGIN:BMSG\r\nEND:BMSG\r\n";
        client
            .push_message("outbox", bmessage, &PushMessageOptions::default())
            .await
            .unwrap();

        let Call::Put { name, body, headers } = &client.transport().calls[0] else {
            panic!("expected PUT");
        };
        assert_eq!(name, "outbox");
        assert_eq!(body, bmessage);
        assert_eq!(
            headers[1],
            Header::AppParameters(vec![0x0B, 0x01, 0x00, 0x0C, 0x01, 0x01, 0x14, 0x01, 0x01])
        );
    }

    #[tokio::test]
    async fn test_update_inbox_sends_no_app_parameters() {
        let mut client = MapClient::new(MockTransport::new());
        client.update_inbox().await.unwrap();

        let Call::Put { name, headers, .. } = &client.transport().calls[0] else {
            panic!("expected PUT");
        };
        assert_eq!(name, "");
        assert_eq!(headers, &vec![Header::Type("x-bt/MAP-messageUpdate".into())]);
    }

    #[tokio::test]
    async fn test_set_folder_actions() {
        let mut client = MapClient::new(MockTransport::new());

        assert!(matches!(
            client.set_folder("", false, false).await,
            Err(MapError::Navigation(NavigationError::InvalidAction))
        ));
        assert_eq!(
            client.set_folder("", true, false).await.unwrap(),
            Navigation::AlreadyAtRoot
        );

        client.set_folder("telecom/msg/inbox", false, false).await.unwrap();
        assert_eq!(client.current_folder(), "/telecom/msg/inbox");
        assert_eq!(client.transport().set_path_calls(), 3);

        client.set_folder("", true, false).await.unwrap();
        assert_eq!(client.current_folder(), "/telecom/msg");

        // to_root wins over to_parent
        client.set_folder("ignored", true, true).await.unwrap();
        assert_eq!(client.current_folder(), "/");
        assert_eq!(client.transport().set_path_calls(), 6);
    }

    #[tokio::test]
    async fn test_set_folder_walks_paths() {
        let mut client = MapClient::new(MockTransport::new());
        client.set_folder("telecom/msg/inbox", false, false).await.unwrap();

        // Absolute path: back to the root first, then down
        client.set_folder("/telecom/msg", false, false).await.unwrap();
        assert_eq!(client.current_folder(), "/telecom/msg");
        assert_eq!(
            client.transport().calls[3..],
            [
                Call::SetPath { name: None, to_parent: true },
                Call::SetPath { name: None, to_parent: true },
                Call::SetPath { name: None, to_parent: true },
                Call::SetPath { name: Some("telecom".into()), to_parent: false },
                Call::SetPath { name: Some("msg".into()), to_parent: false },
            ]
        );

        // ".." is a parent step, never a literal folder name
        client.set_folder("../msg/./sent", false, false).await.unwrap();
        assert_eq!(client.current_folder(), "/telecom/msg/sent");
        assert!(client.transport().calls.iter().all(|c| !matches!(
            c,
            Call::SetPath { name: Some(n), .. } if n == ".." || n == "."
        )));

        assert_eq!(
            client.set_folder("/", false, false).await.unwrap(),
            Navigation::Changed
        );
        assert_eq!(client.current_folder(), "/");
        assert_eq!(
            client.set_folder("/", false, false).await.unwrap(),
            Navigation::AlreadyAtRoot
        );
    }

    #[tokio::test]
    async fn test_set_folder_failure_is_a_navigation_error() {
        let transport = MockTransport::new().fail_set_path_at(1, ResponseCode::NotFound);
        let mut client = MapClient::new(transport);

        let err = client.set_folder("telecom/nope", false, false).await.unwrap_err();
        assert!(matches!(
            err,
            MapError::Navigation(NavigationError::Transport { ref path, .. }) if path == "/telecom"
        ));
        assert_eq!(client.current_folder(), "/telecom");
    }

    #[test]
    fn test_enum_conversions() {
        assert_eq!(Charset::try_from(1).unwrap(), Charset::Utf8);
        assert!(Charset::try_from(2).is_err());
        assert_eq!(StatusIndicator::try_from(0).unwrap(), StatusIndicator::Read);
        assert!(StatusIndicator::try_from(9).is_err());
    }
}
