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

//! Virtual folder navigation state.
//!
//! Tracks the client's position in the MAS folder tree. The path only
//! changes after the server confirms a SETPATH.

use tracing::{debug, error, warn};

use crate::error::NavigationError;
use crate::obex::ObexTransport;

/// Outcome of a navigation request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The current folder changed.
    Changed,
    /// Already at the root; nothing was sent.
    AlreadyAtRoot,
}

/// Current folder of one MAS session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderNavigator {
    segments: Vec<String>,
}

impl FolderNavigator {
    /// Start at the root folder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute path, `/` at the root, no trailing slash otherwise.
    pub fn path(&self) -> String {
        if self.segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.segments.join("/"))
        }
    }

    /// Number of folders below the root.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Enter the child folder `name`.
    pub async fn descend<T: ObexTransport>(
        &mut self,
        transport: &mut T,
        name: &str,
    ) -> Result<Navigation, NavigationError> {
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(NavigationError::InvalidName(name.to_string()));
        }

        transport
            .set_path(Some(name), false)
            .await
            .map_err(|source| self.failed(source))?;

        self.segments.push(name.to_string());
        debug!("Current folder: {}", self.path());
        Ok(Navigation::Changed)
    }

    /// Go up one level.
    pub async fn ascend_to_parent<T: ObexTransport>(
        &mut self,
        transport: &mut T,
    ) -> Result<Navigation, NavigationError> {
        if self.is_root() {
            warn!("Already in the root folder, can't go to parent");
            return Ok(Navigation::AlreadyAtRoot);
        }

        transport
            .set_path(None, true)
            .await
            .map_err(|source| self.failed(source))?;

        self.segments.pop();
        debug!("Current folder: {}", self.path());
        Ok(Navigation::Changed)
    }

    /// Return to the root with one parent step per level.
    ///
    /// Stops at the first failed step; the path then reflects every step
    /// that succeeded.
    pub async fn reset_to_root<T: ObexTransport>(
        &mut self,
        transport: &mut T,
    ) -> Result<Navigation, NavigationError> {
        if self.is_root() {
            warn!("Already in the root folder, no need to change");
            return Ok(Navigation::AlreadyAtRoot);
        }

        let steps = self.depth();
        for step in 1..=steps {
            transport.set_path(None, true).await.map_err(|source| {
                error!("Parent step {} of {} failed", step, steps);
                self.failed(source)
            })?;
            self.segments.pop();
        }

        debug!("Current folder: {}", self.path());
        Ok(Navigation::Changed)
    }

    fn failed(&self, source: crate::error::ObexError) -> NavigationError {
        error!("Folder change failed at {}: {}", self.path(), source);
        NavigationError::Transport {
            path: self.path(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obex::transport::mock::{Call, MockTransport};
    use crate::obex::ResponseCode;

    async fn navigator_at(path: &[&str], transport: &mut MockTransport) -> FolderNavigator {
        let mut nav = FolderNavigator::new();
        for name in path {
            nav.descend(transport, name).await.unwrap();
        }
        transport.calls.clear();
        nav
    }

    #[test]
    fn test_starts_at_root() {
        let nav = FolderNavigator::new();
        assert_eq!(nav.path(), "/");
        assert_eq!(nav.depth(), 0);
        assert!(nav.is_root());
    }

    #[tokio::test]
    async fn test_descend_then_ascend() {
        let mut transport = MockTransport::new();
        let mut nav = FolderNavigator::new();

        assert_eq!(
            nav.descend(&mut transport, "telecom").await.unwrap(),
            Navigation::Changed
        );
        assert_eq!(nav.path(), "/telecom");

        nav.descend(&mut transport, "msg").await.unwrap();
        assert_eq!(nav.path(), "/telecom/msg");

        nav.ascend_to_parent(&mut transport).await.unwrap();
        assert_eq!(nav.path(), "/telecom");
        nav.ascend_to_parent(&mut transport).await.unwrap();
        assert_eq!(nav.path(), "/");

        assert_eq!(
            transport.calls,
            vec![
                Call::SetPath { name: Some("telecom".into()), to_parent: false },
                Call::SetPath { name: Some("msg".into()), to_parent: false },
                Call::SetPath { name: None, to_parent: true },
                Call::SetPath { name: None, to_parent: true },
            ]
        );
    }

    #[tokio::test]
    async fn test_descend_rejects_bad_names() {
        let mut transport = MockTransport::new();
        let mut nav = FolderNavigator::new();

        assert!(matches!(
            nav.descend(&mut transport, "").await,
            Err(NavigationError::InvalidName(_))
        ));
        assert!(matches!(
            nav.descend(&mut transport, "a/b").await,
            Err(NavigationError::InvalidName(_))
        ));
        assert!(matches!(
            nav.descend(&mut transport, "..").await,
            Err(NavigationError::InvalidName(_))
        ));
        assert!(transport.calls.is_empty());
    }

    #[tokio::test]
    async fn test_descend_failure_keeps_path() {
        let mut transport = MockTransport::new().fail_set_path_at(0, ResponseCode::NotFound);
        let mut nav = FolderNavigator::new();

        let err = nav.descend(&mut transport, "missing").await.unwrap_err();
        match err {
            NavigationError::Transport { path, source } => {
                assert_eq!(path, "/");
                assert_eq!(source.response_code(), Some(ResponseCode::NotFound));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(nav.path(), "/");
    }

    #[tokio::test]
    async fn test_ascend_at_root_is_noop() {
        let mut transport = MockTransport::new();
        let mut nav = FolderNavigator::new();

        assert_eq!(
            nav.ascend_to_parent(&mut transport).await.unwrap(),
            Navigation::AlreadyAtRoot
        );
        assert_eq!(nav.path(), "/");
        assert!(transport.calls.is_empty());
    }

    #[tokio::test]
    async fn test_ascend_failure_keeps_path() {
        let mut transport = MockTransport::new();
        let mut nav = navigator_at(&["telecom"], &mut transport).await;
        transport.set_path_replies.push_back(Err(ResponseCode::Forbidden));

        assert!(nav.ascend_to_parent(&mut transport).await.is_err());
        assert_eq!(nav.path(), "/telecom");
    }

    #[tokio::test]
    async fn test_reset_issues_one_call_per_level() {
        let mut transport = MockTransport::new();
        let mut nav = navigator_at(&["a", "b", "c"], &mut transport).await;

        assert_eq!(
            nav.reset_to_root(&mut transport).await.unwrap(),
            Navigation::Changed
        );
        assert_eq!(nav.path(), "/");
        assert_eq!(transport.set_path_calls(), 3);
        assert!(transport
            .calls
            .iter()
            .all(|c| *c == Call::SetPath { name: None, to_parent: true }));
    }

    #[tokio::test]
    async fn test_reset_stops_at_first_failure() {
        let mut transport = MockTransport::new();
        let mut nav = navigator_at(&["a", "b", "c"], &mut transport).await;
        transport.set_path_replies.push_back(Ok(()));
        transport
            .set_path_replies
            .push_back(Err(ResponseCode::ServiceUnavailable));

        let err = nav.reset_to_root(&mut transport).await.unwrap_err();
        assert!(matches!(err, NavigationError::Transport { ref path, .. } if path == "/a/b"));

        // First step landed, second failed, third never sent
        assert_eq!(nav.path(), "/a/b");
        assert_eq!(transport.set_path_calls(), 2);
    }

    #[tokio::test]
    async fn test_reset_at_root_is_noop() {
        let mut transport = MockTransport::new();
        let mut nav = FolderNavigator::new();

        assert_eq!(
            nav.reset_to_root(&mut transport).await.unwrap(),
            Navigation::AlreadyAtRoot
        );
        assert!(transport.calls.is_empty());
    }
}
