//! Blocking HTTP implementation of the remote-fetch collaborator.
//!
//! Every request is bounded by the agent's timeouts; a timeout is reported
//! as a plain [`WorkspaceError::Network`] failure like any other transport
//! error, so batch imports treat it as one more skippable entry.
//!
//! Directory listing speaks the GitHub contents API shape: a JSON array of
//! `{name, type, path, download_url}` objects.

use std::io::Read;
use std::time::Duration;

use crate::error::WorkspaceError;
use crate::transfer::{RemoteEntry, RemoteEntryKind, RemoteSource};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("pagepad/", env!("CARGO_PKG_VERSION"));

/// Cap on fetched resource size; the workspace is an in-memory editor, not
/// a download manager.
const MAX_FETCH_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug)]
pub struct HttpRemoteSource {
    agent: ureq::Agent,
    api_base: String,
}

impl HttpRemoteSource {
    /// A source with 10s connect / 30s overall request timeouts.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10).min(timeout))
            .timeout(timeout)
            .build();
        HttpRemoteSource {
            agent,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point the listing API somewhere else (tests, self-hosted mirrors).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn get(&self, url: &str) -> Result<ureq::Response, WorkspaceError> {
        self.agent
            .get(url)
            .set("User-Agent", USER_AGENT)
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(code, _) => {
                    WorkspaceError::Network(format!("{url}: HTTP {code}"))
                }
                ureq::Error::Transport(transport) => {
                    WorkspaceError::Network(format!("{url}: {transport}"))
                }
            })
    }
}

impl Default for HttpRemoteSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteSource for HttpRemoteSource {
    fn fetch_text(&self, url: &str) -> Result<String, WorkspaceError> {
        self.fetch_bytes(url).and_then(|bytes| {
            String::from_utf8(bytes)
                .map_err(|_| WorkspaceError::Network(format!("{url}: response is not UTF-8")))
        })
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, WorkspaceError> {
        let response = self.get(url)?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_FETCH_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|e| WorkspaceError::Network(format!("{url}: {e}")))?;
        Ok(bytes)
    }

    fn list_directory(
        &self,
        reference: &str,
        path: &str,
    ) -> Result<Vec<RemoteEntry>, WorkspaceError> {
        let url = format!(
            "{}/repos/{}/contents/{}",
            self.api_base,
            reference.trim_matches('/'),
            path.trim_start_matches('/')
        );
        let body = self.fetch_text(&url)?;
        let listing: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| WorkspaceError::Network(format!("{url}: invalid listing: {e}")))?;
        let Some(items) = listing.as_array() else {
            return Err(WorkspaceError::Network(format!(
                "{url}: expected a directory listing"
            )));
        };
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let name = item["name"].as_str().unwrap_or_default().to_string();
            if name.is_empty() {
                continue;
            }
            match item["type"].as_str() {
                Some("dir") => entries.push(RemoteEntry {
                    name,
                    kind: RemoteEntryKind::Directory,
                    // Repo-relative path; fed back into list_directory.
                    url: item["path"].as_str().unwrap_or_default().to_string(),
                }),
                Some("file") => {
                    let Some(download_url) = item["download_url"].as_str() else {
                        continue;
                    };
                    entries.push(RemoteEntry {
                        name,
                        kind: RemoteEntryKind::File,
                        url: download_url.to_string(),
                    });
                }
                // Submodules, symlinks: nothing we can import.
                _ => {}
            }
        }
        Ok(entries)
    }
}
