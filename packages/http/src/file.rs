//! Handle for one path beneath an HTTP mount.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use remotefs_core::VfsPath;
use url::Url;

use crate::pool::ChannelPool;
use crate::stream::RangeReader;
use crate::transport::MetadataResponse;
use crate::Error;

/// Where a file access is in its lifecycle.
///
/// A [`RemoteFile`] is `Unresolved` until its first metadata probe answers,
/// then `MetadataKnown`. Opening it hands the rest of the lifecycle to a
/// [`RangeReader`], which is `Reading` until it is either drained (`Closed`,
/// channel reused) or cut short (`Discarded`, channel dropped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Unresolved,
    MetadataKnown,
    Reading,
    Closed,
    Discarded,
}

/// Best-effort guess at whether a path names a directory.
///
/// HTTP has no listing primitive, so this is never authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DirectoryHint {
    #[default]
    Unknown,
    Directory,
    File,
}

/// One path's worth of metadata and read access against a mount's root.
///
/// Metadata is fetched at most once per handle and only when first asked
/// for. Handles are cheap; make a new one for each independent access.
pub struct RemoteFile {
    pool: Arc<ChannelPool>,
    path: VfsPath,
    url: Url,
    state: FileState,
    exists: bool,
    known_size: Option<u64>,
    known_timestamp: Option<DateTime<Utc>>,
    directory_hint: DirectoryHint,
}

impl RemoteFile {
    pub(crate) fn new(pool: Arc<ChannelPool>, path: VfsPath, url: Url) -> Self {
        Self {
            pool,
            path,
            url,
            state: FileState::Unresolved,
            exists: false,
            known_size: None,
            known_timestamp: None,
            directory_hint: DirectoryHint::Unknown,
        }
    }

    pub fn path(&self) -> &VfsPath {
        &self.path
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn state(&self) -> FileState {
        self.state
    }

    /// True if the resource answers a metadata probe with a success status.
    ///
    /// Transport failures and error statuses both read as `false`.
    pub fn exists(&mut self) -> bool {
        self.probe()
    }

    pub fn is_regular_file(&mut self) -> bool {
        self.probe() && self.directory_hint == DirectoryHint::File
    }

    pub fn is_directory(&mut self) -> bool {
        self.probe() && self.directory_hint == DirectoryHint::Directory
    }

    pub fn directory_hint(&mut self) -> DirectoryHint {
        self.probe();
        self.directory_hint
    }

    /// Length reported by the server, if it reported one.
    pub fn size(&mut self) -> Option<u64> {
        if self.probe() {
            self.known_size
        } else {
            None
        }
    }

    /// `Last-Modified` reported by the server, if present and parseable.
    pub fn timestamp(&mut self) -> Option<DateTime<Utc>> {
        if self.probe() {
            self.known_timestamp
        } else {
            None
        }
    }

    /// Start reading at `offset`, consuming the handle.
    ///
    /// A non-success status is an [`Error::Status`]; transport failures
    /// surface as they are. Either way the channel is discarded.
    pub fn open_read(self, offset: u64) -> Result<RangeReader, Error> {
        let mut pooled = self.pool.acquire()?;
        log::debug!(
            "Reading {} from offset {} on channel {}",
            self.url,
            offset,
            pooled.id()
        );

        let response = match pooled.channel().request_range(&self.url, offset) {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Range request for {} failed: {}", self.url, e);
                self.pool.discard(pooled);
                return Err(e);
            }
        };

        if !response.is_success() {
            let status = response.status;
            drop(response);
            self.pool.discard(pooled);
            return Err(Error::Status {
                status,
                url: self.url.to_string(),
            });
        }

        RangeReader::start(self.pool, pooled, self.url, offset, response)
    }

    /// Run the metadata probe unless an earlier one already answered.
    ///
    /// `Ok(false)` means the server answered with a non-success status.
    /// A channel or request failure is returned as an error and leaves the
    /// handle `Unresolved`.
    pub fn try_probe(&mut self) -> Result<bool, Error> {
        if self.state != FileState::Unresolved {
            return Ok(self.exists);
        }

        let mut pooled = self.pool.acquire()?;
        match pooled.channel().request_metadata(&self.url) {
            Ok(response) => {
                self.pool.release(pooled);
                self.absorb(response);
                Ok(self.exists)
            }
            Err(e) => {
                self.pool.discard(pooled);
                Err(e)
            }
        }
    }

    fn probe(&mut self) -> bool {
        match self.try_probe() {
            Ok(exists) => exists,
            Err(e) => {
                log::warn!("Probe of {} failed: {}", self.url, e);
                false
            }
        }
    }

    fn absorb(&mut self, response: MetadataResponse) {
        log::debug!("Probed {}: status {}", self.url, response.status);
        self.state = FileState::MetadataKnown;
        self.exists = response.is_success();
        if !self.exists {
            return;
        }

        self.known_size = response.content_length;
        self.known_timestamp = response
            .last_modified
            .as_deref()
            .and_then(parse_http_date);

        let redirected_to_directory = response
            .final_url
            .as_ref()
            .is_some_and(|u| u != &self.url && u.path().ends_with('/'));
        self.directory_hint = if redirected_to_directory {
            DirectoryHint::Directory
        } else if self.path.is_root() || self.path.has_trailing_separator() {
            DirectoryHint::Unknown
        } else {
            DirectoryHint::File
        };
    }
}

impl std::fmt::Debug for RemoteFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFile")
            .field("url", &self.url.as_str())
            .field("state", &self.state)
            .field("known_size", &self.known_size)
            .field("known_timestamp", &self.known_timestamp)
            .field("directory_hint", &self.directory_hint)
            .finish()
    }
}

/// Parse an HTTP-date such as `Wed, 21 Oct 2015 07:28:00 GMT`.
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc2822(value.trim()) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            log::debug!("Ignoring unparseable Last-Modified '{}': {}", value, e);
            None
        }
    }
}
