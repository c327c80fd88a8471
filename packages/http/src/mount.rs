//! A read-only mount of the resource tree beneath an HTTP URL.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use remotefs_core::{Error as MountError, FileReader, Mount, VfsPath};
use url::Url;

use crate::file::RemoteFile;
use crate::pool::ChannelPool;
use crate::stream::RangeReader;
use crate::transport::{ReqwestTransport, Transport};
use crate::Error;

/// Exposes files beneath a root URL through the [`Mount`] queries.
///
/// Each query builds a fresh [`RemoteFile`], so nothing is cached between
/// calls; chain operations through [`HttpMount::file`] to share one probe.
/// All handles share the mount's [`ChannelPool`].
///
/// # Example
///
/// ```ignore
/// use remotefs_core::{path, Mount};
/// use remotefs_http::HttpMount;
///
/// let mount = HttpMount::new("http://example.test/assets")?;
/// assert_eq!(mount.root().as_str(), "http://example.test/assets/");
///
/// if let Some(size) = mount.file_size(&path!("model.bin")) {
///     let reader = mount.file(&path!("model.bin")).open_read(size / 2)?;
/// }
/// ```
pub struct HttpMount {
    root: Url,
    pool: Arc<ChannelPool>,
}

impl HttpMount {
    /// Mount `root` using reqwest with default options.
    pub fn new(root: &str) -> Result<Self, Error> {
        Self::with_transport(root, Arc::new(ReqwestTransport::with_default_options()))
    }

    /// Mount `root` using the given transport.
    ///
    /// The root must be an `http` or `https` URL with a host. A trailing `/`
    /// is added to its path if missing, and any query or fragment dropped.
    pub fn with_transport(root: &str, transport: Arc<dyn Transport>) -> Result<Self, Error> {
        let root = normalize_root(root)?;
        let pool = Arc::new(ChannelPool::new(root.clone(), transport));
        Ok(Self { root, pool })
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    pub fn pool(&self) -> &ChannelPool {
        &self.pool
    }

    /// The full URL for a mount-relative path.
    pub fn url_for(&self, path: &VfsPath) -> Url {
        let mut url = self.root.clone();
        if path.is_root() {
            return url;
        }
        // normalize_root only accepts URLs that can be a base.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path.components());
            if path.has_trailing_separator() {
                segments.push("");
            }
        }
        url
    }

    /// Make a handle for `path`. No network activity happens until the
    /// handle is queried.
    pub fn file(&self, path: &VfsPath) -> RemoteFile {
        RemoteFile::new(Arc::clone(&self.pool), path.clone(), self.url_for(path))
    }

    /// Open `path` for reading from its first byte, typed.
    pub fn open(&self, path: &VfsPath) -> Result<Option<RangeReader>, Error> {
        self.open_at(path, 0)
    }

    /// Open `path` for reading from `offset`.
    ///
    /// Returns `Ok(None)` only when the server answers the probe with a
    /// non-success status. An unreachable server, or a file that exists but
    /// then fails to open, is an error.
    pub fn open_at(&self, path: &VfsPath, offset: u64) -> Result<Option<RangeReader>, Error> {
        let mut file = self.file(path);
        if !file.try_probe()? {
            return Ok(None);
        }
        file.open_read(offset).map(Some)
    }

    /// Drop all idle connections, e.g. after the server was restarted.
    pub fn reload(&self) {
        let dropped = self.pool.clear();
        log::debug!("Dropped {} idle channels for {}", dropped, self.root);
    }
}

fn normalize_root(root: &str) -> Result<Url, Error> {
    let mut url = Url::parse(root)?;
    let invalid = |message: &str| Error::InvalidRoot {
        url: root.to_string(),
        message: message.to_string(),
    };

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host().is_none() || url.cannot_be_a_base() {
        return Err(invalid("URL has no host"));
    }

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl fmt::Display for HttpMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

impl fmt::Debug for HttpMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMount")
            .field("root", &self.root.as_str())
            .field("pool", &self.pool)
            .finish()
    }
}

impl Mount for HttpMount {
    fn has_file(&self, path: &VfsPath) -> bool {
        self.file(path).exists()
    }

    fn is_directory(&self, path: &VfsPath) -> bool {
        self.file(path).is_directory()
    }

    fn is_regular_file(&self, path: &VfsPath) -> bool {
        self.file(path).is_regular_file()
    }

    fn file_size(&self, path: &VfsPath) -> Option<u64> {
        self.file(path).size()
    }

    fn timestamp(&self, path: &VfsPath) -> Option<DateTime<Utc>> {
        self.file(path).timestamp()
    }

    fn open_read_file_at(
        &self,
        path: &VfsPath,
        offset: u64,
    ) -> Result<Option<FileReader>, MountError> {
        Ok(self
            .open_at(path, offset)?
            .map(|reader| Box::new(reader) as FileReader))
    }

    /// HTTP has no reliable listing primitive.
    fn scan_directory(&self, _path: &VfsPath) -> Option<Vec<String>> {
        None
    }
}
