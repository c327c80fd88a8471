//! The capability set every mount kind provides.

use std::io::Read;

use chrono::{DateTime, Utc};

use crate::{Error, VfsPath};

/// A readable byte stream produced by [`Mount::open_read_file`].
pub type FileReader = Box<dyn Read + Send>;

/// Per-path queries a mount answers for the namespace it is registered in.
///
/// Paths are relative to the mount's own root and already validated, so
/// implementations never see `..`. The boolean and `Option` queries are
/// fail-closed: anything short of a positive answer is `false` or `None`.
///
/// # Object Safety
///
/// This trait is object-safe, but aggregators are expected to dispatch on
/// a concrete enum of mount kinds instead of `Box<dyn Mount>`.
pub trait Mount: Send + Sync {
    /// Returns true if the path names an existing file or directory.
    fn has_file(&self, path: &VfsPath) -> bool;

    /// Returns true if the path exists and is known to be a directory.
    fn is_directory(&self, path: &VfsPath) -> bool;

    /// Returns true if the path exists and is known to be a regular file.
    fn is_regular_file(&self, path: &VfsPath) -> bool;

    /// Size in bytes, if the file exists and its size can be determined.
    fn file_size(&self, path: &VfsPath) -> Option<u64>;

    /// Last-modified time, if the mount can report one. Never fabricated.
    fn timestamp(&self, path: &VfsPath) -> Option<DateTime<Utc>>;

    /// Open a file for reading, starting `offset` bytes in.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The file is confirmed not to exist.
    /// * `Ok(Some(reader))` - A stream over the file's contents from `offset`.
    /// * `Err(Error)` - The mount could not be reached, or the file exists
    ///   but could not be read from `offset`.
    fn open_read_file_at(&self, path: &VfsPath, offset: u64) -> Result<Option<FileReader>, Error>;

    /// Open a file for reading from its first byte.
    fn open_read_file(&self, path: &VfsPath) -> Result<Option<FileReader>, Error> {
        self.open_read_file_at(path, 0)
    }

    /// List the names directly inside a directory.
    ///
    /// `None` means the mount cannot enumerate this path, either because it
    /// is not a directory or because the mount kind has no listing primitive.
    fn scan_directory(&self, path: &VfsPath) -> Option<Vec<String>>;
}

