//! In-memory mount.
//!
//! Holds whole files in memory. Directories are implied by the paths of the
//! files beneath them, so an empty directory cannot exist. Useful for
//! overlays of generated content and for exercising namespace routing
//! without a network.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::{Error, FileReader, Mount, VfsPath};

#[derive(Debug, Clone)]
struct MemoryFile {
    data: Bytes,
    modified: Option<DateTime<Utc>>,
}

/// A read-only mount over files held in memory.
///
/// # Example
///
/// ```rust
/// use remotefs_core::{path, MemoryMount, Mount};
///
/// let mount = MemoryMount::new().with_file(path!("etc/config.prc"), "load-display gl");
///
/// assert!(mount.is_directory(&path!("etc")));
/// assert_eq!(mount.file_size(&path!("etc/config.prc")), Some(15));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryMount {
    files: BTreeMap<Vec<String>, MemoryFile>,
}

impl MemoryMount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file, builder style.
    #[must_use]
    pub fn with_file(mut self, path: VfsPath, data: impl Into<Bytes>) -> Self {
        self.insert(path, data, None);
        self
    }

    /// Add or replace a file with an explicit modification time.
    pub fn insert(
        &mut self,
        path: VfsPath,
        data: impl Into<Bytes>,
        modified: Option<DateTime<Utc>>,
    ) {
        self.files.insert(
            path.components().to_vec(),
            MemoryFile {
                data: data.into(),
                modified,
            },
        );
    }

    /// Remove a file, returning its contents if it was present.
    pub fn remove(&mut self, path: &VfsPath) -> Option<Bytes> {
        self.files.remove(path.components()).map(|f| f.data)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn file(&self, path: &VfsPath) -> Option<&MemoryFile> {
        if path.has_trailing_separator() {
            return None;
        }
        self.files.get(path.components())
    }

    /// Keys strictly below `path`, in order.
    fn descendants<'a>(&'a self, path: &'a VfsPath) -> impl Iterator<Item = &'a Vec<String>> {
        let prefix = path.components();
        self.files
            .range(prefix.to_vec()..)
            .map(|(key, _)| key)
            .take_while(move |key| key.starts_with(prefix))
            .filter(move |key| key.len() > prefix.len())
    }
}

impl Mount for MemoryMount {
    fn has_file(&self, path: &VfsPath) -> bool {
        self.is_regular_file(path) || self.is_directory(path)
    }

    fn is_directory(&self, path: &VfsPath) -> bool {
        path.is_root() || self.descendants(path).next().is_some()
    }

    fn is_regular_file(&self, path: &VfsPath) -> bool {
        self.file(path).is_some()
    }

    fn file_size(&self, path: &VfsPath) -> Option<u64> {
        self.file(path).map(|f| f.data.len() as u64)
    }

    fn timestamp(&self, path: &VfsPath) -> Option<DateTime<Utc>> {
        self.file(path).and_then(|f| f.modified)
    }

    /// An offset past the end of the file is a [`Error::Protocol`] error;
    /// an offset equal to its length gives an empty stream.
    fn open_read_file_at(
        &self,
        path: &VfsPath,
        offset: u64,
    ) -> Result<Option<FileReader>, Error> {
        let Some(file) = self.file(path) else {
            return Ok(None);
        };
        let len = file.data.len() as u64;
        if offset > len {
            return Err(Error::Protocol {
                message: format!("offset {} is past the end of '{}' ({} bytes)", offset, path, len),
            });
        }
        let data = file.data.slice(offset as usize..);
        Ok(Some(Box::new(Cursor::new(data)) as FileReader))
    }

    fn scan_directory(&self, path: &VfsPath) -> Option<Vec<String>> {
        if !self.is_directory(path) {
            return None;
        }
        let depth = path.len();
        let names: BTreeSet<&str> = self
            .descendants(path)
            .map(|key| key[depth].as_str())
            .collect();
        Some(names.into_iter().map(str::to_string).collect())
    }
}
