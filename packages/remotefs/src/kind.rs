//! The closed set of mount kinds.

use std::fmt;
use std::sync::Arc;

use remotefs_core::{DateTime, Error, FileReader, MemoryMount, Mount, Utc, VfsPath};
use remotefs_http::{HttpMount, ReqwestTransport, TransportOptions};

use crate::config::MountConfig;

/// One mount of any supported kind.
///
/// Queries are dispatched with a `match`, so adding a kind means adding a
/// variant here and an arm to each query.
#[derive(Debug)]
pub enum MountKind {
    Http(HttpMount),
    Memory(MemoryMount),
}

impl MountKind {
    /// Build a mount from its configuration.
    pub fn from_config(config: &MountConfig) -> Result<Self, Error> {
        match config {
            MountConfig::Http {
                url,
                timeout_secs,
                user_agent,
                headers,
            } => {
                let mut options = TransportOptions {
                    user_agent: user_agent.clone(),
                    headers: headers.clone(),
                    ..TransportOptions::default()
                };
                if let Some(secs) = timeout_secs {
                    options.timeout = std::time::Duration::from_secs(*secs);
                }
                let transport = ReqwestTransport::new(options)?;
                Ok(MountKind::Http(HttpMount::with_transport(
                    url,
                    Arc::new(transport),
                )?))
            }
            MountConfig::Memory { files } => {
                let mut mount = MemoryMount::new();
                for (path, text) in files {
                    mount.insert(VfsPath::parse(path)?, text.clone(), None);
                }
                Ok(MountKind::Memory(mount))
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            MountKind::Http(_) => "http",
            MountKind::Memory(_) => "memory",
        }
    }
}

impl From<HttpMount> for MountKind {
    fn from(mount: HttpMount) -> Self {
        MountKind::Http(mount)
    }
}

impl From<MemoryMount> for MountKind {
    fn from(mount: MemoryMount) -> Self {
        MountKind::Memory(mount)
    }
}

impl fmt::Display for MountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountKind::Http(mount) => write!(f, "{}", mount),
            MountKind::Memory(mount) => write!(f, "memory ({} files)", mount.len()),
        }
    }
}

impl Mount for MountKind {
    fn has_file(&self, path: &VfsPath) -> bool {
        match self {
            MountKind::Http(m) => m.has_file(path),
            MountKind::Memory(m) => m.has_file(path),
        }
    }

    fn is_directory(&self, path: &VfsPath) -> bool {
        match self {
            MountKind::Http(m) => m.is_directory(path),
            MountKind::Memory(m) => m.is_directory(path),
        }
    }

    fn is_regular_file(&self, path: &VfsPath) -> bool {
        match self {
            MountKind::Http(m) => m.is_regular_file(path),
            MountKind::Memory(m) => m.is_regular_file(path),
        }
    }

    fn file_size(&self, path: &VfsPath) -> Option<u64> {
        match self {
            MountKind::Http(m) => m.file_size(path),
            MountKind::Memory(m) => m.file_size(path),
        }
    }

    fn timestamp(&self, path: &VfsPath) -> Option<DateTime<Utc>> {
        match self {
            MountKind::Http(m) => m.timestamp(path),
            MountKind::Memory(m) => m.timestamp(path),
        }
    }

    fn open_read_file_at(
        &self,
        path: &VfsPath,
        offset: u64,
    ) -> Result<Option<FileReader>, Error> {
        match self {
            MountKind::Http(m) => m.open_read_file_at(path, offset),
            MountKind::Memory(m) => m.open_read_file_at(path, offset),
        }
    }

    fn scan_directory(&self, path: &VfsPath) -> Option<Vec<String>> {
        match self {
            MountKind::Http(m) => m.scan_directory(path),
            MountKind::Memory(m) => m.scan_directory(path),
        }
    }
}
