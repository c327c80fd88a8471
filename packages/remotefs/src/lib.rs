//! Read-only virtual filesystem namespace over HTTP and in-memory mounts.
//!
//! Mounts are registered in a [`MountTable`] at path prefixes, either
//! directly or from a JSON [`MountTableConfig`]:
//!
//! ```rust
//! use remotefs::MountTableConfig;
//!
//! let config = MountTableConfig::from_json(r#"{
//!     "mounts": [
//!         {"prefix": "assets", "type": "http", "url": "https://cdn.example.test/assets/"},
//!         {"prefix": "scratch", "type": "memory"}
//!     ]
//! }"#).unwrap();
//!
//! let table = config.build().unwrap();
//! assert!(table.is_directory("scratch"));
//! ```
//!
//! Queries against an HTTP mount block on the network. The boolean and
//! `Option` queries read both missing files and unreachable servers as
//! absence; `open_read_file` returns `Ok(None)` only for a file the server
//! says is missing and reports an unreachable server as an error.

pub mod config;
pub mod kind;
pub mod table;

pub use config::{MountConfig, MountEntry, MountTableConfig};
pub use kind::MountKind;
pub use table::MountTable;

pub use remotefs_core::{path, Error, FileReader, MemoryMount, Mount, PathError, VfsPath};
pub use remotefs_http::{HttpMount, TransportOptions};
