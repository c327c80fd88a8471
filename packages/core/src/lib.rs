//! Core types for read-only virtual filesystem mounts.
//!
//! - `VfsPath`: mount-relative path that can never climb above its root
//! - `Mount`: the per-path query contract every mount kind answers
//! - `MemoryMount`: a mount over files held in memory
//! - `Error`: the failure taxonomy shared by all mount kinds
//!
//! Network-backed mounts live in `remotefs-http`; the `remotefs` package ties
//! mount kinds together behind a prefix-routed table.
//!
//! # Example
//!
//! ```rust
//! use remotefs_core::{path, MemoryMount, Mount};
//!
//! fn size_of(mount: &dyn Mount) -> Option<u64> {
//!     mount.file_size(&path!("models/tree.bam"))
//! }
//!
//! let mount = MemoryMount::new().with_file(path!("models/tree.bam"), vec![0u8; 64]);
//! assert_eq!(size_of(&mount), Some(64));
//! ```

pub use bytes::Bytes;
pub use chrono::{DateTime, Utc};

mod error;
mod memory;
mod mount;
mod path;

pub use error::Error;
pub use memory::MemoryMount;
pub use mount::{FileReader, Mount};
pub use path::{PathError, VfsPath};
