//! # remotefs-http
//!
//! A read-only filesystem mount over HTTP.
//!
//! Files beneath a root URL are addressed by mount-relative path. Queries
//! turn into the smallest request that answers them: a `HEAD` for existence,
//! size and timestamp, and a ranged `GET` for reads. Connections are kept in
//! a per-mount pool and reused across short-lived file accesses on any
//! thread.
//!
//! ## Pieces
//!
//! - [`HttpMount`] owns the root URL and the pool and answers the
//!   [`remotefs_core::Mount`] queries.
//! - [`RemoteFile`] is a handle for one path. It probes lazily and remembers
//!   what it learned for its own lifetime.
//! - [`RangeReader`] streams a read and decides whether its connection is
//!   clean enough to go back to the pool.
//! - [`ChannelPool`] is the last-in-first-out cache of idle connections.
//! - [`Transport`] and [`Channel`] are the seam to the HTTP client;
//!   [`ReqwestTransport`] is the production implementation.
//!
//! ```ignore
//! use std::io::Read;
//! use remotefs_core::path;
//! use remotefs_http::HttpMount;
//!
//! let mount = HttpMount::new("https://cdn.example.com/assets/")?;
//!
//! let mut file = mount.file(&path!("models/tree.bam"));
//! if let Some(size) = file.size() {
//!     let mut tail = Vec::new();
//!     file.open_read(size - 16)?.read_to_end(&mut tail)?;
//! }
//! ```

pub mod error;
pub mod file;
pub mod mount;
pub mod pool;
pub mod stream;
pub mod transport;

pub use error::Error;
pub use file::{DirectoryHint, FileState, RemoteFile};
pub use mount::HttpMount;
pub use pool::{ChannelPool, PoolStats, PooledChannel};
pub use stream::RangeReader;
pub use transport::{
    Channel, MetadataResponse, RangeResponse, ReqwestTransport, Transport, TransportOptions,
};
