//! MountTable: route path queries to mounts by prefix.
//!
//! The deepest mounted prefix that matches a path handles it, seeing only the
//! remainder of the path. There is no fallthrough: if that mount says a file
//! is absent, shallower mounts are not asked.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use remotefs_core::{DateTime, Error, FileReader, Mount, Utc, VfsPath};

use crate::kind::MountKind;

struct MountPoint {
    prefix: VfsPath,
    mount: Arc<MountKind>,
}

/// Where a path landed.
struct Route {
    /// Owning mount and the path relative to it.
    target: Option<(Arc<MountKind>, VfsPath)>,
    /// Names of mount prefixes directly below the path.
    children: BTreeSet<String>,
    /// The path is the table root or lies above some mount prefix.
    implied_directory: bool,
}

impl Route {
    fn forward<T>(&self, query: impl FnOnce(&MountKind, &VfsPath) -> T) -> Option<T> {
        self.target
            .as_ref()
            .map(|(mount, relative)| query(mount, relative))
    }
}

/// A namespace assembled from mounts at path prefixes.
///
/// Every query takes a textual path. A path that fails to parse (for
/// instance one climbing out with `..`) never reaches a mount.
///
/// Mount points are held behind a lock that is released before any mount is
/// queried, so slow network probes on one thread do not block mounting or
/// queries on others.
///
/// # Example
///
/// ```rust
/// use remotefs::{MemoryMount, MountTable};
/// use remotefs_core::path;
///
/// let table = MountTable::new();
/// table
///     .mount("etc", MemoryMount::new().with_file(path!("config.prc"), "fullscreen #f"))
///     .unwrap();
///
/// assert!(table.is_regular_file("etc/config.prc"));
/// assert_eq!(table.file_size("/etc/config.prc"), Some(13));
/// assert!(!table.has_file("../etc/config.prc"));
/// ```
#[derive(Default)]
pub struct MountTable {
    mounts: RwLock<Vec<MountPoint>>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_mounts(&self) -> RwLockReadGuard<'_, Vec<MountPoint>> {
        self.mounts.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_mounts(&self) -> RwLockWriteGuard<'_, Vec<MountPoint>> {
        self.mounts.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Mount at `prefix`, replacing any mount already at exactly that prefix.
    ///
    /// Returns the replaced mount, if any. Mounts already nested below
    /// `prefix` are kept and continue to shadow it.
    pub fn mount(
        &self,
        prefix: &str,
        mount: impl Into<MountKind>,
    ) -> Result<Option<Arc<MountKind>>, Error> {
        let prefix = VfsPath::parse(prefix)?.without_trailing_separator();
        let mount = Arc::new(mount.into());
        log::debug!("Mounting {} at '{}'", mount, prefix);

        let mut mounts = self.write_mounts();
        if let Some(existing) = mounts.iter_mut().find(|m| m.prefix == prefix) {
            return Ok(Some(std::mem::replace(&mut existing.mount, mount)));
        }
        mounts.push(MountPoint { prefix, mount });
        Ok(None)
    }

    /// Remove the mount at exactly `prefix`.
    pub fn unmount(&self, prefix: &str) -> Option<Arc<MountKind>> {
        let prefix = VfsPath::parse(prefix).ok()?.without_trailing_separator();
        let mut mounts = self.write_mounts();
        let index = mounts.iter().position(|m| m.prefix == prefix)?;
        let removed = mounts.remove(index);
        log::debug!("Unmounted {} from '{}'", removed.mount, prefix);
        Some(removed.mount)
    }

    /// Mount prefixes with a description of each mount, in mount order.
    pub fn mounts(&self) -> Vec<(String, String)> {
        self.read_mounts()
            .iter()
            .map(|m| (m.prefix.to_string(), m.mount.to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read_mounts().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_mounts().is_empty()
    }

    /// The mount owning `path` and the path relative to it.
    pub fn resolve(&self, path: &str) -> Option<(Arc<MountKind>, VfsPath)> {
        let path = VfsPath::parse(path).ok()?;
        self.route(&path).target
    }

    fn route(&self, path: &VfsPath) -> Route {
        let mounts = self.read_mounts();

        let mut best: Option<&MountPoint> = None;
        let mut children = BTreeSet::new();
        for point in mounts.iter() {
            if path.has_prefix(&point.prefix) {
                if best.map_or(true, |b| point.prefix.len() > b.prefix.len()) {
                    best = Some(point);
                }
            } else if point.prefix.has_prefix(path) {
                children.insert(point.prefix.components()[path.len()].clone());
            }
        }

        let target = best.and_then(|point| {
            path.strip_prefix(&point.prefix)
                .map(|relative| (Arc::clone(&point.mount), relative))
        });
        Route {
            target,
            implied_directory: path.is_root() || !children.is_empty(),
            children,
        }
    }

    /// Parse and route, treating an invalid path as unroutable.
    fn route_str(&self, path: &str) -> Option<Route> {
        match VfsPath::parse(path) {
            Ok(path) => Some(self.route(&path)),
            Err(e) => {
                log::debug!("Rejected path '{}': {}", path, e);
                None
            }
        }
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.route_str(path).map_or(false, |route| {
            route.implied_directory || route.forward(|m, p| m.has_file(p)).unwrap_or(false)
        })
    }

    pub fn is_directory(&self, path: &str) -> bool {
        self.route_str(path).map_or(false, |route| {
            route.implied_directory || route.forward(|m, p| m.is_directory(p)).unwrap_or(false)
        })
    }

    pub fn is_regular_file(&self, path: &str) -> bool {
        self.route_str(path)
            .filter(|route| !route.implied_directory)
            .and_then(|route| route.forward(|m, p| m.is_regular_file(p)))
            .unwrap_or(false)
    }

    pub fn file_size(&self, path: &str) -> Option<u64> {
        self.route_str(path)
            .filter(|route| !route.implied_directory)
            .and_then(|route| route.forward(|m, p| m.file_size(p)))
            .flatten()
    }

    pub fn timestamp(&self, path: &str) -> Option<DateTime<Utc>> {
        self.route_str(path)
            .filter(|route| !route.implied_directory)
            .and_then(|route| route.forward(|m, p| m.timestamp(p)))
            .flatten()
    }

    /// Open a file for reading from its first byte.
    ///
    /// Unlike the other queries, an invalid path is reported as
    /// [`Error::InvalidPath`] rather than as absence.
    pub fn open_read_file(&self, path: &str) -> Result<Option<FileReader>, Error> {
        self.open_read_file_at(path, 0)
    }

    /// Open a file for reading, starting `offset` bytes in.
    pub fn open_read_file_at(
        &self,
        path: &str,
        offset: u64,
    ) -> Result<Option<FileReader>, Error> {
        let route = self.route(&VfsPath::parse(path)?);
        if route.implied_directory {
            return Ok(None);
        }
        route
            .forward(|m, p| m.open_read_file_at(p, offset))
            .unwrap_or(Ok(None))
    }

    /// Names directly inside a directory, including mount prefixes below it.
    pub fn scan_directory(&self, path: &str) -> Option<Vec<String>> {
        let route = self.route_str(path)?;
        let listed = route.forward(|m, p| m.scan_directory(p)).flatten();
        if !route.implied_directory {
            return listed;
        }
        let mut names = route.children;
        names.extend(listed.into_iter().flatten());
        Some(names.into_iter().collect())
    }
}

impl std::fmt::Debug for MountTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.mounts()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use remotefs_core::{path, MemoryMount};
    use std::io::Read;

    fn table() -> MountTable {
        let table = MountTable::new();
        table
            .mount(
                "assets",
                MemoryMount::new()
                    .with_file(path!("models/tree.bam"), vec![1u8; 64])
                    .with_file(path!("readme.txt"), "assets"),
            )
            .unwrap();
        table
            .mount(
                "assets/textures",
                MemoryMount::new().with_file(path!("bark.png"), vec![2u8; 16]),
            )
            .unwrap();
        table
    }

    #[test]
    fn routes_to_deepest_prefix() {
        let table = table();

        assert!(table.is_regular_file("assets/models/tree.bam"));
        assert_eq!(table.file_size("assets/models/tree.bam"), Some(64));
        assert_eq!(table.file_size("assets/textures/bark.png"), Some(16));

        let (mount, relative) = table.resolve("assets/textures/bark.png").unwrap();
        assert_eq!(relative, path!("bark.png"));
        assert_eq!(mount.to_string(), "memory (1 files)");
    }

    #[test]
    fn no_fallthrough_to_shallower_mount() {
        let table = table();
        table
            .mount("deep", MemoryMount::new().with_file(path!("x/a.txt"), "a"))
            .unwrap();
        table.mount("deep/x", MemoryMount::new()).unwrap();

        assert!(!table.has_file("deep/x/a.txt"));
        assert!(table.open_read_file("deep/x/a.txt").unwrap().is_none());
    }

    #[test]
    fn unmatched_paths_are_absent() {
        let table = table();
        assert!(!table.has_file("elsewhere/file.txt"));
        assert!(!table.is_directory("elsewhere"));
        assert_eq!(table.file_size("elsewhere/file.txt"), None);
        assert_eq!(table.scan_directory("elsewhere"), None);
        assert!(table.open_read_file("elsewhere/file.txt").unwrap().is_none());
        assert!(table.resolve("elsewhere").is_none());
    }

    #[test]
    fn paths_above_mounts_are_directories() {
        let table = MountTable::new();
        table.mount("games/panda/assets", MemoryMount::new()).unwrap();

        assert!(table.is_directory(""));
        assert!(table.is_directory("games"));
        assert!(table.is_directory("games/panda/"));
        assert!(table.has_file("games/panda"));
        assert!(!table.is_regular_file("games"));
        assert_eq!(table.file_size("games"), None);
        assert!(table.open_read_file("games").unwrap().is_none());
        assert_eq!(table.scan_directory("/"), Some(vec!["games".to_string()]));
        assert_eq!(table.scan_directory("games"), Some(vec!["panda".to_string()]));
    }

    #[test]
    fn scan_merges_mount_listing_with_nested_prefixes() {
        let table = table();
        assert_eq!(
            table.scan_directory("assets"),
            Some(vec![
                "models".to_string(),
                "readme.txt".to_string(),
                "textures".to_string(),
            ])
        );
        assert_eq!(
            table.scan_directory("assets/textures"),
            Some(vec!["bark.png".to_string()])
        );
        assert_eq!(table.scan_directory("assets/readme.txt"), None);
    }

    #[test]
    fn traversal_is_rejected() {
        let table = table();
        assert!(!table.has_file("assets/../assets/readme.txt"));
        assert!(!table.is_directory("../assets"));
        assert_eq!(table.file_size("assets/models/../../readme.txt"), None);
        assert_eq!(table.scan_directory(".."), None);
        assert!(matches!(
            table.open_read_file("../assets/readme.txt"),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn open_and_read_through_table() {
        let table = table();
        let mut reader = table.open_read_file("/assets/readme.txt").unwrap().unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "assets");
    }

    #[test]
    fn open_at_offset_through_table() {
        let table = table();
        let mut reader = table
            .open_read_file_at("assets/readme.txt", 2)
            .unwrap()
            .unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "sets");

        assert!(table.open_read_file_at("assets/readme.txt", 7).is_err());
        assert!(table
            .open_read_file_at("assets/none.txt", 2)
            .unwrap()
            .is_none());
    }

    #[test]
    fn timestamps_forwarded() {
        let modified = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        let mut scratch = MemoryMount::new();
        scratch.insert(path!("log.txt"), "x", Some(modified));

        let table = MountTable::new();
        table.mount("scratch", scratch).unwrap();
        assert_eq!(table.timestamp("scratch/log.txt"), Some(modified));
        assert_eq!(table.timestamp("scratch/none.txt"), None);
    }

    #[test]
    fn mount_replaces_same_prefix() {
        let table = table();
        let previous = table
            .mount("assets/textures/", MemoryMount::new())
            .unwrap()
            .unwrap();
        assert_eq!(previous.type_name(), "memory");
        assert_eq!(table.len(), 2);
        assert!(!table.has_file("assets/textures/bark.png"));
    }

    #[test]
    fn unmount_exposes_shallower_mount() {
        let table = table();
        assert!(table.unmount("assets/textures").is_some());
        assert!(table.unmount("assets/textures").is_none());
        assert!(table.unmount("../x").is_none());

        assert!(!table.has_file("assets/textures/bark.png"));
        assert!(!table.is_directory("assets/textures"));
        assert_eq!(table.mounts(), vec![("assets".to_string(), "memory (2 files)".to_string())]);
    }

    #[test]
    fn invalid_prefix_rejected() {
        let table = MountTable::new();
        assert!(matches!(
            table.mount("a/../..", MemoryMount::new()),
            Err(Error::InvalidPath(_))
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn mount_at_root() {
        let table = MountTable::new();
        table
            .mount("/", MemoryMount::new().with_file(path!("top.txt"), "t"))
            .unwrap();
        table.mount("sub", MemoryMount::new()).unwrap();

        assert!(table.is_regular_file("top.txt"));
        assert_eq!(
            table.scan_directory(""),
            Some(vec!["sub".to_string(), "top.txt".to_string()])
        );
    }

    #[test]
    fn concurrent_queries_and_mounts() {
        let table = Arc::new(table());
        let workers: Vec<_> = (0..4)
            .map(|i| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        let prefix = format!("tmp{}/{}", i, j);
                        table.mount(&prefix, MemoryMount::new()).unwrap();
                        assert!(table.is_regular_file("assets/readme.txt"));
                        assert!(table.is_directory(&prefix));
                        assert!(table.unmount(&prefix).is_some());
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(table.len(), 2);
    }
}
