//! A last-in-first-out pool of idle channels for one root endpoint.
//!
//! The idle list is the only state behind the lock, and the lock is held for
//! a push or a pop only. Connecting happens after the lock is dropped, so a
//! slow connect on one thread never stalls another thread's checkout.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use url::Url;

use crate::transport::{Channel, Transport};
use crate::Error;

/// A channel checked out of a [`ChannelPool`].
///
/// Give it back with [`ChannelPool::release`] when the last response on it
/// was read to completion, or [`ChannelPool::discard`] otherwise. Dropping
/// it without either is equivalent to discarding it.
pub struct PooledChannel {
    id: u64,
    channel: Box<dyn Channel>,
}

impl PooledChannel {
    /// Pool-assigned identity, unique for the lifetime of the pool.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn channel(&mut self) -> &mut dyn Channel {
        self.channel.as_mut()
    }
}

impl std::fmt::Debug for PooledChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledChannel").field("id", &self.id).finish()
    }
}

/// Counters describing what a pool has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Channels opened through the transport.
    pub created: u64,
    /// Successful checkouts, whether reused or freshly created.
    pub acquired: u64,
    /// Channels returned for reuse.
    pub released: u64,
    /// Channels dropped instead of returned.
    pub discarded: u64,
    /// Channels idle right now.
    pub idle: usize,
}

/// Thread-safe cache of reusable channels bound to one root URL.
///
/// No upper bound is enforced on the number of idle channels.
pub struct ChannelPool {
    root: Url,
    transport: Arc<dyn Transport>,
    idle: Mutex<Vec<PooledChannel>>,
    next_id: AtomicU64,
    acquired: AtomicU64,
    released: AtomicU64,
    discarded: AtomicU64,
}

impl ChannelPool {
    pub fn new(root: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            root,
            transport,
            idle: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    // A panic elsewhere cannot leave the Vec half-modified, so a poisoned
    // lock is still safe to use.
    fn lock_idle(&self) -> MutexGuard<'_, Vec<PooledChannel>> {
        self.idle.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Check out the most recently released channel, or open a new one.
    pub fn acquire(&self) -> Result<PooledChannel, Error> {
        let reused = self.lock_idle().pop();

        let pooled = match reused {
            Some(pooled) => {
                log::debug!("Reusing channel {} for {}", pooled.id, self.root);
                pooled
            }
            None => {
                let channel = self.transport.connect(&self.root)?;
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                log::debug!("Opened channel {} for {}", id, self.root);
                PooledChannel { id, channel }
            }
        };

        self.acquired.fetch_add(1, Ordering::Relaxed);
        Ok(pooled)
    }

    /// Return a channel whose last response was fully consumed.
    pub fn release(&self, pooled: PooledChannel) {
        self.released.fetch_add(1, Ordering::Relaxed);
        self.lock_idle().push(pooled);
    }

    /// Drop a channel that may be in an unknown state.
    pub fn discard(&self, pooled: PooledChannel) {
        log::debug!("Discarding channel {} for {}", pooled.id, self.root);
        self.discarded.fetch_add(1, Ordering::Relaxed);
        drop(pooled);
    }

    /// Drop every idle channel, returning how many there were.
    pub fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *self.lock_idle());
        drained.len()
    }

    /// Number of channels currently idle.
    pub fn idle_len(&self) -> usize {
        self.lock_idle().len()
    }

    /// Ids of the idle channels, most recently released last.
    pub fn idle_ids(&self) -> Vec<u64> {
        self.lock_idle().iter().map(|p| p.id).collect()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.next_id.load(Ordering::Relaxed),
            acquired: self.acquired.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            idle: self.idle_len(),
        }
    }
}

impl std::fmt::Debug for ChannelPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelPool")
            .field("root", &self.root.as_str())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use std::thread;

    fn pool() -> (ChannelPool, MockTransport) {
        let transport = MockTransport::new();
        let pool = ChannelPool::new(
            Url::parse("http://example.test/assets/").unwrap(),
            Arc::new(transport.clone()),
        );
        (pool, transport)
    }

    #[test]
    fn acquire_creates_on_miss() {
        let (pool, transport) = pool();
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(transport.connects(), 2);
        assert_eq!(pool.stats().created, 2);
        assert_eq!(pool.idle_len(), 0);
    }

    #[test]
    fn released_channel_is_next_acquired() {
        let (pool, transport) = pool();
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        let (a_id, b_id) = (a.id(), b.id());

        pool.release(a);
        pool.release(b);
        assert_eq!(pool.idle_ids(), vec![a_id, b_id]);

        // Last in, first out.
        assert_eq!(pool.acquire().unwrap().id(), b_id);
        assert_eq!(pool.acquire().unwrap().id(), a_id);
        assert_eq!(transport.connects(), 2);
    }

    #[test]
    fn discarded_channel_never_returns() {
        let (pool, _) = pool();
        let a = pool.acquire().unwrap();
        let a_id = a.id();
        pool.discard(a);

        assert_eq!(pool.idle_len(), 0);
        let next = pool.acquire().unwrap();
        assert_ne!(next.id(), a_id);

        let stats = pool.stats();
        assert_eq!(stats.discarded, 1);
        assert_eq!(stats.released, 0);
        assert_eq!(stats.created, 2);
    }

    #[test]
    fn stats_track_checkouts() {
        let (pool, _) = pool();
        let a = pool.acquire().unwrap();
        pool.release(a);
        let a = pool.acquire().unwrap();
        pool.release(a);

        assert_eq!(
            pool.stats(),
            PoolStats {
                created: 1,
                acquired: 2,
                released: 2,
                discarded: 0,
                idle: 1,
            }
        );
    }

    #[test]
    fn clear_drops_idle_channels() {
        let (pool, _) = pool();
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        pool.release(a);
        pool.release(b);

        assert_eq!(pool.clear(), 2);
        assert_eq!(pool.idle_len(), 0);
    }

    #[test]
    fn concurrent_checkouts_never_share_a_channel() {
        let (pool, _) = pool();
        let pool = Arc::new(pool);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    for _ in 0..50 {
                        let channel = pool.acquire().unwrap();
                        seen.push(channel.id());
                        pool.release(channel);
                    }
                    seen
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = pool.stats();
        assert_eq!(stats.acquired, 400);
        assert_eq!(stats.released, 400);
        // Every channel ever created is idle again, and each appears once.
        let mut ids = pool.idle_ids();
        assert_eq!(ids.len() as u64, stats.created);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len() as u64, stats.created);
        assert!(stats.created <= 8);
    }
}
