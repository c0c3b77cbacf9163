use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use crate::percentiles::BlockPercentiles;

/// How long a set of mempool-based estimates stays valid.
pub const CACHE_LIFE: Duration = Duration::from_secs(30);

/// A cache of recent block-percentile estimates.
///
/// Re-running block building for every query is undesirable because it
/// happens under the host's chain and mempool locks; this cache absorbs
/// repeated queries within one generation. Many readers may hit `get`
/// concurrently; `update` takes the exclusive lock and replaces the whole
/// map so no entry survives a refresh. A freshly built cache is stale.
#[derive(Debug)]
pub struct CachedEstimates {
    inner: RwLock<Inner>,
    ttl: Duration,
}

#[derive(Debug, Default)]
struct Inner {
    estimates: HashMap<u64, BlockPercentiles>,
    last_updated: Option<Instant>,
}

impl CachedEstimates {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_LIFE)
    }

    /// Cache with a custom lifetime. Production callers want [`new`];
    /// this exists so staleness is observable on a test timescale.
    ///
    /// [`new`]: Self::new
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { inner: RwLock::new(Inner::default()), ttl }
    }

    /// The cached estimate under `key`, unless the cache has gone stale.
    pub fn get(&self, key: u64) -> Option<BlockPercentiles> {
        let inner = self.inner.read();
        let fresh = inner.last_updated.is_some_and(|at| at.elapsed() <= self.ttl);
        if !fresh {
            return None;
        }
        let hit = inner.estimates.get(&key).copied();
        if hit.is_some() {
            debug!(key, "estimate cache hit");
        }
        hit
    }

    /// Replaces every cached estimate and restarts the lifetime clock.
    pub fn update(&self, estimates: HashMap<u64, BlockPercentiles>) {
        let mut inner = self.inner.write();
        inner.estimates = estimates;
        inner.last_updated = Some(Instant::now());
        debug!(entries = inner.estimates.len(), "estimate cache updated");
    }
}

impl Default for CachedEstimates {
    fn default() -> Self {
        Self::new()
    }
}
