//! Effect identities.
//!
//! Every reactive effect (a user effect, a computed getter, a watcher or a
//! component's render effect) gets a unique id. Dependency sets and the job
//! queue key on this id to avoid duplicate subscriptions and duplicate jobs.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Ids are handed out in creation order, so this doubles as a
    /// creation sequence number.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}
