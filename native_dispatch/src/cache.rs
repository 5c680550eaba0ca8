// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape-keyed trampoline cache.
//!
//! Each [`ShapeKey`] owns one slot. A slot is filled at most once: the first caller for a key
//! takes the slot's guard and compiles, concurrent first callers for the same key wait on that
//! guard and then reuse the stored trampoline. Lookups of different keys only share the map's
//! read lock, and the JIT backend's mutex is held only for the compile itself.
//!
//! Lock order is slot guard, then backend. The map lock is never held across either.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};

use crate::config::JitOptions;
use crate::shape::ShapeKey;
use crate::trace::CacheOutcome;
use crate::trampoline::{self, BackendError, JitBackend, Trampoline};

/// Snapshot of cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of distinct shapes with a slot (built or in progress).
    pub shapes: usize,
    /// Number of trampolines compiled.
    pub builds: u64,
    /// Number of lookups served by an existing trampoline.
    pub hits: u64,
}

#[derive(Default)]
struct Slot {
    ready: OnceLock<Arc<Trampoline>>,
    guard: Mutex<()>,
}

/// Concurrent map from [`ShapeKey`] to its compiled [`Trampoline`].
pub struct TrampolineCache {
    backend: Arc<Mutex<JitBackend>>,
    shapes: RwLock<HashMap<ShapeKey, Arc<Slot>>>,
    builds: AtomicU64,
    hits: AtomicU64,
}

impl TrampolineCache {
    /// Creates an empty cache with a JIT backend for the host.
    pub fn new(options: &JitOptions) -> Result<Self, BackendError> {
        Ok(Self {
            backend: Arc::new(Mutex::new(JitBackend::new(options)?)),
            shapes: RwLock::new(HashMap::new()),
            builds: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        })
    }

    /// Returns the trampoline for `key`, compiling it on first use.
    ///
    /// A failed build leaves the slot empty, so a later lookup retries.
    pub fn get_or_build(
        &self,
        key: &ShapeKey,
    ) -> Result<(Arc<Trampoline>, CacheOutcome), BackendError> {
        let slot = self.slot(key);
        if let Some(t) = slot.ready.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((Arc::clone(t), CacheOutcome::Hit));
        }

        let _guard = slot.guard.lock();
        // Another first user may have finished while we waited.
        if let Some(t) = slot.ready.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((Arc::clone(t), CacheOutcome::Hit));
        }
        let built = Arc::new(trampoline::build(&self.backend, key)?);
        let stored = slot.ready.get_or_init(|| built);
        self.builds.fetch_add(1, Ordering::Relaxed);
        Ok((Arc::clone(stored), CacheOutcome::Built))
    }

    /// Returns the trampoline for `key` if it has already been built.
    #[must_use]
    pub fn get(&self, key: &ShapeKey) -> Option<Arc<Trampoline>> {
        let shapes = self.shapes.read();
        shapes.get(key)?.ready.get().cloned()
    }

    /// Number of shapes with a slot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.read().len()
    }

    /// Returns `true` if no shape has been looked up yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.read().is_empty()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            shapes: self.len(),
            builds: self.builds.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }

    fn slot(&self, key: &ShapeKey) -> Arc<Slot> {
        if let Some(slot) = self.shapes.read().get(key) {
            return Arc::clone(slot);
        }
        let mut shapes = self.shapes.write();
        Arc::clone(shapes.entry(key.clone()).or_default())
    }
}

impl fmt::Debug for TrampolineCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrampolineCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
