// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache of receiver timelines.
//!
//! Threshold queries hit the same few receivers over and over, so the
//! `(timestamp, amount)` timeline of a receiver is kept in memory and
//! window sums are answered with a binary search instead of a redb scan.
//!
//! Entries are dropped on every append to their receiver. A global
//! generation counter stops a reader that loaded a timeline before a
//! concurrent append from caching the stale copy afterwards.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::U256;
use lru::LruCache;

use crate::models::Account;

/// Amounts received by one account, ordered by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    entries: Vec<(u64, U256)>,
}

impl Timeline {
    /// Build from `(timestamp, amount)` pairs already sorted by timestamp.
    pub fn from_sorted(entries: Vec<(u64, U256)>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].0 <= w[1].0));
        Self { entries }
    }

    /// Sum of amounts at or after `since`, saturating at `U256::MAX`.
    pub fn sum_since(&self, since: u64) -> U256 {
        let start = self.entries.partition_point(|(ts, _)| *ts < since);
        self.entries[start..]
            .iter()
            .fold(U256::ZERO, |acc, (_, amount)| acc.saturating_add(*amount))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// In-process LRU cache for hot receiver timelines.
pub struct TimelineCache {
    cache: Mutex<LruCache<Account, Arc<Timeline>>>,
    generation: AtomicU64,
}

impl TimelineCache {
    /// Create a cache holding at most `capacity` receivers.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            generation: AtomicU64::new(0),
        }
    }

    /// Current generation. Read it before loading a timeline from storage.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Get the cached timeline for a receiver.
    pub fn get(&self, receiver: &Account) -> Option<Arc<Timeline>> {
        let mut cache = self.cache.lock().ok()?;
        cache.get(receiver).cloned()
    }

    /// Store a timeline loaded while `observed` was the current generation.
    ///
    /// Dropped silently if an append happened since.
    pub fn put_if_current(&self, receiver: Account, timeline: Arc<Timeline>, observed: u64) {
        if let Ok(mut cache) = self.cache.lock() {
            if self.generation.load(Ordering::Acquire) == observed {
                cache.put(receiver, timeline);
            }
        }
    }

    /// Forget the timeline of a receiver after an append.
    pub fn invalidate(&self, receiver: &Account) {
        if let Ok(mut cache) = self.cache.lock() {
            self.generation.fetch_add(1, Ordering::AcqRel);
            cache.pop(receiver);
        }
    }
}
