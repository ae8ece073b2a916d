// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Memoizing reads of frozen history.
//!
//! A position strictly before the current one can no longer change, because
//! stores only ever write at the current position. It stays answerable as
//! long as it is not before the cleanup boundary. `FrozenWindow` carries both
//! bounds so every cache call checks them itself.

use core::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::{KernelError, Result};
use crate::scalar::ScalarCheckpointStore;
use crate::types::amount::Amount;
use crate::types::id::Position;

/// Range of positions whose answers are immutable and still retained:
/// `cleanup_position <= p < current_position`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrozenWindow {
    pub cleanup_position: Position,
    pub current_position: Position,
}

impl FrozenWindow {
    pub fn new(cleanup_position: Position, current_position: Position) -> Self {
        Self {
            cleanup_position,
            current_position,
        }
    }

    pub fn check(&self, position: Position) -> Result<()> {
        if position >= self.current_position {
            return Err(KernelError::FuturePosition {
                requested: position,
                current: self.current_position,
            });
        }
        if position < self.cleanup_position {
            return Err(KernelError::StaleHistoryRead {
                requested: position,
                earliest: self.cleanup_position,
            });
        }
        Ok(())
    }
}

/// Value served by the cache and whether this call stored it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachedRead {
    pub value: Amount,
    pub newly_cached: bool,
}

#[derive(Clone, Debug)]
pub struct FrozenReadCache<K> {
    entries: FxHashMap<(K, Position), Amount>,
}

impl<K> Default for FrozenReadCache<K> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<K: Copy + Eq + Hash + Ord> FrozenReadCache<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `key` at `position` from the cache, computing and storing it on a miss.
    pub fn value_of_at(
        &mut self,
        source: &ScalarCheckpointStore<K>,
        key: K,
        position: Position,
        window: FrozenWindow,
    ) -> Result<CachedRead> {
        window.check(position)?;
        if let Some(value) = self.entries.get(&(key, position)) {
            return Ok(CachedRead {
                value: *value,
                newly_cached: false,
            });
        }
        let value = source.value_of_at(key, position)?;
        self.entries.insert((key, position), value);
        tracing::trace!(position, "frozen read cached");
        Ok(CachedRead {
            value,
            newly_cached: true,
        })
    }

    /// Same lookup as `value_of_at` without storing a miss.
    pub fn peek_value_at(
        &self,
        source: &ScalarCheckpointStore<K>,
        key: K,
        position: Position,
        window: FrozenWindow,
    ) -> Result<Amount> {
        window.check(position)?;
        match self.entries.get(&(key, position)) {
            Some(value) => Ok(*value),
            None => source.value_of_at(key, position),
        }
    }

    /// Evicts a cached entry that is about to leave the supported window.
    /// Returns whether an entry was present.
    pub fn delete_value_at(&mut self, key: K, position: Position, cleanup_position: Position) -> Result<bool> {
        if position >= cleanup_position {
            return Err(KernelError::TooRecent {
                requested: position,
                boundary: cleanup_position,
            });
        }
        Ok(self.entries.remove(&(key, position)).is_some())
    }

    /// Evicts up to `max_count` entries before `cleanup_position`, oldest first.
    pub fn evict_before(&mut self, cleanup_position: Position, max_count: usize) -> usize {
        let mut stale: Vec<(K, Position)> = self
            .entries
            .keys()
            .filter(|(_, p)| *p < cleanup_position)
            .copied()
            .collect();
        stale.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        stale.truncate(max_count);
        for entry in &stale {
            self.entries.remove(entry);
        }
        stale.len()
    }

    pub fn is_cached(&self, key: K, position: Position) -> bool {
        self.entries.contains_key(&(key, position))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
