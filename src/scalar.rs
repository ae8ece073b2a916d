// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Single-value checkpoint store.

use core::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::history::{Checkpoint, History, WriteOutcome};
use crate::types::amount::{self, Amount};
use crate::types::id::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalarCheckpoint {
    position: Position,
    value: Amount,
}

impl Checkpoint for ScalarCheckpoint {
    fn position(&self) -> Position {
        self.position
    }
}

impl ScalarCheckpoint {
    pub fn value(&self) -> Amount {
        self.value
    }
}

/// Result of `change_value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueChange {
    pub old: Amount,
    pub new: Amount,
}

/// Per-key histories of one `U256` value.
#[derive(Clone, Debug)]
pub struct ScalarCheckpointStore<K> {
    histories: FxHashMap<K, History<ScalarCheckpoint>>,
}

impl<K> Default for ScalarCheckpointStore<K> {
    fn default() -> Self {
        Self {
            histories: FxHashMap::default(),
        }
    }
}

impl<K: Copy + Eq + Hash + Ord> ScalarCheckpointStore<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` for `key` at position `now`.
    pub fn write_value(&mut self, key: K, value: Amount, now: Position) -> Result<WriteOutcome> {
        if value.is_zero() && !self.histories.contains_key(&key) {
            return Ok(WriteOutcome::Skipped);
        }
        let history = self.histories.entry(key).or_default();
        history.check_monotonic(now)?;

        if let Some(last) = history.latest_at_mut(now) {
            last.value = value;
            return Ok(WriteOutcome::Coalesced);
        }
        history.push(ScalarCheckpoint { position: now, value });
        Ok(WriteOutcome::Appended)
    }

    /// `new = old + add - sub`, recorded at `now`. Nothing is written on failure.
    pub fn change_value(&mut self, key: K, add: Amount, sub: Amount, now: Position) -> Result<ValueChange> {
        let old = self.value_of_at_now(key);
        if let Some(history) = self.histories.get(&key) {
            history.check_monotonic(now)?;
        }
        let new = amount::checked_sub(amount::checked_add(old, add)?, sub)?;
        self.write_value(key, new, now)?;
        Ok(ValueChange { old, new })
    }

    pub fn add_value(&mut self, key: K, delta: Amount, now: Position) -> Result<ValueChange> {
        self.change_value(key, delta, Amount::zero(), now)
    }

    pub fn sub_value(&mut self, key: K, delta: Amount, now: Position) -> Result<ValueChange> {
        self.change_value(key, Amount::zero(), delta, now)
    }

    pub fn value_of_at(&self, key: K, position: Position) -> Result<Amount> {
        match self.histories.get(&key) {
            Some(history) => Ok(history.at(position)?.map_or(Amount::zero(), |c| c.value)),
            None => Ok(Amount::zero()),
        }
    }

    pub fn value_of_at_now(&self, key: K) -> Amount {
        self.histories
            .get(&key)
            .and_then(History::latest)
            .map_or(Amount::zero(), |c| c.value)
    }

    pub fn batch_value_of_at(&self, keys: &[K], position: Position) -> Result<Vec<Amount>> {
        keys.iter().map(|k| self.value_of_at(*k, position)).collect()
    }

    /// Prunes the key's history. See `History::cleanup`.
    pub fn cleanup_old_checkpoints(&mut self, key: K, max_count: usize, boundary: Position) -> usize {
        self.histories
            .get_mut(&key)
            .map_or(0, |h| h.cleanup(max_count, boundary))
    }

    pub fn history(&self, key: K) -> Option<&History<ScalarCheckpoint>> {
        self.histories.get(&key)
    }

    /// All keys with a history, sorted.
    pub fn keys(&self) -> Vec<K> {
        let mut keys: Vec<K> = self.histories.keys().copied().collect();
        keys.sort();
        keys
    }
}
