// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Bounded multi-slot checkpoint store.
//!
//! Every owner has a history whose checkpoints hold at most `MAX_SLOTS`
//! `(key, value)` pairs. A zero value means "absent" and is never stored:
//! writing zero removes the slot. Removal swaps the last slot into the hole,
//! so slot order inside a checkpoint carries no meaning.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::history::{Checkpoint, History, WriteOutcome};
use crate::types::amount::{self, Amount};
use crate::types::id::{Address, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Slot {
    pub key: Address,
    #[serde(with = "crate::types::amount::words")]
    pub value: Amount,
}

impl Slot {
    pub fn new(key: Address, value: Amount) -> Self {
        Self { key, value }
    }
}

/// Fixed-capacity slot list tagged with a position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotCheckpoint<const MAX_SLOTS: usize> {
    position: Position,
    slots: [Slot; MAX_SLOTS],
    /// Occupied prefix of `slots`.
    count: u8,
}

impl<const MAX_SLOTS: usize> Checkpoint for SlotCheckpoint<MAX_SLOTS> {
    fn position(&self) -> Position {
        self.position
    }
}

impl<const MAX_SLOTS: usize> SlotCheckpoint<MAX_SLOTS> {
    fn empty(position: Position) -> Self {
        Self {
            position,
            slots: [Slot::default(); MAX_SLOTS],
            count: 0,
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots[..self.count as usize]
    }

    pub fn value_of(&self, key: Address) -> Amount {
        self.slots()
            .iter()
            .find(|s| s.key == key)
            .map_or(Amount::zero(), |s| s.value)
    }

    /// Sum of all slot values.
    pub fn total(&self) -> Result<Amount> {
        self.slots()
            .iter()
            .try_fold(Amount::zero(), |acc, s| amount::checked_add(acc, s.value))
    }

    /// Inserts, updates or removes `key`. Fails before mutating when a new
    /// key does not fit.
    fn set(&mut self, key: Address, value: Amount) -> Result<()> {
        let count = self.count as usize;
        let found = self.slots[..count].iter().position(|s| s.key == key);
        match found {
            Some(i) if value.is_zero() => {
                let last = count - 1;
                self.slots[i] = self.slots[last];
                self.slots[last] = Slot::default();
                self.count -= 1;
            }
            Some(i) => self.slots[i].value = value,
            None if value.is_zero() => {}
            None => {
                if count >= MAX_SLOTS {
                    return Err(KernelError::CapacityExceeded { max: MAX_SLOTS });
                }
                self.slots[count] = Slot::new(key, value);
                self.count += 1;
            }
        }
        Ok(())
    }
}

/// Per-owner histories of bounded slot lists.
#[derive(Clone, Debug, Default)]
pub struct BoundedSlotStore<const MAX_SLOTS: usize> {
    histories: FxHashMap<Address, History<SlotCheckpoint<MAX_SLOTS>>>,
}

impl<const MAX_SLOTS: usize> BoundedSlotStore<MAX_SLOTS> {
    pub fn new() -> Self {
        Self {
            histories: FxHashMap::default(),
        }
    }

    /// Records `owner[key] = value` at position `now`.
    pub fn write_value(
        &mut self,
        owner: Address,
        key: Address,
        value: Amount,
        now: Position,
    ) -> Result<WriteOutcome> {
        if value.is_zero() && !self.histories.contains_key(&owner) {
            return Ok(WriteOutcome::Skipped);
        }
        let history = self.histories.entry(owner).or_default();
        history.check_monotonic(now)?;

        if let Some(last) = history.latest_at_mut(now) {
            last.set(key, value)?;
            tracing::trace!(%owner, %key, position = now, "slot checkpoint coalesced");
            return Ok(WriteOutcome::Coalesced);
        }

        let mut next = match history.latest() {
            Some(last) => last.clone(),
            None => SlotCheckpoint::empty(now),
        };
        next.position = now;
        next.set(key, value)?;
        history.push(next);
        tracing::trace!(%owner, %key, position = now, "slot checkpoint appended");
        Ok(WriteOutcome::Appended)
    }

    fn checkpoint_at(
        &self,
        owner: Address,
        position: Position,
    ) -> Result<Option<&SlotCheckpoint<MAX_SLOTS>>> {
        match self.histories.get(&owner) {
            Some(history) => history.at(position),
            None => Ok(None),
        }
    }

    fn latest(&self, owner: Address) -> Option<&SlotCheckpoint<MAX_SLOTS>> {
        self.histories.get(&owner).and_then(History::latest)
    }

    pub fn value_of_at(&self, owner: Address, key: Address, position: Position) -> Result<Amount> {
        Ok(self
            .checkpoint_at(owner, position)?
            .map_or(Amount::zero(), |c| c.value_of(key)))
    }

    pub fn value_of_at_now(&self, owner: Address, key: Address) -> Amount {
        self.latest(owner).map_or(Amount::zero(), |c| c.value_of(key))
    }

    /// Copy of the slot list in effect at `position`.
    pub fn all_entries_at(&self, owner: Address, position: Position) -> Result<Vec<Slot>> {
        Ok(self
            .checkpoint_at(owner, position)?
            .map(|c| c.slots().to_vec())
            .unwrap_or_default())
    }

    pub fn all_entries_at_now(&self, owner: Address) -> Vec<Slot> {
        self.latest(owner)
            .map(|c| c.slots().to_vec())
            .unwrap_or_default()
    }

    /// Sum of all of the owner's slot values at `position`.
    pub fn total_of_at(&self, owner: Address, position: Position) -> Result<Amount> {
        match self.checkpoint_at(owner, position)? {
            Some(c) => c.total(),
            None => Ok(Amount::zero()),
        }
    }

    pub fn total_of_at_now(&self, owner: Address) -> Result<Amount> {
        match self.latest(owner) {
            Some(c) => c.total(),
            None => Ok(Amount::zero()),
        }
    }

    pub fn batch_value_of_at(
        &self,
        owners: &[Address],
        key: Address,
        position: Position,
    ) -> Result<Vec<Amount>> {
        owners
            .iter()
            .map(|owner| self.value_of_at(*owner, key, position))
            .collect()
    }

    /// Prunes the owner's history. See `History::cleanup`.
    pub fn cleanup_old_checkpoints(&mut self, owner: Address, max_count: usize, boundary: Position) -> usize {
        self.histories
            .get_mut(&owner)
            .map_or(0, |h| h.cleanup(max_count, boundary))
    }

    pub fn history(&self, owner: Address) -> Option<&History<SlotCheckpoint<MAX_SLOTS>>> {
        self.histories.get(&owner)
    }

    /// All owners with a history, sorted.
    pub fn owners(&self) -> Vec<Address> {
        let mut owners: Vec<Address> = self.histories.keys().copied().collect();
        owners.sort();
        owners
    }
}
