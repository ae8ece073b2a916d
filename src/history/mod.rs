// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Prunable, position-ordered checkpoint history.
//!
//! A `History` is the sequence of checkpoints recorded for one owner or key.
//! Checkpoint positions strictly increase. Writes at the position of the
//! newest checkpoint mutate it in place; writes at a later position append.
//! Pruning removes checkpoints from the front and advances `start_index`,
//! which keeps logical indices stable across cleanups.

pub mod index;

use std::collections::VecDeque;

use crate::error::{KernelError, Result};
use crate::types::id::Position;

/// A recorded snapshot tagged with the position it became effective at.
pub trait Checkpoint: Clone {
    fn position(&self) -> Position;
}

/// How a write landed in a history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Nothing was stored (zero write into an empty history).
    Skipped,
    /// The newest checkpoint was mutated in place.
    Coalesced,
    /// A new checkpoint was appended.
    Appended,
}

#[derive(Clone, Debug)]
pub struct History<C: Checkpoint> {
    checkpoints: VecDeque<C>,
    start_index: u64,
}

impl<C: Checkpoint> Default for History<C> {
    fn default() -> Self {
        Self {
            checkpoints: VecDeque::new(),
            start_index: 0,
        }
    }
}

impl<C: Checkpoint> History<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical index of the oldest retained checkpoint.
    pub fn start_index(&self) -> u64 {
        self.start_index
    }

    /// Logical length: pruned plus retained checkpoints.
    pub fn len(&self) -> u64 {
        self.start_index + self.checkpoints.len() as u64
    }

    /// Number of checkpoints still held in memory.
    pub fn retained(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn latest(&self) -> Option<&C> {
        self.checkpoints.back()
    }

    pub fn earliest(&self) -> Option<&C> {
        self.checkpoints.front()
    }

    /// Checkpoint at logical index `index`, if still retained.
    pub fn get(&self, index: u64) -> Option<&C> {
        let offset = index.checked_sub(self.start_index)?;
        self.checkpoints.get(usize::try_from(offset).ok()?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &C> {
        self.checkpoints.iter()
    }

    /// Checkpoint in effect at `position`.
    pub fn at(&self, position: Position) -> Result<Option<&C>> {
        Ok(index::find_latest_at_or_before(self, position)?.and_then(|i| self.get(i)))
    }

    /// Rejects a write at `now` if the newest checkpoint is later.
    pub fn check_monotonic(&self, now: Position) -> Result<()> {
        match self.latest() {
            Some(last) if now < last.position() => {
                tracing::warn!(latest = last.position(), requested = now, "host clock regression");
                Err(KernelError::NonMonotonicPosition {
                    latest: last.position(),
                    requested: now,
                })
            }
            _ => Ok(()),
        }
    }

    /// Number of retained checkpoints whose position is `<= position`.
    pub(crate) fn partition_point(&self, position: Position) -> usize {
        self.checkpoints.partition_point(|c| c.position() <= position)
    }

    /// Newest checkpoint if it was written at exactly `now`.
    pub(crate) fn latest_at_mut(&mut self, now: Position) -> Option<&mut C> {
        self.checkpoints.back_mut().filter(|c| c.position() == now)
    }

    pub(crate) fn push(&mut self, checkpoint: C) {
        debug_assert!(self
            .latest()
            .map_or(true, |last| last.position() < checkpoint.position()));
        self.checkpoints.push_back(checkpoint);
    }

    /// Deletes up to `max_count` of the oldest checkpoints that are fully
    /// superseded at `boundary`. The checkpoint in effect at `boundary` and
    /// the newest checkpoint are always kept. Returns the number deleted.
    pub fn cleanup(&mut self, max_count: usize, boundary: Position) -> usize {
        if boundary == 0 || self.checkpoints.is_empty() {
            return 0;
        }
        let mut deleted = 0;
        while deleted < max_count && self.checkpoints.len() > 1 {
            // The front stays while its successor is not yet in effect at `boundary`.
            if self.checkpoints[1].position() > boundary {
                break;
            }
            self.checkpoints.pop_front();
            deleted += 1;
        }
        self.start_index += deleted as u64;
        deleted
    }
}
