// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Binary search over checkpoint positions.

use crate::error::{KernelError, Result};
use crate::history::{Checkpoint, History};
use crate::types::id::Position;

/// Logical index of the checkpoint with the greatest position `<= position`.
///
/// - Empty history: `None`.
/// - At or after the newest checkpoint: the newest index, without searching.
/// - Before the first retained checkpoint: `None` if nothing was ever pruned,
///   `StaleHistoryRead` otherwise since the answer has been erased.
pub fn find_latest_at_or_before<C: Checkpoint>(
    history: &History<C>,
    position: Position,
) -> Result<Option<u64>> {
    let (first, last) = match (history.earliest(), history.latest()) {
        (Some(first), Some(last)) => (first.position(), last.position()),
        _ => return Ok(None),
    };

    if position >= last {
        return Ok(Some(history.len() - 1));
    }

    if position < first {
        if history.start_index() == 0 {
            return Ok(None);
        }
        tracing::warn!(requested = position, earliest = first, "query targets pruned history");
        return Err(KernelError::StaleHistoryRead {
            requested: position,
            earliest: first,
        });
    }

    // first <= position, so at least one retained checkpoint qualifies.
    let qualifying = history.partition_point(position);
    Ok(Some(history.start_index() + qualifying as u64 - 1))
}
