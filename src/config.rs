// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Configuration constants.

use serde::{Deserialize, Serialize};

/// Distinct stake targets an owner may mirror at once.
pub const STAKE_SLOTS: usize = 3;

/// The delegate relation is single-valued.
pub const DELEGATE_SLOTS: usize = 1;

/// Checkpoints deleted per owner by a `Cleanup` command with no explicit budget.
pub const DEFAULT_CLEANUP_BATCH: usize = 64;

/// Command log magic bytes.
pub const LOG_MAGIC: &[u8; 4] = b"CKPL";

/// Command log format version.
pub const LOG_VERSION: u32 = 1;

/// Runtime knobs of a `VotePowerKernel`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Budget applied when a cleanup command leaves `max_count` unset.
    pub cleanup_batch: usize,
    /// Memoize total-supply reads at frozen positions.
    pub cache_total_supply: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            cleanup_batch: DEFAULT_CLEANUP_BATCH,
            cache_total_supply: true,
        }
    }
}
