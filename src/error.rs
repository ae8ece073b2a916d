// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use thiserror::Error;

use crate::types::id::Position;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// A bounded-slot checkpoint would hold more distinct keys than it has room for.
    #[error("Checkpoint capacity exceeded: at most {max} slots")]
    CapacityExceeded { max: usize },

    /// The host clock went backwards.
    #[error("Non-monotonic position: latest checkpoint at {latest}, write at {requested}")]
    NonMonotonicPosition { latest: Position, requested: Position },

    /// Subtraction below zero.
    #[error("Arithmetic underflow")]
    Underflow,

    /// Addition above `U256::MAX`.
    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Cannot delegate to self")]
    SelfDelegation,

    #[error("Cannot transfer to self")]
    SelfTransfer,

    /// Both transfer endpoints are zero, or the zero address was given as an account.
    #[error("Zero address used where an account is required")]
    BothZero,

    /// Frozen cache asked for a position that can still change.
    #[error("Position {requested} is not in the past (current position {current})")]
    FuturePosition { requested: Position, current: Position },

    /// Cache eviction asked for a position that is still inside the supported window.
    #[error("Position {requested} is not before the cleanup boundary {boundary}")]
    TooRecent { requested: Position, boundary: Position },

    /// Query targets history that has already been pruned.
    #[error("Position {requested} precedes retained history (earliest retained {earliest})")]
    StaleHistoryRead { requested: Position, earliest: Position },

    /// Cleanup boundary moved backwards or ahead of the clock.
    #[error("Invalid cleanup boundary {requested} (previous {previous}, current position {current})")]
    InvalidBoundary { requested: Position, previous: Position, current: Position },

    /// A cross-store consistency check failed.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Invalid command log: {0}")]
    InvalidLog(&'static str),

    #[error("Command log checksum mismatch: expected {expected:#018x}, found {found:#018x}")]
    ChecksumMismatch { expected: u64, found: u64 },

    #[error("Command decode failed: {0}")]
    Decode(String),
}

impl KernelError {
    /// Errors a correctly wired host never triggers.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KernelError::NonMonotonicPosition { .. } | KernelError::StaleHistoryRead { .. }
        )
    }
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
pub type Result<T> = KernelResult<T>;
