// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! checkpoint-kernel: position-indexed checkpoint histories with bounded
//! multi-slot checkpoints, a frozen-read cache and a delegation overlay for
//! historical vote-power bookkeeping.

pub mod config;
pub mod error;
pub mod types;
pub mod history;
pub mod slots;
pub mod scalar;
pub mod cache;
pub mod delegation;
pub mod event;
pub mod state;
pub mod verify;
pub mod replay;

pub use config::KernelConfig;
pub use error::{KernelError, KernelResult};
pub use state::command::Command;
pub use state::kernel::{Supply, VotePowerKernel};
pub use types::{Address, Amount, Position};

#[cfg(test)]
pub mod tests;
