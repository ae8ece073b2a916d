// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! 256-bit token amounts.

use crate::error::{KernelError, Result};

pub use primitive_types::U256 as Amount;

pub fn checked_add(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_add(b).ok_or(KernelError::Overflow)
}

pub fn checked_sub(a: Amount, b: Amount) -> Result<Amount> {
    a.checked_sub(b).ok_or(KernelError::Underflow)
}

/// Serde adapter: four little-endian `u64` limbs, the layout `U256` uses in memory.
pub mod words {
    use super::Amount;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        value.0.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let limbs = <[u64; 4]>::deserialize(deserializer)?;
        Ok(Amount(limbs))
    }
}
