#[cfg(test)]
// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod index_tests;
pub mod delegation_tests;
pub mod determinism_tests;

use crate::types::{Address, Amount};

pub(crate) fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

pub(crate) fn amt(v: u64) -> Amount {
    Amount::from(v)
}

/// Routes kernel logs to the test harness output.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
