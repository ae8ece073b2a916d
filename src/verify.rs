//! Deterministic Hashing and Verification.

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use core::hash::Hash;

use crate::history::Checkpoint;
use crate::scalar::ScalarCheckpointStore;
use crate::slots::BoundedSlotStore;
use crate::state::kernel::{Supply, VotePowerKernel};
use crate::types::amount::Amount;

/// Computes the cryptographic hash of the kernel state.
///
/// **Scope**: position, cleanup boundary, command count and every retained
/// checkpoint of every history, visited in sorted key order.
///
/// It explicitly **EXCLUDES**:
/// - The frozen read cache (a pure memo of retained history)
/// - Undrained observations
/// - Slot order inside a checkpoint (slots are hashed sorted by key)
pub fn kernel_state_hash(state: &VotePowerKernel) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();

    hasher.update(&state.version.to_le_bytes());
    hasher.update(&state.position.to_le_bytes());
    hasher.update(&state.cleanup_position.to_le_bytes());

    hasher.update(b"balances");
    hash_scalar_store(&mut hasher, &state.balances, |h, k| {
        h.update(&k.0);
    });

    hasher.update(b"supply");
    hash_scalar_store(&mut hasher, &state.supply, |h, k| {
        h.update(&[match k {
            Supply::Tokens => 0,
            Supply::Stakes => 1,
        }]);
    });

    hasher.update(b"stakes");
    hash_slot_store(&mut hasher, &state.stakes);

    hasher.update(b"delegates");
    hash_slot_store(&mut hasher, state.delegation.delegate_store());

    hasher.update(b"received");
    hash_scalar_store(&mut hasher, state.delegation.received_store(), |h, k| {
        h.update(&k.0);
    });

    *hasher.finalize().as_bytes()
}

fn hash_amount(hasher: &mut blake3::Hasher, value: &Amount) {
    for limb in value.0.iter() {
        hasher.update(&limb.to_le_bytes());
    }
}

fn hash_scalar_store<K, F>(hasher: &mut blake3::Hasher, store: &ScalarCheckpointStore<K>, key_bytes: F)
where
    K: Copy + Eq + Hash + Ord,
    F: Fn(&mut blake3::Hasher, &K),
{
    for key in store.keys() {
        let Some(history) = store.history(key) else { continue };
        key_bytes(hasher, &key);
        hasher.update(&history.start_index().to_le_bytes());
        hasher.update(&(history.retained() as u64).to_le_bytes());
        for checkpoint in history.iter() {
            hasher.update(&checkpoint.position().to_le_bytes());
            hash_amount(hasher, &checkpoint.value());
        }
    }
}

fn hash_slot_store<const MAX_SLOTS: usize>(hasher: &mut blake3::Hasher, store: &BoundedSlotStore<MAX_SLOTS>) {
    for owner in store.owners() {
        let Some(history) = store.history(owner) else { continue };
        hasher.update(&owner.0);
        hasher.update(&history.start_index().to_le_bytes());
        hasher.update(&(history.retained() as u64).to_le_bytes());
        for checkpoint in history.iter() {
            hasher.update(&checkpoint.position().to_le_bytes());
            let mut slots = checkpoint.slots().to_vec();
            slots.sort_by_key(|s| s.key);
            hasher.update(&[slots.len() as u8]);
            for slot in &slots {
                hasher.update(&slot.key.0);
                hash_amount(hasher, &slot.value);
            }
        }
    }
}

/// Hash of a raw command log.
pub fn log_hash(log_bytes: &[u8]) -> [u8; 32] {
    blake3::hash(log_bytes).into()
}

/// Renders a hash as lowercase hex.
pub fn hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}

