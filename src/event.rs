// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Observations emitted by the delegation ledger.
//!
//! These are side-channel notifications for hosts and indexers. Nothing in
//! the kernel reads them back.

use serde::{Deserialize, Serialize};

use crate::types::amount::Amount;
use crate::types::id::{Address, Position};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LedgerEvent {
    /// `owner` now routes its balance to `new` (`Address::ZERO` = itself).
    DelegateChanged {
        position: Position,
        owner: Address,
        old: Address,
        new: Address,
    },

    /// Power received by `delegate` moved from `old` to `new`.
    ReceivedPowerChanged {
        position: Position,
        delegate: Address,
        #[serde(with = "crate::types::amount::words")]
        old: Amount,
        #[serde(with = "crate::types::amount::words")]
        new: Amount,
    },
}

impl LedgerEvent {
    /// Returns a human-readable description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::DelegateChanged { .. } => "DelegateChanged",
            LedgerEvent::ReceivedPowerChanged { .. } => "ReceivedPowerChanged",
        }
    }

    pub fn position(&self) -> Position {
        match self {
            LedgerEvent::DelegateChanged { position, .. } => *position,
            LedgerEvent::ReceivedPowerChanged { position, .. } => *position,
        }
    }
}
