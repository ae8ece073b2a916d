// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Kernel Command definitions.

use serde::{Deserialize, Serialize};

use crate::types::amount::Amount;
use crate::types::id::{Address, Position};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Moves the host clock forward.
    AdvanceTo {
        position: Position,
    },
    Mint {
        to: Address,
        #[serde(with = "crate::types::amount::words")]
        amount: Amount,
    },
    Burn {
        from: Address,
        #[serde(with = "crate::types::amount::words")]
        amount: Amount,
    },
    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "crate::types::amount::words")]
        amount: Amount,
    },
    Delegate {
        owner: Address,
        to: Address,
    },
    Undelegate {
        owner: Address,
    },
    /// Sets the stake `owner` holds towards `node`; zero removes it.
    MirrorStake {
        owner: Address,
        node: Address,
        #[serde(with = "crate::types::amount::words")]
        amount: Amount,
    },
    SetCleanupPosition {
        position: Position,
    },
    /// Prunes every history of `owner`. `None` uses the configured batch.
    Cleanup {
        owner: Address,
        max_count: Option<u64>,
    },
    /// Prunes the token-supply and stake-supply histories.
    CleanupSupply {
        max_count: Option<u64>,
    },
}

impl Command {
    pub fn command_type(&self) -> &'static str {
        match self {
            Command::AdvanceTo { .. } => "AdvanceTo",
            Command::Mint { .. } => "Mint",
            Command::Burn { .. } => "Burn",
            Command::Transfer { .. } => "Transfer",
            Command::Delegate { .. } => "Delegate",
            Command::Undelegate { .. } => "Undelegate",
            Command::MirrorStake { .. } => "MirrorStake",
            Command::SetCleanupPosition { .. } => "SetCleanupPosition",
            Command::Cleanup { .. } => "Cleanup",
            Command::CleanupSupply { .. } => "CleanupSupply",
        }
    }

    /// Addresses the command touches, in argument order.
    pub fn addresses(&self) -> Vec<Address> {
        match self {
            Command::AdvanceTo { .. }
            | Command::SetCleanupPosition { .. }
            | Command::CleanupSupply { .. } => Vec::new(),
            Command::Mint { to, .. } => vec![*to],
            Command::Burn { from, .. } => vec![*from],
            Command::Transfer { from, to, .. } => vec![*from, *to],
            Command::Delegate { owner, to } => vec![*owner, *to],
            Command::Undelegate { owner } | Command::Cleanup { owner, .. } => vec![*owner],
            Command::MirrorStake { owner, node, .. } => vec![*owner, *node],
        }
    }
}
