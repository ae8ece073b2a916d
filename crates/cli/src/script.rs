// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! JSON command scripts and config files.
//!
//! Scripts are a JSON array of objects tagged by `type`:
//!
//! ```json
//! [
//!   { "type": "advance_to", "position": 10 },
//!   { "type": "mint", "to": "0x00000000000000000000000000000000000000aa", "amount": "100" }
//! ]
//! ```
//!
//! Addresses are `0x` hex strings, amounts are decimal strings so that
//! values above 2^53 survive JSON.

use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::path::Path;

use checkpoint_kernel::config::KernelConfig;
use checkpoint_kernel::{Address, Amount, Command, Position};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptCommand {
    AdvanceTo { position: Position },
    Mint { to: String, amount: String },
    Burn { from: String, amount: String },
    Transfer { from: String, to: String, amount: String },
    Delegate { owner: String, to: String },
    Undelegate { owner: String },
    MirrorStake { owner: String, node: String, amount: String },
    SetCleanupPosition { position: Position },
    Cleanup { owner: String, max_count: Option<u64> },
    CleanupSupply { max_count: Option<u64> },
}

fn address(s: &str) -> anyhow::Result<Address> {
    s.parse().with_context(|| format!("invalid address {:?}", s))
}

fn amount(s: &str) -> anyhow::Result<Amount> {
    Amount::from_dec_str(s).map_err(|e| anyhow!("invalid amount {:?}: {:?}", s, e))
}

impl TryFrom<ScriptCommand> for Command {
    type Error = anyhow::Error;

    fn try_from(cmd: ScriptCommand) -> anyhow::Result<Self> {
        Ok(match cmd {
            ScriptCommand::AdvanceTo { position } => Command::AdvanceTo { position },
            ScriptCommand::Mint { to, amount: a } => Command::Mint {
                to: address(&to)?,
                amount: amount(&a)?,
            },
            ScriptCommand::Burn { from, amount: a } => Command::Burn {
                from: address(&from)?,
                amount: amount(&a)?,
            },
            ScriptCommand::Transfer { from, to, amount: a } => Command::Transfer {
                from: address(&from)?,
                to: address(&to)?,
                amount: amount(&a)?,
            },
            ScriptCommand::Delegate { owner, to } => Command::Delegate {
                owner: address(&owner)?,
                to: address(&to)?,
            },
            ScriptCommand::Undelegate { owner } => Command::Undelegate {
                owner: address(&owner)?,
            },
            ScriptCommand::MirrorStake { owner, node, amount: a } => Command::MirrorStake {
                owner: address(&owner)?,
                node: address(&node)?,
                amount: amount(&a)?,
            },
            ScriptCommand::SetCleanupPosition { position } => Command::SetCleanupPosition { position },
            ScriptCommand::Cleanup { owner, max_count } => Command::Cleanup {
                owner: address(&owner)?,
                max_count,
            },
            ScriptCommand::CleanupSupply { max_count } => Command::CleanupSupply { max_count },
        })
    }
}

/// Parses a script, reporting the index of the first bad entry.
pub fn parse_script(json: &str) -> anyhow::Result<Vec<Command>> {
    let raw: Vec<ScriptCommand> = serde_json::from_str(json).context("parsing command script")?;
    raw.into_iter()
        .enumerate()
        .map(|(i, cmd)| Command::try_from(cmd).with_context(|| format!("command #{}", i)))
        .collect()
}

pub fn load_script(path: &Path) -> anyhow::Result<Vec<Command>> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_script(&json)
}

/// Loads a `KernelConfig` from JSON; missing fields keep their defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<KernelConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&json).context("parsing kernel config")
        }
        None => Ok(KernelConfig::default()),
    }
}
