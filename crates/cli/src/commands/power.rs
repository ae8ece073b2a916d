use anyhow::Context;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::Path;

use checkpoint_kernel::replay::replay;
use checkpoint_kernel::types::amount::checked_add;
use checkpoint_kernel::{Address, Amount, Position, Supply, VotePowerKernel};

use super::read_log;
use crate::script::load_config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerRow {
    pub address: Address,
    pub balance: Amount,
    pub stake: Amount,
    pub delegate: Option<Address>,
    pub received: Amount,
    pub vote_power: Amount,
}

#[derive(Debug, Clone)]
pub struct PowerReport {
    pub position: Position,
    pub rows: Vec<PowerRow>,
    pub total_supply: Amount,
}

/// Vote power of every known address at `position`.
pub fn report(kernel: &VotePowerKernel, position: Position) -> anyhow::Result<PowerReport> {
    let mut rows = Vec::new();
    for address in kernel.owners() {
        let stake = kernel
            .stakes_of_at(address, position)?
            .iter()
            .try_fold(Amount::zero(), |acc, slot| checked_add(acc, slot.value))?;
        rows.push(PowerRow {
            address,
            balance: kernel.balance_of_at(address, position)?,
            stake,
            delegate: kernel.delegate_of_at(address, position)?,
            received: kernel.received_power_of_at(address, position)?,
            vote_power: kernel.vote_power_of_at(address, position)?,
        });
    }

    let total_supply = if position < kernel.position() {
        checked_add(
            kernel.supply_at_readonly(Supply::Tokens, position)?,
            kernel.supply_at_readonly(Supply::Stakes, position)?,
        )?
    } else {
        checked_add(kernel.supply_now(Supply::Tokens), kernel.supply_now(Supply::Stakes))?
    };

    Ok(PowerReport {
        position,
        rows,
        total_supply,
    })
}

/// Replays a log and computes the report at `at`, or at the final position.
pub fn compute(log_path: &Path, at: Option<Position>, config_path: Option<&Path>) -> anyhow::Result<PowerReport> {
    let config = load_config(config_path)?;
    let (_, commands) = read_log(log_path)?;
    let kernel = replay(&commands, config).context("replaying command log")?;
    let position = at.unwrap_or_else(|| kernel.position());
    report(&kernel, position).with_context(|| format!("querying position {}", position))
}

pub fn run(log_path: &Path, at: Option<Position>, config_path: Option<&Path>) -> anyhow::Result<()> {
    let report = compute(log_path, at, config_path)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Address", "Balance", "Stake", "Delegate", "Received", "Vote Power"]);

    for row in &report.rows {
        table.add_row(vec![
            row.address.to_string(),
            row.balance.to_string(),
            row.stake.to_string(),
            row.delegate.map_or_else(|| "-".to_string(), |d| d.to_string()),
            row.received.to_string(),
            row.vote_power.to_string(),
        ]);
    }

    println!("\nVote Power at position {}\n", report.position);
    println!("{table}");
    println!("Total supply: {}\n", report.total_supply);
    Ok(())
}
