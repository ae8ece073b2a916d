// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Kernel State definition.

use crate::cache::{CachedRead, FrozenReadCache, FrozenWindow};
use crate::config::{KernelConfig, STAKE_SLOTS};
use crate::delegation::{BalanceSource, CombinedBalances, DelegationLedger};
use crate::error::{KernelError, Result};
use crate::event::LedgerEvent;
use crate::scalar::ScalarCheckpointStore;
use crate::slots::{BoundedSlotStore, Slot};
use crate::state::command::Command;
use crate::types::amount::{self, Amount};
use crate::types::id::{Address, Position};

/// Aggregate counters kept behind the frozen read cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Supply {
    /// Sum of all token balances.
    Tokens,
    /// Sum of all mirrored stakes.
    Stakes,
}

/// Token balances, mirrored stakes and delegation, advanced by `Command`s.
#[derive(Clone, Debug)]
pub struct VotePowerKernel {
    pub(crate) config: KernelConfig,
    pub(crate) version: u64,
    pub(crate) position: Position,
    pub(crate) cleanup_position: Position,
    pub(crate) balances: ScalarCheckpointStore<Address>,
    pub(crate) stakes: BoundedSlotStore<STAKE_SLOTS>,
    pub(crate) supply: ScalarCheckpointStore<Supply>,
    pub(crate) supply_cache: FrozenReadCache<Supply>,
    pub(crate) delegation: DelegationLedger,
}

impl Default for VotePowerKernel {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}

impl VotePowerKernel {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            config,
            version: 0,
            position: 0,
            cleanup_position: 0,
            balances: ScalarCheckpointStore::new(),
            stakes: BoundedSlotStore::new(),
            supply: ScalarCheckpointStore::new(),
            supply_cache: FrozenReadCache::new(),
            delegation: DelegationLedger::new(),
        }
    }

    // --- Read APIs ---

    /// Number of commands applied.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn cleanup_position(&self) -> Position {
        self.cleanup_position
    }

    pub fn frozen_window(&self) -> FrozenWindow {
        FrozenWindow::new(self.cleanup_position, self.position)
    }

    pub fn balance_of(&self, owner: Address) -> Amount {
        self.balances.value_of_at_now(owner)
    }

    /// Rejects positions before the cleanup boundary, whether or not the
    /// histories involved have been pruned yet.
    pub fn check_retained(&self, position: Position) -> Result<()> {
        if position < self.cleanup_position {
            return Err(KernelError::StaleHistoryRead {
                requested: position,
                earliest: self.cleanup_position,
            });
        }
        Ok(())
    }

    pub fn balance_of_at(&self, owner: Address, position: Position) -> Result<Amount> {
        self.check_retained(position)?;
        self.balances.value_of_at(owner, position)
    }

    pub fn stake_of_at(&self, owner: Address, node: Address, position: Position) -> Result<Amount> {
        self.check_retained(position)?;
        self.stakes.value_of_at(owner, node, position)
    }

    pub fn stakes_of_at(&self, owner: Address, position: Position) -> Result<Vec<Slot>> {
        self.check_retained(position)?;
        self.stakes.all_entries_at(owner, position)
    }

    pub fn stakes_of(&self, owner: Address) -> Vec<Slot> {
        self.stakes.all_entries_at_now(owner)
    }

    pub fn current_delegate_of(&self, owner: Address) -> Option<Address> {
        self.delegation.current_delegate_of(owner)
    }

    pub fn delegate_of_at(&self, owner: Address, position: Position) -> Result<Option<Address>> {
        self.check_retained(position)?;
        self.delegation.delegate_of_at(owner, position)
    }

    pub fn received_power_of_at(&self, delegate: Address, position: Position) -> Result<Amount> {
        self.check_retained(position)?;
        self.delegation.received_power_of_at(delegate, position)
    }

    pub fn vote_power_of_at(&self, who: Address, position: Position) -> Result<Amount> {
        self.check_retained(position)?;
        self.delegation
            .vote_power_of_at(who, position, &self.balance_sources())
    }

    pub fn vote_power_of(&self, who: Address) -> Result<Amount> {
        self.delegation.vote_power_of(who, &self.balance_sources())
    }

    pub fn batch_vote_power_of_at(&self, owners: &[Address], position: Position) -> Result<Vec<Amount>> {
        self.check_retained(position)?;
        self.delegation
            .batch_vote_power_of_at(owners, position, &self.balance_sources())
    }

    /// Aggregate at a frozen position, memoized unless caching is disabled.
    pub fn supply_at(&mut self, kind: Supply, position: Position) -> Result<CachedRead> {
        let window = self.frozen_window();
        if !self.config.cache_total_supply {
            let value = self.supply_cache.peek_value_at(&self.supply, kind, position, window)?;
            return Ok(CachedRead {
                value,
                newly_cached: false,
            });
        }
        self.supply_cache.value_of_at(&self.supply, kind, position, window)
    }

    /// Same as `supply_at` without touching the cache.
    pub fn supply_at_readonly(&self, kind: Supply, position: Position) -> Result<Amount> {
        self.supply_cache
            .peek_value_at(&self.supply, kind, position, self.frozen_window())
    }

    pub fn supply_now(&self, kind: Supply) -> Amount {
        self.supply.value_of_at_now(kind)
    }

    /// Total vote power in existence at a frozen position.
    pub fn total_vote_power_at(&mut self, position: Position) -> Result<Amount> {
        let tokens = self.supply_at(Supply::Tokens, position)?.value;
        let stakes = self.supply_at(Supply::Stakes, position)?.value;
        amount::checked_add(tokens, stakes)
    }

    /// Every address the kernel holds history for, sorted.
    pub fn owners(&self) -> Vec<Address> {
        let mut owners = self.balances.keys();
        owners.extend(self.stakes.owners());
        owners.extend(self.delegation.delegators());
        owners.extend(self.delegation.delegates());
        owners.sort();
        owners.dedup();
        owners
    }

    /// Drains delegate-changed and received-power-changed observations.
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        self.delegation.take_events()
    }

    // --- Write Logic ---

    /// Applies one command. A failing command leaves the kernel unchanged.
    pub fn apply(&mut self, cmd: &Command) -> Result<()> {
        match cmd {
            Command::AdvanceTo { position } => self.advance_to(*position)?,
            Command::Mint { to, amount } => self.transfer(Address::ZERO, *to, *amount)?,
            Command::Burn { from, amount } => self.transfer(*from, Address::ZERO, *amount)?,
            Command::Transfer { from, to, amount } => self.transfer(*from, *to, *amount)?,
            Command::Delegate { owner, to } => self.delegate(*owner, *to)?,
            Command::Undelegate { owner } => self.undelegate(*owner)?,
            Command::MirrorStake { owner, node, amount } => self.mirror_stake(*owner, *node, *amount)?,
            Command::SetCleanupPosition { position } => self.set_cleanup_position(*position)?,
            Command::Cleanup { owner, max_count } => {
                let budget = max_count.map_or(self.config.cleanup_batch, |n| n as usize);
                self.cleanup_old_checkpoints(*owner, budget);
            }
            Command::CleanupSupply { max_count } => {
                let budget = max_count.map_or(self.config.cleanup_batch, |n| n as usize);
                self.cleanup_supply_checkpoints(budget);
            }
        }

        self.version += 1;
        Ok(())
    }

    pub fn advance_to(&mut self, position: Position) -> Result<()> {
        if position < self.position {
            tracing::warn!(latest = self.position, requested = position, "host clock regression");
            return Err(KernelError::NonMonotonicPosition {
                latest: self.position,
                requested: position,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Mint (`from` zero), burn (`to` zero) or transfer, with vote power routed
    /// through the delegation ledger.
    pub fn transfer(&mut self, from: Address, to: Address, value: Amount) -> Result<()> {
        let now = self.position;
        if from.is_zero() && to.is_zero() {
            return Err(KernelError::BothZero);
        }
        if from == to {
            return Err(KernelError::SelfTransfer);
        }
        if value.is_zero() {
            return Ok(());
        }

        let supply = self.supply.value_of_at_now(Supply::Tokens);
        let new_supply = match (from.is_zero(), to.is_zero()) {
            (true, _) => amount::checked_add(supply, value)?,
            (_, true) => amount::checked_sub(supply, value)?,
            _ => supply,
        };
        let new_from = match from.non_zero() {
            Some(from) => Some(amount::checked_sub(self.balances.value_of_at_now(from), value)?),
            None => None,
        };
        let new_to = match to.non_zero() {
            Some(to) => Some(amount::checked_add(self.balances.value_of_at_now(to), value)?),
            None => None,
        };

        self.delegation.update_at_token_transfer(from, to, value, now)?;

        if let Some(balance) = new_from {
            self.balances.write_value(from, balance, now)?;
        }
        if let Some(balance) = new_to {
            self.balances.write_value(to, balance, now)?;
        }
        if new_supply != supply {
            self.supply.write_value(Supply::Tokens, new_supply, now)?;
        }
        Ok(())
    }

    pub fn delegate(&mut self, owner: Address, to: Address) -> Result<()> {
        let sources = CombinedBalances::new(vec![&self.balances as &dyn BalanceSource, &self.stakes]);
        self.delegation.delegate(owner, to, &sources, self.position)
    }

    pub fn undelegate(&mut self, owner: Address) -> Result<()> {
        let sources = CombinedBalances::new(vec![&self.balances as &dyn BalanceSource, &self.stakes]);
        self.delegation.undelegate(owner, &sources, self.position)
    }

    /// Sets `owner`'s stake towards `node`. The difference to the previous
    /// stake moves vote power like a mint or burn would.
    pub fn mirror_stake(&mut self, owner: Address, node: Address, value: Amount) -> Result<()> {
        let now = self.position;
        if owner.is_zero() || node.is_zero() {
            return Err(KernelError::BothZero);
        }

        let old = self.stakes.value_of_at_now(owner, node);
        if old == value {
            return Ok(());
        }
        let held = self.stakes.all_entries_at_now(owner).len();
        if old.is_zero() && held >= STAKE_SLOTS {
            return Err(KernelError::CapacityExceeded { max: STAKE_SLOTS });
        }

        let total = self.supply.value_of_at_now(Supply::Stakes);
        let (new_total, from, to, delta) = if value > old {
            let delta = value - old;
            amount::checked_add(self.stakes.total_of_at_now(owner)?, delta)?;
            (amount::checked_add(total, delta)?, Address::ZERO, owner, delta)
        } else {
            let delta = old - value;
            (amount::checked_sub(total, delta)?, owner, Address::ZERO, delta)
        };

        self.delegation.update_at_token_transfer(from, to, delta, now)?;
        self.stakes.write_value(owner, node, value, now)?;
        self.supply.write_value(Supply::Stakes, new_total, now)?;
        Ok(())
    }

    /// Moves the pruning boundary. It may not pass the clock or move back.
    pub fn set_cleanup_position(&mut self, position: Position) -> Result<()> {
        if position > self.position || position < self.cleanup_position {
            return Err(KernelError::InvalidBoundary {
                requested: position,
                previous: self.cleanup_position,
                current: self.position,
            });
        }
        self.cleanup_position = position;
        let evicted = self.supply_cache.evict_before(position, usize::MAX);
        tracing::debug!(position, evicted, "cleanup position moved");
        Ok(())
    }

    /// Prunes every history keyed by `owner` up to the cleanup boundary,
    /// sharing `max_count` across them. Returns the number deleted.
    pub fn cleanup_old_checkpoints(&mut self, owner: Address, max_count: usize) -> usize {
        let boundary = self.cleanup_position;
        let mut deleted = self.balances.cleanup_old_checkpoints(owner, max_count, boundary);
        deleted += self
            .stakes
            .cleanup_old_checkpoints(owner, max_count - deleted, boundary);
        deleted += self
            .delegation
            .cleanup_old_checkpoints(owner, max_count - deleted, boundary);
        tracing::info!(%owner, boundary, deleted, "old checkpoints cleaned up");
        deleted
    }

    /// Prunes the aggregate histories, sharing `max_count`.
    pub fn cleanup_supply_checkpoints(&mut self, max_count: usize) -> usize {
        let boundary = self.cleanup_position;
        let mut deleted = self.supply.cleanup_old_checkpoints(Supply::Tokens, max_count, boundary);
        deleted += self
            .supply
            .cleanup_old_checkpoints(Supply::Stakes, max_count - deleted, boundary);
        tracing::info!(boundary, deleted, "supply checkpoints cleaned up");
        deleted
    }

    // --- Invariant Checker ---

    /// Checks that vote power at `position` is conserved: every owner's
    /// power summed equals token supply plus total stake, and each owner's
    /// balances add up to the aggregates.
    pub fn check_invariants(&self, position: Position) -> Result<()> {
        self.check_retained(position)?;
        let owners = self.owners();
        let sources = self.balance_sources();

        let mut power = Amount::zero();
        let mut tokens = Amount::zero();
        let mut stakes = Amount::zero();
        for owner in &owners {
            power = amount::checked_add(power, self.delegation.vote_power_of_at(*owner, position, &sources)?)?;
            tokens = amount::checked_add(tokens, self.balances.value_of_at(*owner, position)?)?;
            stakes = amount::checked_add(stakes, self.stakes.total_of_at(*owner, position)?)?;
        }

        let token_supply = self.supply.value_of_at(Supply::Tokens, position)?;
        let stake_supply = self.supply.value_of_at(Supply::Stakes, position)?;
        if tokens != token_supply {
            return Err(KernelError::InvariantViolation(format!(
                "balances sum to {} but token supply is {} at {}",
                tokens, token_supply, position
            )));
        }
        if stakes != stake_supply {
            return Err(KernelError::InvariantViolation(format!(
                "stakes sum to {} but stake supply is {} at {}",
                stakes, stake_supply, position
            )));
        }
        let expected = amount::checked_add(token_supply, stake_supply)?;
        if power != expected {
            return Err(KernelError::InvariantViolation(format!(
                "vote power sums to {} but {} exists at {}",
                power, expected, position
            )));
        }
        Ok(())
    }

    pub(crate) fn balance_sources(&self) -> CombinedBalances<'_> {
        CombinedBalances::new(vec![&self.balances as &dyn BalanceSource, &self.stakes])
    }
}

impl BalanceSource for VotePowerKernel {
    fn balance_of(&self, owner: Address) -> Result<Amount> {
        self.balance_sources().balance_of(owner)
    }

    fn balance_of_at(&self, owner: Address, position: Position) -> Result<Amount> {
        self.check_retained(position)?;
        self.balance_sources().balance_of_at(owner, position)
    }
}
