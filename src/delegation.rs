// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! One-delegate-at-a-time delegation overlay.
//!
//! Each owner is either undelegated (its balance counts towards its own vote
//! power) or delegated to exactly one address (its balance counts towards
//! that delegate's received power instead). Received power is only moved by
//! delegate changes and by balance movements reported through
//! `update_at_token_transfer`.

use crate::config::DELEGATE_SLOTS;
use crate::error::{KernelError, Result};
use crate::event::LedgerEvent;
use crate::scalar::ScalarCheckpointStore;
use crate::slots::BoundedSlotStore;
use crate::types::amount::{self, Amount};
use crate::types::id::{Address, Position};

/// An external balance that counts towards vote power.
pub trait BalanceSource {
    fn balance_of(&self, owner: Address) -> Result<Amount>;
    fn balance_of_at(&self, owner: Address, position: Position) -> Result<Amount>;
}

/// Fungible balances kept as one scalar history per owner.
impl BalanceSource for ScalarCheckpointStore<Address> {
    fn balance_of(&self, owner: Address) -> Result<Amount> {
        Ok(self.value_of_at_now(owner))
    }

    fn balance_of_at(&self, owner: Address, position: Position) -> Result<Amount> {
        self.value_of_at(owner, position)
    }
}

/// Mirrored stakes: an owner's balance is the sum of its slots.
impl<const MAX_SLOTS: usize> BalanceSource for BoundedSlotStore<MAX_SLOTS> {
    fn balance_of(&self, owner: Address) -> Result<Amount> {
        self.total_of_at_now(owner)
    }

    fn balance_of_at(&self, owner: Address, position: Position) -> Result<Amount> {
        self.total_of_at(owner, position)
    }
}

/// Sum over several configured sources.
pub struct CombinedBalances<'a> {
    sources: Vec<&'a dyn BalanceSource>,
}

impl<'a> CombinedBalances<'a> {
    pub fn new(sources: Vec<&'a dyn BalanceSource>) -> Self {
        Self { sources }
    }
}

impl BalanceSource for CombinedBalances<'_> {
    fn balance_of(&self, owner: Address) -> Result<Amount> {
        self.sources.iter().try_fold(Amount::zero(), |acc, s| {
            amount::checked_add(acc, s.balance_of(owner)?)
        })
    }

    fn balance_of_at(&self, owner: Address, position: Position) -> Result<Amount> {
        self.sources.iter().try_fold(Amount::zero(), |acc, s| {
            amount::checked_add(acc, s.balance_of_at(owner, position)?)
        })
    }
}

/// Delegate marker stored in the single slot; the slot key is the delegate.
fn marker() -> Amount {
    Amount::one()
}

#[derive(Clone, Debug, Default)]
pub struct DelegationLedger {
    delegates: BoundedSlotStore<DELEGATE_SLOTS>,
    received: ScalarCheckpointStore<Address>,
    events: Vec<LedgerEvent>,
}

impl DelegationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Read APIs ---

    pub fn current_delegate_of(&self, owner: Address) -> Option<Address> {
        self.delegates
            .all_entries_at_now(owner)
            .first()
            .map(|slot| slot.key)
    }

    pub fn delegate_of_at(&self, owner: Address, position: Position) -> Result<Option<Address>> {
        Ok(self
            .delegates
            .all_entries_at(owner, position)?
            .first()
            .map(|slot| slot.key))
    }

    pub fn received_power_of_at(&self, delegate: Address, position: Position) -> Result<Amount> {
        self.received.value_of_at(delegate, position)
    }

    pub fn received_power_of(&self, delegate: Address) -> Amount {
        self.received.value_of_at_now(delegate)
    }

    /// Received power plus the own balance when `who` is undelegated.
    pub fn vote_power_of_at(
        &self,
        who: Address,
        position: Position,
        balances: &dyn BalanceSource,
    ) -> Result<Amount> {
        let received = self.received.value_of_at(who, position)?;
        match self.delegate_of_at(who, position)? {
            Some(_) => Ok(received),
            None => amount::checked_add(received, balances.balance_of_at(who, position)?),
        }
    }

    pub fn vote_power_of(&self, who: Address, balances: &dyn BalanceSource) -> Result<Amount> {
        let received = self.received.value_of_at_now(who);
        match self.current_delegate_of(who) {
            Some(_) => Ok(received),
            None => amount::checked_add(received, balances.balance_of(who)?),
        }
    }

    pub fn batch_vote_power_of_at(
        &self,
        owners: &[Address],
        position: Position,
        balances: &dyn BalanceSource,
    ) -> Result<Vec<Amount>> {
        owners
            .iter()
            .map(|owner| self.vote_power_of_at(*owner, position, balances))
            .collect()
    }

    /// Owners that ever delegated, sorted.
    pub fn delegators(&self) -> Vec<Address> {
        self.delegates.owners()
    }

    /// Addresses that ever received power, sorted.
    pub fn delegates(&self) -> Vec<Address> {
        self.received.keys()
    }

    pub fn delegate_store(&self) -> &BoundedSlotStore<DELEGATE_SLOTS> {
        &self.delegates
    }

    pub fn received_store(&self) -> &ScalarCheckpointStore<Address> {
        &self.received
    }

    /// Drains the observations recorded since the last call.
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Write Logic ---

    /// Routes `owner`'s current balance to `to`.
    pub fn delegate(
        &mut self,
        owner: Address,
        to: Address,
        balances: &dyn BalanceSource,
        now: Position,
    ) -> Result<()> {
        if owner.is_zero() {
            return Err(KernelError::BothZero);
        }
        if to == owner {
            return Err(KernelError::SelfDelegation);
        }
        self.route(owner, to.non_zero(), balances, now)
    }

    /// Returns `owner`'s balance to its own vote power.
    pub fn undelegate(&mut self, owner: Address, balances: &dyn BalanceSource, now: Position) -> Result<()> {
        if owner.is_zero() {
            return Err(KernelError::BothZero);
        }
        self.route(owner, None, balances, now)
    }

    fn route(
        &mut self,
        owner: Address,
        to: Option<Address>,
        balances: &dyn BalanceSource,
        now: Position,
    ) -> Result<()> {
        let old = self.current_delegate_of(owner);
        if old == to {
            return Ok(());
        }
        let balance = balances.balance_of(owner)?;

        if let Some(history) = self.delegates.history(owner) {
            history.check_monotonic(now)?;
        }
        self.check_power_move(old, to, balance, now)?;

        if let Some(old) = old {
            self.delegates.write_value(owner, old, Amount::zero(), now)?;
        }
        if let Some(to) = to {
            self.delegates.write_value(owner, to, marker(), now)?;
        }
        self.move_power(old, to, balance, now)?;

        tracing::debug!(
            %owner,
            old = %old.unwrap_or(Address::ZERO),
            new = %to.unwrap_or(Address::ZERO),
            position = now,
            "delegate changed"
        );
        self.events.push(LedgerEvent::DelegateChanged {
            position: now,
            owner,
            old: old.unwrap_or(Address::ZERO),
            new: to.unwrap_or(Address::ZERO),
        });
        Ok(())
    }

    /// Moves power for a mint (`from` zero), burn (`to` zero) or transfer
    /// between two owners. Called by the balance holder for every movement.
    pub fn update_at_token_transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
        now: Position,
    ) -> Result<()> {
        if from.is_zero() && to.is_zero() {
            return Err(KernelError::BothZero);
        }
        if from == to {
            return Err(KernelError::SelfTransfer);
        }

        let from_delegate = from.non_zero().and_then(|a| self.current_delegate_of(a));
        let to_delegate = to.non_zero().and_then(|a| self.current_delegate_of(a));
        // The same delegate already accounts for both balances.
        if from_delegate == to_delegate || amount.is_zero() {
            return Ok(());
        }

        self.check_power_move(from_delegate, to_delegate, amount, now)?;
        self.move_power(from_delegate, to_delegate, amount, now)
    }

    /// Validates `move_power` so that it cannot fail halfway.
    fn check_power_move(
        &self,
        from: Option<Address>,
        to: Option<Address>,
        amount: Amount,
        now: Position,
    ) -> Result<()> {
        for delegate in [from, to].into_iter().flatten() {
            if let Some(history) = self.received.history(delegate) {
                history.check_monotonic(now)?;
            }
        }
        if let Some(from) = from {
            amount::checked_sub(self.received.value_of_at_now(from), amount)?;
        }
        if let Some(to) = to {
            amount::checked_add(self.received.value_of_at_now(to), amount)?;
        }
        Ok(())
    }

    fn move_power(
        &mut self,
        from: Option<Address>,
        to: Option<Address>,
        amount: Amount,
        now: Position,
    ) -> Result<()> {
        if let Some(from) = from {
            let change = self.received.sub_value(from, amount, now)?;
            self.power_changed(from, change.old, change.new, now);
        }
        if let Some(to) = to {
            let change = self.received.add_value(to, amount, now)?;
            self.power_changed(to, change.old, change.new, now);
        }
        Ok(())
    }

    fn power_changed(&mut self, delegate: Address, old: Amount, new: Amount, now: Position) {
        if old == new {
            return;
        }
        tracing::trace!(%delegate, %old, %new, position = now, "received power changed");
        self.events.push(LedgerEvent::ReceivedPowerChanged {
            position: now,
            delegate,
            old,
            new,
        });
    }

    // --- Maintenance ---

    /// Prunes `owner`'s delegate history, then its received-power history,
    /// sharing one budget. Returns the number of checkpoints deleted.
    pub fn cleanup_old_checkpoints(&mut self, owner: Address, max_count: usize, boundary: Position) -> usize {
        let deleted = self.delegates.cleanup_old_checkpoints(owner, max_count, boundary);
        deleted
            + self
                .received
                .cleanup_old_checkpoints(owner, max_count - deleted, boundary)
    }
}
