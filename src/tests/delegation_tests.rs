// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::delegation::{BalanceSource, CombinedBalances, DelegationLedger};
use crate::error::KernelError;
use crate::event::LedgerEvent;
use crate::scalar::ScalarCheckpointStore;
use crate::slots::BoundedSlotStore;
use crate::tests::{addr, amt};
use crate::types::{Address, Amount};

/// Token holder that reports every movement to the ledger, as a host would.
struct Token {
    balances: ScalarCheckpointStore<Address>,
    ledger: DelegationLedger,
}

impl Token {
    fn new() -> Self {
        Self {
            balances: ScalarCheckpointStore::new(),
            ledger: DelegationLedger::new(),
        }
    }

    fn mint(&mut self, to: Address, value: u64, now: u64) {
        self.ledger.update_at_token_transfer(Address::ZERO, to, amt(value), now).unwrap();
        self.balances.add_value(to, amt(value), now).unwrap();
    }

    fn transfer(&mut self, from: Address, to: Address, value: u64, now: u64) {
        self.ledger.update_at_token_transfer(from, to, amt(value), now).unwrap();
        self.balances.sub_value(from, amt(value), now).unwrap();
        self.balances.add_value(to, amt(value), now).unwrap();
    }

    fn burn(&mut self, from: Address, value: u64, now: u64) {
        self.ledger.update_at_token_transfer(from, Address::ZERO, amt(value), now).unwrap();
        self.balances.sub_value(from, amt(value), now).unwrap();
    }

    fn delegate(&mut self, owner: Address, to: Address, now: u64) -> crate::error::Result<()> {
        self.ledger.delegate(owner, to, &self.balances, now)
    }

    fn power(&self, who: Address, position: u64) -> Amount {
        self.ledger.vote_power_of_at(who, position, &self.balances).unwrap()
    }
}

#[test]
fn test_self_delegation_rejected() {
    let mut token = Token::new();
    token.mint(addr(1), 10, 1);
    assert_eq!(token.delegate(addr(1), addr(1), 2), Err(KernelError::SelfDelegation));
    assert_eq!(token.ledger.current_delegate_of(addr(1)), None);
}

#[test]
fn test_delegate_moves_power() {
    let (a, b) = (addr(1), addr(2));
    let mut token = Token::new();
    token.mint(a, 100, 10);
    token.delegate(a, b, 12).unwrap();

    assert_eq!(token.ledger.current_delegate_of(a), Some(b));
    assert_eq!(token.ledger.delegate_of_at(a, 11).unwrap(), None);
    assert_eq!(token.ledger.received_power_of_at(b, 11).unwrap(), Amount::zero());
    assert_eq!(token.ledger.received_power_of_at(b, 12).unwrap(), amt(100));
    assert_eq!(token.power(a, 11), amt(100));
    assert_eq!(token.power(a, 12), Amount::zero());
    assert_eq!(token.power(b, 12), amt(100));
}

#[test]
fn test_redelegate_and_undelegate() {
    let (a, b, c) = (addr(1), addr(2), addr(3));
    let mut token = Token::new();
    token.mint(a, 100, 1);
    token.delegate(a, b, 2).unwrap();
    token.delegate(a, c, 3).unwrap();

    assert_eq!(token.ledger.received_power_of(b), Amount::zero());
    assert_eq!(token.ledger.received_power_of(c), amt(100));
    assert_eq!(token.ledger.delegate_of_at(a, 2).unwrap(), Some(b));

    token.ledger.undelegate(a, &token.balances, 4).unwrap();
    assert_eq!(token.ledger.current_delegate_of(a), None);
    assert_eq!(token.ledger.received_power_of(c), Amount::zero());
    assert_eq!(token.power(a, 4), amt(100));
    assert_eq!(token.power(c, 3), amt(100));
}

#[test]
fn test_delegate_change_within_one_position() {
    let (a, b, c) = (addr(1), addr(2), addr(3));
    let mut token = Token::new();
    token.mint(a, 40, 5);
    token.delegate(a, b, 5).unwrap();
    token.delegate(a, c, 5).unwrap();

    // The single delegate slot was rewritten in place.
    assert_eq!(token.ledger.delegate_store().history(a).unwrap().retained(), 1);
    assert_eq!(token.ledger.delegate_of_at(a, 5).unwrap(), Some(c));
    assert_eq!(token.ledger.received_power_of_at(b, 5).unwrap(), Amount::zero());
    assert_eq!(token.ledger.received_power_of_at(c, 5).unwrap(), amt(40));
}

#[test]
fn test_transfer_routing() {
    let (a, b, c, d) = (addr(1), addr(2), addr(3), addr(4));
    let mut token = Token::new();
    token.mint(a, 100, 1);
    token.mint(c, 10, 1);
    token.delegate(a, b, 2).unwrap();
    token.delegate(c, b, 2).unwrap();
    assert_eq!(token.ledger.received_power_of(b), amt(110));

    // Same delegate on both sides: nothing moves.
    token.transfer(a, c, 30, 3);
    assert_eq!(token.ledger.received_power_of(b), amt(110));

    // To an undelegated owner: the delegate loses, the receiver keeps its own power.
    token.transfer(a, d, 20, 4);
    assert_eq!(token.ledger.received_power_of(b), amt(90));
    assert_eq!(token.power(d, 4), amt(20));

    token.burn(c, 40, 5);
    assert_eq!(token.ledger.received_power_of(b), amt(50));
    assert_eq!(token.power(b, 5), amt(50));
}

#[test]
fn test_transfer_endpoint_errors() {
    let mut ledger = DelegationLedger::new();
    assert_eq!(
        ledger.update_at_token_transfer(addr(1), addr(1), amt(1), 1),
        Err(KernelError::SelfTransfer)
    );
    assert_eq!(
        ledger.update_at_token_transfer(Address::ZERO, Address::ZERO, amt(1), 1),
        Err(KernelError::BothZero)
    );
}

#[test]
fn test_events() {
    let (a, b) = (addr(1), addr(2));
    let mut token = Token::new();
    token.mint(a, 100, 1);
    token.delegate(a, b, 2).unwrap();

    let events = token.ledger.take_events();
    assert_eq!(
        events,
        vec![
            LedgerEvent::ReceivedPowerChanged { position: 2, delegate: b, old: Amount::zero(), new: amt(100) },
            LedgerEvent::DelegateChanged { position: 2, owner: a, old: Address::ZERO, new: b },
        ]
    );
    assert!(token.ledger.take_events().is_empty(), "Events are drained once");

    // Re-delegating to the current delegate changes nothing.
    token.delegate(a, b, 3).unwrap();
    assert!(token.ledger.take_events().is_empty());
}

#[test]
fn test_combined_balance_sources() {
    let owner = addr(1);
    let mut tokens = ScalarCheckpointStore::<Address>::new();
    let mut stakes = BoundedSlotStore::<3>::new();
    tokens.write_value(owner, amt(70), 1).unwrap();
    stakes.write_value(owner, addr(50), amt(20), 1).unwrap();
    stakes.write_value(owner, addr(51), amt(10), 2).unwrap();

    let sources = CombinedBalances::new(vec![&tokens as &dyn BalanceSource, &stakes]);
    assert_eq!(sources.balance_of(owner).unwrap(), amt(100));
    assert_eq!(sources.balance_of_at(owner, 1).unwrap(), amt(90));

    let mut ledger = DelegationLedger::new();
    ledger.delegate(owner, addr(2), &sources, 3).unwrap();
    assert_eq!(ledger.received_power_of(addr(2)), amt(100));
}

#[test]
fn test_cleanup_shares_budget() {
    let (a, b, c) = (addr(1), addr(2), addr(3));
    let mut token = Token::new();
    token.mint(a, 10, 1);
    token.delegate(a, b, 2).unwrap();
    token.delegate(a, c, 3).unwrap();
    token.delegate(a, b, 4).unwrap();

    // Delegate history of `a` holds 3 checkpoints, so 2 are prunable at 4.
    assert_eq!(token.ledger.cleanup_old_checkpoints(a, 1, 4), 1);
    assert_eq!(token.ledger.cleanup_old_checkpoints(a, 5, 4), 1);
    assert_eq!(token.ledger.cleanup_old_checkpoints(a, 5, 4), 0);
    assert_eq!(token.ledger.current_delegate_of(a), Some(b));

    // Received power of `b` has checkpoints at 2, 3 and 4.
    assert_eq!(token.ledger.cleanup_old_checkpoints(b, 5, 4), 2);
    assert_eq!(token.ledger.received_power_of_at(b, 4).unwrap(), amt(10));
}
