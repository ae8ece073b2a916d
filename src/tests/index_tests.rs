// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::error::KernelError;
use crate::history::index::find_latest_at_or_before;
use crate::history::History;
use crate::scalar::{ScalarCheckpoint, ScalarCheckpointStore};
use crate::tests::amt;

fn store_with(positions: &[u64]) -> ScalarCheckpointStore<u8> {
    let mut store = ScalarCheckpointStore::new();
    for (i, p) in positions.iter().enumerate() {
        store.write_value(0, amt(i as u64 + 1), *p).unwrap();
    }
    store
}

#[test]
fn test_empty_history_has_no_index() {
    let history = History::<ScalarCheckpoint>::new();
    assert_eq!(history.len(), 0);
    assert_eq!(find_latest_at_or_before(&history, 100).unwrap(), None);
    assert_eq!(find_latest_at_or_before(&history, 0).unwrap(), None);
}

#[test]
fn test_find_latest_at_or_before() {
    let store = store_with(&[10, 20, 30]);
    let history = store.history(0).unwrap();

    assert_eq!(find_latest_at_or_before(history, 5).unwrap(), None);
    assert_eq!(find_latest_at_or_before(history, 10).unwrap(), Some(0));
    assert_eq!(find_latest_at_or_before(history, 15).unwrap(), Some(0));
    assert_eq!(find_latest_at_or_before(history, 20).unwrap(), Some(1));
    assert_eq!(find_latest_at_or_before(history, 29).unwrap(), Some(1));
    assert_eq!(find_latest_at_or_before(history, 30).unwrap(), Some(2));
    assert_eq!(find_latest_at_or_before(history, 1_000).unwrap(), Some(2));
}

#[test]
fn test_binary_search_over_many_checkpoints() {
    let positions: Vec<u64> = (1..=200).map(|i| i * 3).collect();
    let store = store_with(&positions);
    let history = store.history(0).unwrap();

    for q in 3..600u64 {
        let expected = q / 3 - 1;
        assert_eq!(find_latest_at_or_before(history, q).unwrap(), Some(expected), "query {}", q);
    }
}

#[test]
fn test_read_before_pruned_history_fails() {
    let mut store = store_with(&[10, 20, 30]);
    assert_eq!(store.cleanup_old_checkpoints(0, 1, 20), 1);

    let history = store.history(0).unwrap();
    assert_eq!(history.start_index(), 1);
    assert_eq!(history.len(), 3);
    assert_eq!(find_latest_at_or_before(history, 20).unwrap(), Some(1));
    assert_eq!(find_latest_at_or_before(history, 25).unwrap(), Some(1));

    match find_latest_at_or_before(history, 15) {
        Err(KernelError::StaleHistoryRead { requested: 15, earliest: 20 }) => (),
        other => panic!("Expected StaleHistoryRead, got {:?}", other),
    }
    assert!(KernelError::StaleHistoryRead { requested: 0, earliest: 0 }.is_fatal());
}

#[test]
fn test_cleanup_keeps_checkpoint_in_effect_at_boundary() {
    let mut store = store_with(&[10, 20, 30, 40]);

    // Boundary 25: the checkpoint at 20 answers queries at 25 and must stay.
    assert_eq!(store.cleanup_old_checkpoints(0, 10, 25), 1);
    assert_eq!(store.value_of_at(0, 25).unwrap(), amt(2));
    assert_eq!(store.history(0).unwrap().earliest().map(|c| c.value()), Some(amt(2)));

    // Repeating at the same boundary deletes nothing more.
    assert_eq!(store.cleanup_old_checkpoints(0, 10, 25), 0);
}

#[test]
fn test_cleanup_never_deletes_newest() {
    let mut store = store_with(&[10, 20, 30]);
    let now = store.value_of_at_now(0);

    assert_eq!(store.cleanup_old_checkpoints(0, 100, 1_000), 2);
    assert_eq!(store.history(0).unwrap().retained(), 1);
    assert_eq!(store.value_of_at_now(0), now);
    assert_eq!(store.value_of_at(0, 1_000).unwrap(), now);
}

#[test]
fn test_cleanup_respects_budget_and_zero_boundary() {
    let mut store = store_with(&[1, 2, 3, 4, 5, 6]);

    assert_eq!(store.cleanup_old_checkpoints(0, 3, 0), 0);
    assert_eq!(store.cleanup_old_checkpoints(0, 2, 6), 2);
    assert_eq!(store.cleanup_old_checkpoints(0, 2, 6), 2);
    assert_eq!(store.cleanup_old_checkpoints(0, 2, 6), 1);
    assert_eq!(store.history(0).unwrap().start_index(), 5);
    assert_eq!(store.cleanup_old_checkpoints(7, 2, 6), 0, "unknown key");
}
