use crate::state::command::Command;
use crate::state::kernel::VotePowerKernel;
use crate::tests::{addr, amt, init_tracing};
use crate::types::{Address, Amount, Position};
use crate::verify::kernel_state_hash;
use std::vec::Vec;

/// A simple deterministic RNG for tests.
struct Pcg32 {
    state: u64,
    inc: u64,
}

impl Pcg32 {
    fn new(seed: u64) -> Self {
        Self { state: seed, inc: 1 }
    }

    fn next_u32(&mut self) -> u32 {
        let oldstate = self.state;
        self.state = oldstate.wrapping_mul(6364136223846793005).wrapping_add(self.inc);
        let xorshifted = (((oldstate >> 18) ^ oldstate) >> 27) as u32;
        let rot = (oldstate >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    fn below(&mut self, n: u32) -> u32 {
        self.next_u32() % n
    }
}

const HOLDERS: u64 = 6;

fn holder(rng: &mut Pcg32) -> Address {
    addr(1 + rng.below(HOLDERS as u32) as u64)
}

fn generate_random_command(rng: &mut Pcg32, position: Position) -> Command {
    match rng.below(8) {
        0 => Command::AdvanceTo { position: position + rng.below(3) as u64 },
        1 | 2 => Command::Mint { to: holder(rng), amount: amt(rng.below(1000) as u64) },
        3 => Command::Burn { from: holder(rng), amount: amt(rng.below(300) as u64) },
        4 => Command::Transfer { from: holder(rng), to: holder(rng), amount: amt(rng.below(400) as u64) },
        5 => Command::Delegate { owner: holder(rng), to: holder(rng) },
        6 => Command::Undelegate { owner: holder(rng) },
        _ => Command::MirrorStake {
            owner: holder(rng),
            node: addr(100 + rng.below(5) as u64),
            amount: amt(rng.below(200) as u64),
        },
    }
}

/// Balance, received power and vote power of every holder.
type Snapshot = Vec<(Amount, Amount, Amount)>;

fn snapshot(kernel: &VotePowerKernel) -> Snapshot {
    (1..=HOLDERS)
        .map(addr)
        .map(|a| {
            (
                kernel.balance_of(a),
                kernel.delegation.received_power_of(a),
                kernel.vote_power_of(a).unwrap(),
            )
        })
        .collect()
}

fn assert_snapshot_at(kernel: &VotePowerKernel, position: Position, expected: &Snapshot) {
    for (i, a) in (1..=HOLDERS).map(addr).enumerate() {
        let got = (
            kernel.balance_of_at(a, position).unwrap(),
            kernel.received_power_of_at(a, position).unwrap(),
            kernel.vote_power_of_at(a, position).unwrap(),
        );
        assert_eq!(got, expected[i], "holder {} at position {}", a, position);
    }
}

/// Runs a deterministic sequence of commands, recording the final values of
/// every position before the clock leaves it.
fn run_simulation(seed: u64, steps: usize) -> (VotePowerKernel, Vec<(Position, Snapshot)>) {
    init_tracing();
    let mut kernel = VotePowerKernel::default();
    let mut rng = Pcg32::new(seed);
    let mut snapshots = Vec::new();
    kernel.apply(&Command::AdvanceTo { position: 1 }).unwrap();

    for _ in 0..steps {
        let cmd = generate_random_command(&mut rng, kernel.position());
        if let Command::AdvanceTo { position } = cmd {
            if position > kernel.position() {
                snapshots.push((kernel.position(), snapshot(&kernel)));
            }
        }

        let before = kernel_state_hash(&kernel);
        if let Err(e) = kernel.apply(&cmd) {
            assert!(!e.is_fatal(), "{:?} failed with {}", cmd, e);
            assert_eq!(kernel_state_hash(&kernel), before, "{:?} left partial state", cmd);
        }
    }
    snapshots.push((kernel.position(), snapshot(&kernel)));
    (kernel, snapshots)
}

#[test]
fn test_determinism_harness() {
    let (k1, _) = run_simulation(42, 300);
    let (k2, _) = run_simulation(42, 300);
    assert_eq!(kernel_state_hash(&k1), kernel_state_hash(&k2), "Same seed must give the same state");

    let (k3, _) = run_simulation(43, 300);
    assert_ne!(kernel_state_hash(&k1), kernel_state_hash(&k3));
}

#[test]
fn test_history_matches_recorded_values() {
    for seed in [1, 7, 42] {
        let (kernel, snapshots) = run_simulation(seed, 400);
        assert!(snapshots.len() > 10);
        for (position, expected) in &snapshots {
            assert_snapshot_at(&kernel, *position, expected);
            kernel.check_invariants(*position).unwrap();
        }
    }
}

#[test]
fn test_cleanup_preserves_supported_window() {
    let (mut kernel, snapshots) = run_simulation(9, 400);
    let boundary = snapshots[snapshots.len() / 2].0;
    kernel.apply(&Command::SetCleanupPosition { position: boundary }).unwrap();

    let before = snapshot(&kernel);
    let mut deleted = 0;
    for owner in kernel.owners() {
        deleted += kernel.cleanup_old_checkpoints(owner, usize::MAX);
    }
    deleted += kernel.cleanup_supply_checkpoints(usize::MAX);
    assert!(deleted > 0);
    assert_eq!(snapshot(&kernel), before, "Current values survive cleanup");

    for (position, expected) in snapshots.iter().filter(|(p, _)| *p >= boundary) {
        assert_snapshot_at(&kernel, *position, expected);
        kernel.check_invariants(*position).unwrap();
    }

    // Everything prunable is gone; a second pass deletes nothing.
    for owner in kernel.owners() {
        assert_eq!(kernel.cleanup_old_checkpoints(owner, usize::MAX), 0);
    }
}
