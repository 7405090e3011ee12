#![allow(dead_code)]

//! A deterministic cluster harness: simulated tick clock, per-replica
//! timers honoring the replicas' timer commands, and a routed message
//! queue with configurable drops and partitions.

use std::collections::{BTreeSet, VecDeque};

use bytes::Bytes;
use rand_chacha::ChaChaRng;
use rand_core::{RngCore, SeedableRng};
use tempfile::TempDir;

use raft_replica::{
    Config, LogIndex, Message, Output, RaftSm, ReplicaId, Term, TimerAction, TimerCmd, TimerKind,
};

pub const ENTRY_SIZE: usize = 12;
pub const PAYLOAD_SIZE: usize = ENTRY_SIZE - 4;
pub const ELECTION_MIN: u32 = 10;
pub const ELECTION_MAX: u32 = 50;
pub const HEARTBEAT: u32 = 5;
const MAX_TICKS: u32 = 100_000;

pub fn payload(tag: u8) -> Bytes {
    Bytes::from(vec![tag; PAYLOAD_SIZE])
}

pub fn replica_id(index: usize) -> ReplicaId {
    format!("R{}", index + 1)
}

pub fn test_config(local_id: ReplicaId, peers: Vec<ReplicaId>, dir: &TempDir) -> Config {
    let path = dir.path().join(format!("{}.log", local_id));
    let mut config = Config::new(local_id, peers, path, ENTRY_SIZE);
    config.election_min_ticks = ELECTION_MIN;
    config.election_max_ticks = ELECTION_MAX;
    config.heartbeat_ticks = HEARTBEAT;
    config
}

/// One replica plus the simulated one-shot timers the host would run for
/// it.
pub struct TestReplica {
    pub sm: RaftSm<ChaChaRng>,
    pub id: ReplicaId,
    pub applied: Vec<(LogIndex, Bytes)>,
    election: Option<u32>,
    heartbeat: Option<u32>,
    highest_term: Term,
}

impl TestReplica {
    /// Executes the bundle's timer commands, records applied entries and
    /// checks the per-replica invariants, returning the messages to route.
    pub fn absorb(&mut self, out: Output) -> Vec<(ReplicaId, Message)> {
        for TimerCmd { timer, action } in out.timer_commands {
            let slot = match timer {
                TimerKind::Election => &mut self.election,
                TimerKind::Heartbeat => &mut self.heartbeat,
            };
            *slot = match action {
                TimerAction::Set(ticks) => Some(ticks),
                TimerAction::Stop => None,
            };
        }
        for (index, payload) in out.applied {
            let expected = self.applied.last().map(|(i, _)| i + 1).unwrap_or(1);
            assert_eq!(index, expected, "{} applied {} out of order", self.id, index);
            self.applied.push((index, payload));
        }
        let term = self.sm.current_term();
        assert!(
            term >= self.highest_term,
            "{} term regressed {} -> {}",
            self.id,
            self.highest_term,
            term
        );
        self.highest_term = term;
        out.messages
    }

    /// Advances the timers by one tick, returning the kinds that fired.
    fn tick_timers(&mut self) -> Vec<TimerKind> {
        let mut fired = Vec::new();
        for &timer in &[TimerKind::Election, TimerKind::Heartbeat] {
            let slot = match timer {
                TimerKind::Election => &mut self.election,
                TimerKind::Heartbeat => &mut self.heartbeat,
            };
            if let Some(remaining) = slot {
                if *remaining <= 1 {
                    *slot = None;
                    fired.push(timer);
                } else {
                    *remaining -= 1;
                }
            }
        }
        fired
    }
}

/// Message-loss and outage configuration, adjustable mid-run.
#[derive(Clone, Default)]
pub struct Faults {
    drops: BTreeSet<(Option<ReplicaId>, Option<ReplicaId>)>,
    down: BTreeSet<ReplicaId>,
}

impl Faults {
    pub fn isolate(&mut self, id: &str) -> &mut Self {
        self.drops.insert((Some(id.to_owned()), None));
        self.drops.insert((None, Some(id.to_owned())));
        self
    }

    pub fn drop_between(&mut self, a: &str, b: &str) -> &mut Self {
        self.drops.insert((Some(a.to_owned()), Some(b.to_owned())));
        self.drops.insert((Some(b.to_owned()), Some(a.to_owned())));
        self
    }

    pub fn node_down(&mut self, id: &str) -> &mut Self {
        self.down.insert(id.to_owned());
        self
    }

    pub fn heal(&mut self) -> &mut Self {
        self.drops.clear();
        self.down.clear();
        self
    }

    pub fn is_down(&self, id: &str) -> bool {
        self.down.contains(id)
    }

    pub fn should_drop(&self, from: &str, to: &str) -> bool {
        self.drops
            .contains(&(Some(from.to_owned()), Some(to.to_owned())))
            || self.drops.contains(&(Some(from.to_owned()), None))
            || self.drops.contains(&(None, Some(to.to_owned())))
            || self.down.contains(from)
            || self.down.contains(to)
    }
}

pub struct TestCluster {
    pub dir: TempDir,
    pub replicas: Vec<TestReplica>,
    pub faults: Faults,
    pub tick: u32,
    queue: VecDeque<(ReplicaId, ReplicaId, Message)>,
}

impl TestCluster {
    /// Boots `size` replicas named `R1..`, each with its own log file in a
    /// fresh tempdir and a deterministically seeded generator.
    pub fn new(size: usize, seed: u64) -> Self {
        Self::boot(TempDir::new().unwrap(), size, seed)
    }

    /// Like [`new`](Self::new), but over an existing directory whose
    /// `R<n>.log` files, if present, are recovered rather than created.
    pub fn boot(dir: TempDir, size: usize, seed: u64) -> Self {
        let ids: Vec<ReplicaId> = (0..size).map(replica_id).collect();
        let mut seeder = ChaChaRng::seed_from_u64(seed);
        let mut replicas = Vec::with_capacity(size);
        for id in &ids {
            let peers = ids.iter().filter(|peer| *peer != id).cloned().collect();
            let config = test_config(id.clone(), peers, &dir);
            let random = ChaChaRng::seed_from_u64(seeder.next_u64());
            let mut sm = RaftSm::new(config, random).unwrap();
            let mut out = Output::new();
            sm.init(&mut out).unwrap();
            let mut replica = TestReplica {
                sm,
                id: id.clone(),
                applied: Vec::new(),
                election: None,
                heartbeat: None,
                highest_term: 0,
            };
            let messages = replica.absorb(out);
            assert!(messages.is_empty(), "init must not emit messages");
            replicas.push(replica);
        }
        Self {
            dir,
            replicas,
            faults: Faults::default(),
            tick: 0,
            queue: VecDeque::new(),
        }
    }

    pub fn index_of(&self, id: &str) -> usize {
        self.replicas
            .iter()
            .position(|replica| replica.id == id)
            .unwrap_or_else(|| panic!("unknown replica {}", id))
    }

    /// Enqueues `messages` emitted by `from`, honoring the fault
    /// configuration.
    pub fn dispatch(&mut self, from: &str, messages: Vec<(ReplicaId, Message)>) {
        for (to, message) in messages {
            if self.faults.should_drop(from, &to) {
                continue;
            }
            self.queue.push_back((from.to_owned(), to, message));
        }
    }

    /// Delivers queued messages until the cluster is quiescent.
    pub fn drain(&mut self) {
        while let Some((_from, to, message)) = self.queue.pop_front() {
            if self.faults.is_down(&to) {
                continue;
            }
            let index = self.index_of(&to);
            let mut out = Output::new();
            let replica = &mut self.replicas[index];
            match &message {
                Message::RequestVote(msg) => replica.sm.request_vote_input(msg, &mut out),
                Message::RequestVoteResp(msg) => replica.sm.request_vote_resp_input(msg, &mut out),
                Message::AppendEntries(msg) => replica.sm.append_entries_input(msg, &mut out),
                Message::AppendEntriesResp(msg) => {
                    replica.sm.append_entries_resp_input(msg, &mut out)
                }
            }
            .unwrap();
            let messages = replica.absorb(out);
            self.dispatch(&to, messages);
        }
    }

    /// Advances the simulated clock one tick, firing due timers and
    /// delivering all resulting traffic.
    pub fn step(&mut self) {
        self.tick += 1;
        for index in 0..self.replicas.len() {
            let id = self.replicas[index].id.clone();
            if self.faults.is_down(&id) {
                continue;
            }
            for timer in self.replicas[index].tick_timers() {
                let mut out = Output::new();
                self.replicas[index].sm.timer_expired(timer, &mut out).unwrap();
                let messages = self.replicas[index].absorb(out);
                self.dispatch(&id, messages);
            }
        }
        self.drain();
    }

    pub fn run_for(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.step();
        }
    }

    pub fn run_until(&mut self, mut condition: impl FnMut(&TestCluster) -> bool) {
        let mut remaining = MAX_TICKS;
        while !condition(self) {
            remaining = remaining
                .checked_sub(1)
                .expect("condition failed after maximum simulation length");
            self.step();
        }
    }

    /// Fires the election timer of one replica immediately, routing the
    /// fallout.
    pub fn force_election(&mut self, index: usize) {
        let id = self.replicas[index].id.clone();
        let mut out = Output::new();
        self.replicas[index]
            .sm
            .timer_expired(TimerKind::Election, &mut out)
            .unwrap();
        let messages = self.replicas[index].absorb(out);
        self.dispatch(&id, messages);
        self.drain();
    }

    /// Submits `payload` on the current leader, routing the fallout.
    /// Returns the index the leader assigned.
    pub fn submit(&mut self, payload: Bytes) -> LogIndex {
        let index = self.leader_index().expect("no leader to submit to");
        let id = self.replicas[index].id.clone();
        let mut out = Output::new();
        let log_index = self.replicas[index].sm.submit(payload, &mut out).unwrap();
        let messages = self.replicas[index].absorb(out);
        self.dispatch(&id, messages);
        self.drain();
        log_index
    }

    pub fn has_leader(&self) -> bool {
        self.replicas
            .iter()
            .any(|replica| !self.faults.is_down(&replica.id) && replica.sm.is_leader())
    }

    pub fn leader_index(&self) -> Option<usize> {
        self.replicas
            .iter()
            .position(|replica| !self.faults.is_down(&replica.id) && replica.sm.is_leader())
    }

    /// Asserts that at most one live replica leads any given term.
    pub fn assert_single_leader_per_term(&self) {
        let mut terms = BTreeSet::new();
        for replica in &self.replicas {
            if replica.sm.is_leader() {
                assert!(
                    terms.insert(replica.sm.current_term()),
                    "two leaders in term {}",
                    replica.sm.current_term()
                );
            }
        }
    }
}
