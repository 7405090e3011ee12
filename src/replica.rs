//! The replica state machine: role transitions, elections and log
//! replication.
//!
//! A [`RaftSm`] is a pure reactor: the host feeds it one input at a time,
//! either an inbound [`Message`](crate::message::Message) or a timer
//! expiry, and drains the [`Output`] bundle the input filled. The replica never spawns
//! threads and never touches the network; its only I/O is the synchronous
//! durable write to its [`LogStore`], which always completes before a
//! dependent message is added to the bundle.

use std::cmp;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::mem;
use std::path::PathBuf;

use bytes::Bytes;
use log::{debug, info, warn};
use rand_core::RngCore;

use crate::error::{Error, Result};
use crate::message::{
    AppendEntries, AppendEntriesResp, LogEntry, LogIndex, Message, ReplicaId, RequestVote,
    RequestVoteResp, Term,
};
use crate::output::{Output, TimerAction, TimerCmd, TimerKind};
use crate::store::{LogStore, TERM_SIZE, VOTED_FOR_SIZE};

/// Construction parameters for a replica.
#[derive(Clone, Debug)]
pub struct Config {
    /// This replica's name. At most 31 bytes, never empty.
    pub local_id: ReplicaId,

    /// The other members of the cluster, excluding `local_id`. Fixed for
    /// the lifetime of the replica.
    pub peers: Vec<ReplicaId>,

    /// Path of the durable log file, owned exclusively by this replica.
    pub log_path: PathBuf,

    /// Size in bytes of one on-disk entry record, term included. Must
    /// match across reboots; a log written with a different size is
    /// rejected at init.
    pub log_entry_size: usize,

    /// Lower bound of the randomized election timeout, in host ticks.
    pub election_min_ticks: u32,

    /// Upper bound of the randomized election timeout, in host ticks.
    pub election_max_ticks: u32,

    /// Heartbeat interval in host ticks. Must be strictly less than
    /// `election_min_ticks`.
    pub heartbeat_ticks: u32,

    /// Maximum number of entries shipped in one append request.
    pub replication_batch: usize,
}

impl Config {
    /// Builds a configuration with the default timings (election timeout
    /// drawn from 10..=50 ticks, heartbeats every 5).
    pub fn new(
        local_id: ReplicaId,
        peers: Vec<ReplicaId>,
        log_path: PathBuf,
        log_entry_size: usize,
    ) -> Self {
        Self {
            local_id,
            peers,
            log_path,
            log_entry_size,
            election_min_ticks: 10,
            election_max_ticks: 50,
            heartbeat_ticks: 5,
            replication_batch: 16,
        }
    }
}

/// Per-peer replication progress, tracked by the leader.
struct Replication {
    /// Index of the next entry to ship to this peer.
    next_index: LogIndex,

    /// Highest index known to be stored on this peer.
    match_index: LogIndex,
}

enum Role {
    Follower,
    Candidate {
        votes_collected: usize,
    },
    Leader {
        followers: BTreeMap<ReplicaId, Replication>,
    },
}

impl Role {
    fn name(&self) -> &'static str {
        match self {
            Role::Follower => "Follower",
            Role::Candidate { .. } => "Candidate",
            Role::Leader { .. } => "Leader",
        }
    }
}

/// The replica state machine a host embeds to take part in a Raft cluster.
///
/// `random` breaks election symmetry; it must be seeded differently on
/// every replica of a group. Tests inject a deterministically seeded
/// generator for reproducible schedules.
pub struct RaftSm<R> {
    config: Config,
    peers: BTreeSet<ReplicaId>,
    random: R,
    store: Option<LogStore>,
    role: Role,
    commit_index: LogIndex,
    last_applied: LogIndex,
    leader_hint: Option<ReplicaId>,
}

impl<R: RngCore> RaftSm<R> {
    /// Validates `config` and builds a replica. No durable state is
    /// touched until [`init`](Self::init).
    pub fn new(config: Config, random: R) -> Result<Self> {
        check_replica_id(&config.local_id)?;
        let mut peers = BTreeSet::new();
        for peer in &config.peers {
            check_replica_id(peer)?;
            if *peer == config.local_id {
                return Err(Error::Config(format!(
                    "local id {:?} listed among the peers",
                    peer
                )));
            }
            if !peers.insert(peer.clone()) {
                return Err(Error::Config(format!("duplicate peer id {:?}", peer)));
            }
        }
        if config.log_entry_size <= TERM_SIZE {
            return Err(Error::Config(format!(
                "log entry size {} is too short",
                config.log_entry_size
            )));
        }
        if config.election_min_ticks == 0 || config.election_min_ticks > config.election_max_ticks
        {
            return Err(Error::Config(format!(
                "invalid election timeout range {}..={}",
                config.election_min_ticks, config.election_max_ticks
            )));
        }
        if config.heartbeat_ticks == 0 || config.heartbeat_ticks >= config.election_min_ticks {
            return Err(Error::Config(format!(
                "heartbeat interval {} must be below the election minimum {}",
                config.heartbeat_ticks, config.election_min_ticks
            )));
        }
        if config.replication_batch == 0 {
            return Err(Error::Config("replication batch must be positive".to_owned()));
        }
        Ok(Self {
            peers,
            config,
            random,
            store: None,
            role: Role::Follower,
            commit_index: 0,
            last_applied: 0,
            leader_hint: None,
        })
    }

    /// Recovers or initializes the durable state and arms the election
    /// timer. Must be called exactly once before any other input.
    pub fn init(&mut self, out: &mut Output) -> Result<()> {
        self.check_output(out)?;
        if self.store.is_some() {
            return Err(Error::Config("replica already initialized".to_owned()));
        }
        let store = LogStore::open(
            &self.config.log_path,
            self.config.log_entry_size,
            &self.config.local_id,
            &self.peers,
        )?;
        self.store = Some(store);
        self.arm_election_timer(out);
        Ok(())
    }

    /// Handles a vote request from a candidate.
    pub fn request_vote_input(&mut self, msg: &RequestVote, out: &mut Output) -> Result<()> {
        self.check_output(out)?;
        if !self.peers.contains(&msg.candidate_id) {
            warn!(
                "[{}] dropping vote request from unknown replica {}",
                self.config.local_id, msg.candidate_id
            );
            return Ok(());
        }
        debug!("[{}] <- {}", self.config.local_id, msg);
        self.catch_up_term(msg.term, out)?;
        let current = self.current_term();
        let grant;
        {
            let store = self.store_mut()?;
            grant = msg.term >= current
                && (store.voted_for().is_empty() || store.voted_for() == msg.candidate_id)
                && (msg.last_log_term > store.last_log_term()
                    || (msg.last_log_term == store.last_log_term()
                        && msg.last_log_index >= store.last_log_index()));
            if grant && store.voted_for().is_empty() {
                // The vote must be on stable storage before the response
                // can leave.
                store.set_voted_for(&msg.candidate_id)?;
            }
        }
        if grant {
            self.arm_election_timer(out);
        }
        info!(
            "[{}] vote for {} at term {}{} granted",
            self.config.local_id,
            msg.candidate_id,
            current,
            if grant { "" } else { " not" }
        );
        out.messages.push((
            msg.candidate_id.clone(),
            Message::RequestVoteResp(RequestVoteResp {
                term: current,
                vote_granted: grant,
            }),
        ));
        Ok(())
    }

    /// Handles the response to a vote request this replica issued.
    pub fn request_vote_resp_input(&mut self, msg: &RequestVoteResp, out: &mut Output) -> Result<()> {
        self.check_output(out)?;
        debug!("[{}] <- {}", self.config.local_id, msg);
        if self.catch_up_term(msg.term, out)? {
            return Ok(());
        }
        let current = self.current_term();
        if msg.term < current {
            debug!(
                "[{}] ignoring vote response from old term {}",
                self.config.local_id, msg.term
            );
            return Ok(());
        }
        if !msg.vote_granted {
            info!("[{}] vote denied at term {}", self.config.local_id, current);
            return Ok(());
        }
        let quorum = self.quorum();
        let reached = match &mut self.role {
            Role::Candidate { votes_collected } => {
                *votes_collected += 1;
                info!(
                    "[{}] vote granted, {}/{} at term {}",
                    self.config.local_id, votes_collected, quorum, current
                );
                *votes_collected >= quorum
            }
            Role::Follower | Role::Leader { .. } => false,
        };
        if reached {
            self.become_leader(out)?;
        }
        Ok(())
    }

    /// Handles an append request (or heartbeat) from a leader.
    pub fn append_entries_input(&mut self, msg: &AppendEntries, out: &mut Output) -> Result<()> {
        self.check_output(out)?;
        if !self.peers.contains(&msg.leader_id) {
            warn!(
                "[{}] dropping append request from unknown replica {}",
                self.config.local_id, msg.leader_id
            );
            return Ok(());
        }
        let payload_size = self.config.log_entry_size - TERM_SIZE;
        if msg.entries.iter().any(|e| e.payload.len() != payload_size) {
            warn!(
                "[{}] dropping append request from {} with malformed entries",
                self.config.local_id, msg.leader_id
            );
            return Ok(());
        }
        debug!("[{}] <- {}", self.config.local_id, msg);
        self.catch_up_term(msg.term, out)?;
        let current = self.current_term();
        let local = self.config.local_id.clone();
        if msg.term < current {
            debug!(
                "[{}] rejecting append from {} at old term {}",
                local, msg.leader_id, msg.term
            );
            out.messages.push((
                msg.leader_id.clone(),
                Message::AppendEntriesResp(AppendEntriesResp {
                    term: current,
                    follower_id: local,
                    success: false,
                    match_index: 0,
                }),
            ));
            return Ok(());
        }
        if let Role::Leader { .. } = self.role {
            warn!(
                "[{}] append request from {} while leading term {}",
                local, msg.leader_id, current
            );
            return Ok(());
        }
        if let Role::Candidate { .. } = self.role {
            info!(
                "[{}] accepting {} as leader of term {}",
                local, msg.leader_id, current
            );
            self.switch_role(Role::Follower);
        }
        self.leader_hint = Some(msg.leader_id.clone());
        self.arm_election_timer(out);

        let log_ok = {
            let store = self.store_mut()?;
            msg.prev_log_index == 0
                || (msg.prev_log_index <= store.last_log_index()
                    && store.read_entry_term(msg.prev_log_index)? == msg.prev_log_term)
        };
        if !log_ok {
            info!(
                "[{}] log mismatch at index {} (term {}), rejecting append from {}",
                local, msg.prev_log_index, msg.prev_log_term, msg.leader_id
            );
            out.messages.push((
                msg.leader_id.clone(),
                Message::AppendEntriesResp(AppendEntriesResp {
                    term: current,
                    follower_id: local,
                    success: false,
                    match_index: 0,
                }),
            ));
            return Ok(());
        }
        if !msg.entries.is_empty() {
            self.store_mut()?.append(msg.prev_log_index + 1, &msg.entries)?;
        }
        let last = self.store_mut()?.last_log_index();
        let new_commit = cmp::min(msg.leader_commit, last);
        if new_commit > self.commit_index {
            debug!("[{}] commit {} -> {}", local, self.commit_index, new_commit);
            self.commit_index = new_commit;
        }
        self.apply_committed(out)?;
        out.messages.push((
            msg.leader_id.clone(),
            Message::AppendEntriesResp(AppendEntriesResp {
                term: current,
                follower_id: local,
                success: true,
                match_index: msg.prev_log_index + msg.entries.len() as u64,
            }),
        ));
        Ok(())
    }

    /// Handles the response to an append request this replica issued.
    pub fn append_entries_resp_input(
        &mut self,
        msg: &AppendEntriesResp,
        out: &mut Output,
    ) -> Result<()> {
        self.check_output(out)?;
        debug!("[{}] <- {}", self.config.local_id, msg);
        if self.catch_up_term(msg.term, out)? {
            return Ok(());
        }
        if msg.term < self.current_term() {
            debug!(
                "[{}] ignoring append response from old term {}",
                self.config.local_id, msg.term
            );
            return Ok(());
        }
        if !self.peers.contains(&msg.follower_id) {
            warn!(
                "[{}] dropping append response from unknown replica {}",
                self.config.local_id, msg.follower_id
            );
            return Ok(());
        }
        let advanced = {
            let replication = match &mut self.role {
                Role::Leader { followers } => match followers.get_mut(&msg.follower_id) {
                    Some(replication) => replication,
                    None => return Ok(()),
                },
                Role::Follower | Role::Candidate { .. } => {
                    debug!(
                        "[{}] ignoring append response while not leading",
                        self.config.local_id
                    );
                    return Ok(());
                }
            };
            if msg.success {
                if msg.match_index > replication.match_index {
                    replication.match_index = msg.match_index;
                }
                replication.next_index = replication.match_index + 1;
                true
            } else {
                replication.next_index = cmp::max(1, replication.next_index.saturating_sub(1));
                debug!(
                    "[{}] append rejected by {}, next_index back to {}",
                    self.config.local_id, msg.follower_id, replication.next_index
                );
                false
            }
        };
        if advanced {
            self.advance_commit(out)?;
        }
        Ok(())
    }

    /// Handles the expiry of one of the timers this replica asked the host
    /// to run. A stale expiry (the role changed since it was set) is a
    /// no-op.
    pub fn timer_expired(&mut self, timer: TimerKind, out: &mut Output) -> Result<()> {
        self.check_output(out)?;
        match timer {
            TimerKind::Election => {
                if let Role::Leader { .. } = self.role {
                    debug!("[{}] stale election timer", self.config.local_id);
                    return Ok(());
                }
                self.start_election(out)
            }
            TimerKind::Heartbeat => {
                if !self.is_leader() {
                    debug!("[{}] stale heartbeat timer", self.config.local_id);
                    return Ok(());
                }
                let peers: Vec<ReplicaId> = self.peers.iter().cloned().collect();
                for peer in &peers {
                    self.replicate_to(peer, out)?;
                }
                out.timer_commands.push(TimerCmd {
                    timer: TimerKind::Heartbeat,
                    action: TimerAction::Set(self.config.heartbeat_ticks),
                });
                Ok(())
            }
        }
    }

    /// Appends `payload` to the replicated log. Leader only; on any other
    /// role this fails with [`Error::NotLeader`] carrying the best-known
    /// leader. Returns the index assigned to the entry, which is *not* yet
    /// committed when this returns.
    pub fn submit(&mut self, payload: Bytes, out: &mut Output) -> Result<LogIndex> {
        self.check_output(out)?;
        let expected = self.config.log_entry_size - TERM_SIZE;
        if payload.len() != expected {
            return Err(Error::Payload {
                expected,
                actual: payload.len(),
            });
        }
        if !self.is_leader() {
            return Err(Error::NotLeader {
                leader: self.leader_hint.clone(),
            });
        }
        let term = self.current_term();
        let index = {
            let store = self.store_mut()?;
            let index = store.last_log_index() + 1;
            store.append(index, &[LogEntry { term, payload }])?;
            index
        };
        debug!(
            "[{}] submitted entry {} at term {}",
            self.config.local_id, index, term
        );
        let peers: Vec<ReplicaId> = self.peers.iter().cloned().collect();
        for peer in &peers {
            self.replicate_to(peer, out)?;
        }
        self.advance_commit(out)?;
        Ok(index)
    }

    /// Tears the replica down and deletes its log file. Destructive:
    /// meant for tests, never for production hosts.
    pub fn shutdown(mut self) {
        if let Some(store) = self.store.take() {
            if let Err(err) = store.remove() {
                warn!("[{}] failed to remove log: {}", self.config.local_id, err);
            }
        }
    }

    //
    // read-only accessors
    //

    /// This replica's name.
    pub fn local_id(&self) -> &ReplicaId {
        &self.config.local_id
    }

    /// Whether this replica currently leads its term.
    pub fn is_leader(&self) -> bool {
        matches!(self.role, Role::Leader { .. })
    }

    /// The best-known leader: this replica when leading, otherwise the
    /// last leader heard from in the current term, if any.
    pub fn leader(&self) -> Option<&ReplicaId> {
        match self.role {
            Role::Leader { .. } => Some(&self.config.local_id),
            _ => self.leader_hint.as_ref(),
        }
    }

    /// The current term. `0` before [`init`](Self::init).
    pub fn current_term(&self) -> Term {
        self.store.as_ref().map(LogStore::current_term).unwrap_or(0)
    }

    /// The vote recorded for the current term, or `""` if none.
    pub fn voted_for(&self) -> &str {
        self.store.as_ref().map(LogStore::voted_for).unwrap_or("")
    }

    /// Index of the highest entry known to be committed.
    pub fn commit_index(&self) -> LogIndex {
        self.commit_index
    }

    /// Index of the last entry in the local log.
    pub fn last_log_index(&self) -> LogIndex {
        self.store.as_ref().map(LogStore::last_log_index).unwrap_or(0)
    }

    /// Term of the last entry in the local log.
    pub fn last_log_term(&self) -> Term {
        self.store.as_ref().map(LogStore::last_log_term).unwrap_or(0)
    }

    /// Reads the term of the entry at `index` from the local log.
    pub fn entry_term(&mut self, index: LogIndex) -> Result<Term> {
        self.store_mut()?.read_entry_term(index)
    }

    /// The number of replicas, including this one, forming a majority.
    pub fn quorum(&self) -> usize {
        (self.peers.len() + 1) / 2 + 1
    }

    /// The `(next_index, match_index)` this replica tracks for `peer`,
    /// when it is the leader.
    pub fn replication_state(&self, peer: &str) -> Option<(LogIndex, LogIndex)> {
        match &self.role {
            Role::Leader { followers } => followers
                .get(peer)
                .map(|replication| (replication.next_index, replication.match_index)),
            _ => None,
        }
    }

    //
    // internals
    //

    fn check_output(&self, out: &Output) -> Result<()> {
        if out.is_empty() {
            Ok(())
        } else {
            Err(Error::OutputMisuse)
        }
    }

    fn store_mut(&mut self) -> Result<&mut LogStore> {
        self.store
            .as_mut()
            .ok_or_else(|| Error::Config("replica not initialized".to_owned()))
    }

    fn switch_role(&mut self, next: Role) {
        if mem::discriminant(&self.role) != mem::discriminant(&next) {
            info!(
                "[{}] switching {} -> {}",
                self.config.local_id,
                self.role.name(),
                next.name()
            );
        }
        self.role = next;
    }

    fn random_election_ticks(&mut self) -> u32 {
        let span = self.config.election_max_ticks - self.config.election_min_ticks + 1;
        self.config.election_min_ticks + self.random.next_u32() % span
    }

    fn arm_election_timer(&mut self, out: &mut Output) {
        let ticks = self.random_election_ticks();
        out.timer_commands.push(TimerCmd {
            timer: TimerKind::Election,
            action: TimerAction::Set(ticks),
        });
    }

    /// Runs on every inbound message before any other processing: a term
    /// newer than ours durably bumps `current_term`, durably clears the
    /// vote and demotes to follower. Returns whether it fired.
    fn catch_up_term(&mut self, term: Term, out: &mut Output) -> Result<bool> {
        let current = self.current_term();
        if term <= current {
            return Ok(false);
        }
        info!(
            "[{}] term {} -> {}, back to follower",
            self.config.local_id, current, term
        );
        {
            let store = self.store_mut()?;
            store.set_current_term(term)?;
            store.set_voted_for("")?;
        }
        if let Role::Leader { .. } = self.role {
            out.timer_commands.push(TimerCmd {
                timer: TimerKind::Heartbeat,
                action: TimerAction::Stop,
            });
        }
        self.switch_role(Role::Follower);
        self.leader_hint = None;
        self.arm_election_timer(out);
        Ok(true)
    }

    fn start_election(&mut self, out: &mut Output) -> Result<()> {
        self.switch_role(Role::Candidate { votes_collected: 1 });
        self.leader_hint = None;
        let (new_term, last_log_index, last_log_term);
        {
            let local = self.config.local_id.clone();
            let store = self.store_mut()?;
            new_term = store.current_term() + 1;
            store.set_current_term(new_term)?;
            store.set_voted_for(&local)?;
            last_log_index = store.last_log_index();
            last_log_term = store.last_log_term();
        }
        info!(
            "[{}] starting election for term {}",
            self.config.local_id, new_term
        );
        self.arm_election_timer(out);
        for peer in &self.peers {
            out.messages.push((
                peer.clone(),
                Message::RequestVote(RequestVote {
                    term: new_term,
                    candidate_id: self.config.local_id.clone(),
                    last_log_index,
                    last_log_term,
                }),
            ));
        }
        // Our own vote is a quorum in a single-replica cluster.
        if 1 >= self.quorum() {
            self.become_leader(out)?;
        }
        Ok(())
    }

    fn become_leader(&mut self, out: &mut Output) -> Result<()> {
        let next = self.store_mut()?.last_log_index() + 1;
        let followers = self
            .peers
            .iter()
            .cloned()
            .map(|peer| {
                (
                    peer,
                    Replication {
                        next_index: next,
                        match_index: 0,
                    },
                )
            })
            .collect();
        self.switch_role(Role::Leader { followers });
        self.leader_hint = None;
        info!(
            "[{}] became leader at term {}",
            self.config.local_id,
            self.current_term()
        );
        out.timer_commands.push(TimerCmd {
            timer: TimerKind::Election,
            action: TimerAction::Stop,
        });
        out.timer_commands.push(TimerCmd {
            timer: TimerKind::Heartbeat,
            action: TimerAction::Set(self.config.heartbeat_ticks),
        });
        let peers: Vec<ReplicaId> = self.peers.iter().cloned().collect();
        for peer in &peers {
            self.replicate_to(peer, out)?;
        }
        Ok(())
    }

    /// Emits one append request to `peer` carrying up to a batch of
    /// entries from its `next_index`, or an empty heartbeat when the peer
    /// is up to date.
    fn replicate_to(&mut self, peer: &ReplicaId, out: &mut Output) -> Result<()> {
        let next = match &self.role {
            Role::Leader { followers } => match followers.get(peer) {
                Some(replication) => replication.next_index,
                None => return Ok(()),
            },
            _ => return Ok(()),
        };
        let term = self.current_term();
        let leader_commit = self.commit_index;
        let batch = self.config.replication_batch;
        let leader_id = self.config.local_id.clone();
        let store = self.store_mut()?;
        let prev_log_index = next - 1;
        let prev_log_term = if prev_log_index == 0 {
            0
        } else {
            store.read_entry_term(prev_log_index)?
        };
        let last = store.last_log_index();
        let mut entries = Vec::new();
        let mut index = next;
        while index <= last && entries.len() < batch {
            entries.push(store.read_entry(index)?);
            index += 1;
        }
        out.messages.push((
            peer.clone(),
            Message::AppendEntries(AppendEntries {
                term,
                leader_id,
                prev_log_index,
                prev_log_term,
                entries,
                leader_commit,
            }),
        ));
        Ok(())
    }

    /// Advances `commit_index` to the highest index replicated on a
    /// majority whose entry carries the current term, then emits the newly
    /// committed entries.
    fn advance_commit(&mut self, out: &mut Output) -> Result<()> {
        let quorum = self.quorum();
        let last = self.last_log_index();
        let candidate = match &self.role {
            Role::Leader { followers } => {
                let mut match_indexes: Vec<LogIndex> = followers
                    .values()
                    .map(|replication| replication.match_index)
                    .collect();
                match_indexes.push(last);
                match_indexes.sort_unstable();
                match_indexes[match_indexes.len() - quorum]
            }
            _ => return Ok(()),
        };
        if candidate <= self.commit_index {
            return Ok(());
        }
        // Only an entry of the current term may establish the commit
        // point; earlier entries ride along (Raft section 5.4.2).
        let current = self.current_term();
        if self.store_mut()?.read_entry_term(candidate)? != current {
            return Ok(());
        }
        debug!(
            "[{}] commit {} -> {}",
            self.config.local_id, self.commit_index, candidate
        );
        self.commit_index = candidate;
        self.apply_committed(out)
    }

    /// Hands every newly committed entry to the host, in index order, each
    /// exactly once.
    fn apply_committed(&mut self, out: &mut Output) -> Result<()> {
        while self.last_applied < self.commit_index {
            let index = self.last_applied + 1;
            let entry = self.store_mut()?.read_entry(index)?;
            out.applied.push((index, entry.payload));
            self.last_applied = index;
        }
        Ok(())
    }
}

impl<R> fmt::Debug for RaftSm<R> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("RaftSm")
            .field("local_id", &self.config.local_id)
            .field("role", &self.role.name())
            .field("commit_index", &self.commit_index)
            .field("last_applied", &self.last_applied)
            .finish()
    }
}

fn check_replica_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::Config("replica id must not be empty".to_owned()));
    }
    if id.len() >= VOTED_FOR_SIZE {
        return Err(Error::Config(format!(
            "replica id {:?} exceeds {} bytes",
            id,
            VOTED_FOR_SIZE - 1
        )));
    }
    Ok(())
}
