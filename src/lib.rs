//! An embeddable implementation of the [Raft](https://raft.github.io/)
//! distributed consensus protocol with a crash-safe, fixed-record on-disk
//! log.
//!
//! The crate provides a single component, the replica state machine
//! [`RaftSm`]. It performs no network I/O and starts no threads: the host
//! feeds it one input at a time, either an inbound message or a timer
//! expiry, and the replica fills an [`Output`] bundle with the messages
//! and timer commands to execute plus the committed entries to hand to
//! the application. Durable voting state and log entries live in a single
//! file managed by [`LogStore`]; every acknowledged mutation is flushed
//! before the reaction that depends on it leaves the replica, so a crash
//! never loses acknowledged state.
//!
//! # Driving a replica
//!
//! The host owns the transport and a tick-based timer service. It creates
//! the replica with [`RaftSm::new`], recovers or initializes its log with
//! [`RaftSm::init`], then serializes every inbound message and timer
//! expiry through the matching `*_input`/`timer_expired` method, draining
//! the output bundle after each call. Client commands enter through
//! [`RaftSm::submit`] on the leader; committed payloads come back through
//! `Output::applied` on every replica, in log order, exactly once.

pub mod error;
pub mod message;
pub mod output;
pub mod replica;
pub mod store;

pub use crate::error::{Error, Result};
pub use crate::message::{
    AppendEntries, AppendEntriesResp, LogEntry, LogIndex, Message, ReplicaId, RequestVote,
    RequestVoteResp, Term,
};
pub use crate::output::{Output, TimerAction, TimerCmd, TimerKind};
pub use crate::replica::{Config, RaftSm};
pub use crate::store::LogStore;
