//! Raft message types exchanged between replicas.
//!
//! This module provides the data types for messages sent between replicas.
//! The top-level type is [`Message`]; the wire encoding is the host's
//! concern, only the field semantics are fixed here.

use core::fmt;

use bytes::Bytes;

/// An election epoch. Monotonically non-decreasing on every replica; each
/// term has at most one leader.
pub type Term = u32;

/// An opaque name uniquely identifying a replica. The empty string denotes
/// "no vote cast" in voting state.
pub type ReplicaId = String;

/// A 1-based index into the replicated log. Index `0` means "no entry".
pub type LogIndex = u64;

/// An entry in the replicated log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// The leadership term in which this entry was appended.
    pub term: Term,

    /// Fixed-size payload, exactly `log_entry_size - 4` bytes.
    pub payload: Bytes,
}

/// A message sent between replicas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// A candidate's request for a vote.
    RequestVote(RequestVote),

    /// A response to a [`RequestVote`], granting or denying the vote.
    RequestVoteResp(RequestVoteResp),

    /// A leader's request to append entries (or an empty heartbeat).
    AppendEntries(AppendEntries),

    /// A response to an [`AppendEntries`] request.
    AppendEntriesResp(AppendEntriesResp),
}

impl Message {
    /// The sender's term carried by every message kind.
    pub fn term(&self) -> Term {
        match self {
            Message::RequestVote(msg) => msg.term,
            Message::RequestVoteResp(msg) => msg.term,
            Message::AppendEntries(msg) => msg.term,
            Message::AppendEntriesResp(msg) => msg.term,
        }
    }
}

/// A request to obtain a vote in a leadership election.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestVote {
    /// The candidate's term.
    pub term: Term,

    /// The replica requesting the vote.
    pub candidate_id: ReplicaId,

    /// Index of the candidate's last log entry.
    pub last_log_index: LogIndex,

    /// Term of the candidate's last log entry.
    pub last_log_term: Term,
}

/// The response to a [`RequestVote`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestVoteResp {
    /// The responder's current term, for the candidate to catch up on.
    pub term: Term,

    /// Whether the vote was granted.
    pub vote_granted: bool,
}

/// A request to append entries to a replica's log. With no entries this is
/// the leader's heartbeat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppendEntries {
    /// The leader's term.
    pub term: Term,

    /// The replica acting as leader for `term`.
    pub leader_id: ReplicaId,

    /// Index of the log entry immediately preceding `entries`.
    pub prev_log_index: LogIndex,

    /// Term of the entry at `prev_log_index`, or `0` if it is `0`.
    pub prev_log_term: Term,

    /// Consecutive entries to append starting at `prev_log_index + 1`.
    pub entries: Vec<LogEntry>,

    /// The leader's commit index.
    pub leader_commit: LogIndex,
}

/// The response to an [`AppendEntries`] request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppendEntriesResp {
    /// The responder's current term, for the leader to catch up on.
    pub term: Term,

    /// The responding replica, so the leader can address its per-peer
    /// replication state.
    pub follower_id: ReplicaId,

    /// Whether the consistency check passed and the entries were stored.
    pub success: bool,

    /// On success, the last index up to which the responder's log is known
    /// to match the leader's. Lets the leader recover `next_index` fast.
    pub match_index: LogIndex,
}

//
// Display impls
//

impl fmt::Display for Message {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::RequestVote(msg) => fmt::Display::fmt(msg, fmt),
            Message::RequestVoteResp(msg) => fmt::Display::fmt(msg, fmt),
            Message::AppendEntries(msg) => fmt::Display::fmt(msg, fmt),
            Message::AppendEntriesResp(msg) => fmt::Display::fmt(msg, fmt),
        }
    }
}

impl fmt::Display for RequestVote {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            term,
            candidate_id,
            last_log_index,
            last_log_term,
        } = self;
        fmt.debug_struct("RequestVote")
            .field("term", term)
            .field("candidate_id", candidate_id)
            .field("last_log_index", last_log_index)
            .field("last_log_term", last_log_term)
            .finish()
    }
}

impl fmt::Display for RequestVoteResp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { term, vote_granted } = self;
        fmt.debug_struct("RequestVoteResp")
            .field("term", term)
            .field("vote_granted", vote_granted)
            .finish()
    }
}

impl fmt::Display for AppendEntries {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            term,
            leader_id,
            prev_log_index,
            prev_log_term,
            entries,
            leader_commit,
        } = self;
        fmt.debug_struct("AppendEntries")
            .field("term", term)
            .field("leader_id", leader_id)
            .field("prev_log_index", prev_log_index)
            .field("prev_log_term", prev_log_term)
            .field("entries", &entries.len())
            .field("leader_commit", leader_commit)
            .finish()
    }
}

impl fmt::Display for AppendEntriesResp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            term,
            follower_id,
            success,
            match_index,
        } = self;
        fmt.debug_struct("AppendEntriesResp")
            .field("term", term)
            .field("follower_id", follower_id)
            .field("success", success)
            .field("match_index", match_index)
            .finish()
    }
}
