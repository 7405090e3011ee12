//! The output bundle filled by every input fed to a replica.
//!
//! The replica performs no I/O of its own besides the durable log writes.
//! Every reaction to an input (messages to peers, timer commands, entries
//! ready for the application) is collected into an [`Output`] that the
//! host hands in empty and drains on return.

use bytes::Bytes;

use crate::message::{LogIndex, Message, ReplicaId};

/// The timers a replica asks its host to maintain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    /// Fires when no leader has been heard from for too long.
    Election,

    /// Fires on the leader to trigger the next round of (possibly empty)
    /// append requests.
    Heartbeat,
}

/// What to do with a timer. Timers are one-shot: `Set` replaces any pending
/// expiry, `Stop` cancels it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAction {
    /// Arm the timer to fire after the given number of host ticks.
    Set(u32),

    /// Cancel the timer.
    Stop,
}

/// A command for the host's timer service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerCmd {
    /// Which timer the command addresses.
    pub timer: TimerKind,

    /// What to do with it.
    pub action: TimerAction,
}

/// Everything a replica produced in reaction to one input.
///
/// The host must construct the bundle empty, feed exactly one input, then
/// send all `messages`, execute all `timer_commands` and hand all `applied`
/// entries to the application before delivering the next input. Within one
/// bundle the order is the order of production; a durable state change is
/// always flushed before the message depending on it is appended.
#[derive(Debug, Default)]
pub struct Output {
    /// Messages to ship, each with its destination replica.
    pub messages: Vec<(ReplicaId, Message)>,

    /// Commands for the host's timer service, to execute in order.
    pub timer_commands: Vec<TimerCmd>,

    /// Committed entries to hand to the application, in log order. Each
    /// index is reported at most once per replica lifetime.
    pub applied: Vec<(LogIndex, Bytes)>,
}

impl Output {
    /// Constructs an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the bundle carries nothing. Input methods require
    /// this on entry.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.timer_commands.is_empty() && self.applied.is_empty()
    }
}
