//! Latest-request-wins coordination per channel.
//!
//! Every `issue` bumps the channel's generation. When work completes, its
//! captured generation is compared with the live one and the result is only
//! applied on a match. Superseded work is aborted when possible, but the
//! generation check alone decides what gets applied.

use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::task::AbortHandle;
use tracing::debug;

/// An independent coordination lane, e.g. text search or map panning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel(&'static str);

impl Channel {
    pub const SEARCH: Channel = Channel("search");
    pub const LOCATION: Channel = Channel("location");
    pub const MAP: Channel = Channel("map");

    pub const fn new(name: &'static str) -> Self {
        Channel(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Monotonic request marker within one channel. Generation 0 means nothing
/// has been issued yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of the most recent request on a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Pending(Generation),
    Applied(Generation),
    Discarded(Generation),
    Failed(Generation),
}

#[derive(Debug)]
struct Timer {
    seq: u64,
    handle: AbortHandle,
}

#[derive(Debug, Default)]
struct ChannelState {
    current: Generation,
    phase: Phase,
    in_flight: Option<AbortHandle>,
    timer: Option<Timer>,
    timer_seq: u64,
}

impl ChannelState {
    /// Retire whatever is in flight and hand out the next generation.
    fn supersede(&mut self, abort: bool) -> Generation {
        if let Phase::Pending(previous) = self.phase {
            self.phase = Phase::Discarded(previous);
        }
        if let Some(handle) = self.in_flight.take() {
            if abort {
                handle.abort();
            }
        }
        self.current = self.current.next();
        self.current
    }

    fn clear_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.handle.abort();
        }
    }
}

type Slot = Arc<Mutex<ChannelState>>;

fn lock(slot: &Mutex<ChannelState>) -> MutexGuard<'_, ChannelState> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the per-channel generation tokens, in-flight tasks and debounce timers.
///
/// Cloning is cheap and clones share state. Separate instances are fully
/// independent.
#[derive(Clone)]
pub struct RequestCoordinator {
    channels: Arc<Mutex<HashMap<Channel, Slot>>>,
    abort_superseded: bool,
}

impl fmt::Debug for RequestCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCoordinator")
            .field("abort_superseded", &self.abort_superseded)
            .finish_non_exhaustive()
    }
}

impl Default for RequestCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestCoordinator {
    pub fn new() -> Self {
        Self {
            channels: Arc::default(),
            abort_superseded: true,
        }
    }

    /// Let superseded work run to completion; its result is still discarded.
    pub fn without_abort() -> Self {
        Self {
            abort_superseded: false,
            ..Self::new()
        }
    }

    fn slot(&self, channel: Channel) -> Slot {
        let mut channels = self
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(channels.entry(channel).or_default())
    }

    pub fn current(&self, channel: Channel) -> Generation {
        lock(&self.slot(channel)).current
    }

    pub fn phase(&self, channel: Channel) -> Phase {
        lock(&self.slot(channel)).phase
    }

    /// Start `work` as the newest request on `channel`.
    ///
    /// `apply` receives the outcome only if no newer request was issued on
    /// the channel in the meantime. It runs with the channel locked, so it
    /// must not call back into this coordinator for the same channel.
    pub fn issue<T, E, W, A>(&self, channel: Channel, work: W, apply: A) -> Generation
    where
        T: Send + 'static,
        E: Send + 'static,
        W: Future<Output = Result<T, E>> + Send + 'static,
        A: FnOnce(Result<T, E>) + Send + 'static,
    {
        self.issue_with_start(channel, |_| {}, work, apply)
    }

    /// Like [`issue`](Self::issue), but `start` runs under the channel lock
    /// right after the new generation is taken. Nothing from an older
    /// request can be applied between `start` and the new request.
    pub fn issue_with_start<T, E, S, W, A>(&self, channel: Channel, start: S, work: W, apply: A) -> Generation
    where
        T: Send + 'static,
        E: Send + 'static,
        S: FnOnce(Generation),
        W: Future<Output = Result<T, E>> + Send + 'static,
        A: FnOnce(Result<T, E>) + Send + 'static,
    {
        let slot = self.slot(channel);
        let mut state = lock(&slot);
        let token = state.supersede(self.abort_superseded);
        state.phase = Phase::Pending(token);
        start(token);

        let task_slot = Arc::clone(&slot);
        let handle = tokio::spawn(async move {
            let outcome = work.await;

            let mut state = lock(&task_slot);
            if state.current != token {
                debug!(%channel, %token, live = %state.current, "discarding stale result");
                return;
            }

            state.in_flight = None;
            state.phase = match outcome {
                Ok(_) => Phase::Applied(token),
                Err(_) => Phase::Failed(token),
            };
            apply(outcome);
        });

        state.in_flight = Some(handle.abort_handle());
        debug!(%channel, %token, "issued request");
        token
    }

    /// Run `action` once `delay` passes without another trigger on `channel`.
    ///
    /// Each call cancels the previously scheduled action.
    pub fn debounce<F>(&self, channel: Channel, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let slot = self.slot(channel);
        let mut state = lock(&slot);
        state.clear_timer();
        state.timer_seq += 1;
        let seq = state.timer_seq;

        let timer_slot = Arc::clone(&slot);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let due = {
                let mut state = lock(&timer_slot);
                match &state.timer {
                    Some(timer) if timer.seq == seq => {
                        state.timer = None;
                        true
                    }
                    _ => false,
                }
            };
            if due {
                action();
            }
        });

        state.timer = Some(Timer {
            seq,
            handle: handle.abort_handle(),
        });
    }

    /// Drop the pending debounce timer and retire any in-flight request
    /// without issuing a new one.
    pub fn cancel(&self, channel: Channel) {
        let slot = self.slot(channel);
        let mut state = lock(&slot);
        state.clear_timer();
        if matches!(state.phase, Phase::Pending(_)) || state.in_flight.is_some() {
            let retired = state.supersede(self.abort_superseded);
            debug!(%channel, live = %retired, "cancelled channel");
        }
    }

    /// Whether a debounced action is still waiting on `channel`.
    pub fn has_pending_timer(&self, channel: Channel) -> bool {
        lock(&self.slot(channel)).timer.is_some()
    }
}
