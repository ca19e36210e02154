//! Connection state machine.
//!
//! Pure: every transport callback, timer and API call becomes a
//! [`ConnectionEvent`]; [`ConnectionMachine::handle`] updates the state and
//! returns the [`Effect`]s the driver must perform. No I/O happens here.

use crate::endpoint::Endpoint;
use crate::types::constants::{DEFAULT_MAX_ATTEMPTS_PER_ENDPOINT, DEFAULT_RECONNECT_DELAY};
use std::time::Duration;

/// Lifecycle of the real-time connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Idle,
    Resolving,
    Connecting,
    Open,
    Closed,
    Errored,
    Reconnecting,
    /// Every candidate exhausted; stays here until the next `connect`
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Errored => "errored",
            Self::Reconnecting => "reconnecting",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-endpoint retry budget and the fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts_per_endpoint: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts_per_endpoint: DEFAULT_MAX_ATTEMPTS_PER_ENDPOINT,
            delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY),
        }
    }
}

/// Inputs to the machine.
///
/// Transport and timer events carry the generation they were issued for;
/// anything from a superseded generation is ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    ConnectRequested,
    DisconnectRequested,
    Resolved(Vec<Endpoint>),
    Opened { generation: u64 },
    Closed { generation: u64 },
    Errored { generation: u64, reason: String },
    RetryTimerFired { generation: u64 },
}

/// Work the driver performs on behalf of the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ResolveEndpoints,
    OpenTransport { endpoint: Endpoint, generation: u64 },
    SendAuth,
    ScheduleRetry { delay: Duration, generation: u64 },
    CancelRetry,
    CloseTransport,
    NotifyFailure,
}

pub struct ConnectionMachine {
    state: ConnectionState,
    policy: RetryPolicy,
    candidates: Vec<Endpoint>,
    index: usize,
    attempts: u32,
    generation: u64,
    failure_notified: bool,
}

impl ConnectionMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            state: ConnectionState::Idle,
            policy,
            candidates: Vec::new(),
            index: 0,
            attempts: 0,
            generation: 0,
            failure_notified: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn candidates(&self) -> &[Endpoint] {
        &self.candidates
    }

    pub fn current_endpoint(&self) -> Option<&Endpoint> {
        self.candidates.get(self.index)
    }

    /// Retries already spent on the current endpoint
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn handle(&mut self, event: ConnectionEvent) -> Vec<Effect> {
        match event {
            ConnectionEvent::ConnectRequested => self.on_connect_requested(),
            ConnectionEvent::DisconnectRequested => self.on_disconnect_requested(),
            ConnectionEvent::Resolved(candidates) => self.on_resolved(candidates),
            ConnectionEvent::Opened { generation } => self.on_opened(generation),
            ConnectionEvent::Closed { generation } => {
                self.on_transport_down(generation, ConnectionState::Closed, "closed")
            }
            ConnectionEvent::Errored { generation, reason } => {
                self.on_transport_down(generation, ConnectionState::Errored, &reason)
            }
            ConnectionEvent::RetryTimerFired { generation } => self.on_retry_timer(generation),
        }
    }

    fn on_connect_requested(&mut self) -> Vec<Effect> {
        match self.state {
            ConnectionState::Resolving
            | ConnectionState::Connecting
            | ConnectionState::Open
            | ConnectionState::Reconnecting => {
                tracing::debug!("Connect requested while {}, ignoring", self.state);
                Vec::new()
            }
            ConnectionState::Idle
            | ConnectionState::Failed
            | ConnectionState::Closed
            | ConnectionState::Errored => {
                self.reset();
                self.transition(ConnectionState::Resolving);
                vec![Effect::ResolveEndpoints]
            }
        }
    }

    fn on_disconnect_requested(&mut self) -> Vec<Effect> {
        let effects = match self.state {
            ConnectionState::Idle => return Vec::new(),
            ConnectionState::Reconnecting => vec![Effect::CancelRetry],
            ConnectionState::Connecting | ConnectionState::Open => vec![Effect::CloseTransport],
            _ => Vec::new(),
        };

        // Invalidates events still in flight from the old transport
        self.generation += 1;
        self.reset();
        self.transition(ConnectionState::Idle);
        effects
    }

    fn on_resolved(&mut self, candidates: Vec<Endpoint>) -> Vec<Effect> {
        if self.state != ConnectionState::Resolving {
            tracing::debug!("Discarding endpoint list resolved while {}", self.state);
            return Vec::new();
        }

        if candidates.is_empty() {
            tracing::error!("No real-time endpoint could be resolved");
            return self.fail();
        }

        self.candidates = candidates;
        self.index = 0;
        self.attempts = 0;
        self.open_current()
    }

    fn on_opened(&mut self, generation: u64) -> Vec<Effect> {
        if !self.is_current(generation) || self.state != ConnectionState::Connecting {
            return Vec::new();
        }

        // A server that upgrades and then drops at once (e.g. rejecting the
        // auth frame) keeps a full budget: it is retried every delay and the
        // cycle never advances past it or reaches Failed.
        self.attempts = 0;
        self.transition(ConnectionState::Open);
        vec![Effect::SendAuth]
    }

    fn on_transport_down(
        &mut self,
        generation: u64,
        next: ConnectionState,
        reason: &str,
    ) -> Vec<Effect> {
        if !self.is_current(generation)
            || !matches!(
                self.state,
                ConnectionState::Connecting | ConnectionState::Open
            )
        {
            return Vec::new();
        }

        if let Some(endpoint) = self.current_endpoint() {
            tracing::warn!("Connection to {} went down: {}", endpoint, reason);
        }
        self.transition(next);
        self.schedule_retry()
    }

    fn on_retry_timer(&mut self, generation: u64) -> Vec<Effect> {
        if !self.is_current(generation) || self.state != ConnectionState::Reconnecting {
            return Vec::new();
        }
        self.open_current()
    }

    fn schedule_retry(&mut self) -> Vec<Effect> {
        if self.attempts < self.policy.max_attempts_per_endpoint {
            self.attempts += 1;
            tracing::info!(
                "Retrying {} (attempt {}/{})",
                self.current_endpoint().map(Endpoint::as_str).unwrap_or("-"),
                self.attempts,
                self.policy.max_attempts_per_endpoint
            );
        } else if self.index + 1 < self.candidates.len() {
            self.index += 1;
            self.attempts = 0;
            tracing::info!(
                "Retry budget exhausted, moving to candidate {}/{}",
                self.index + 1,
                self.candidates.len()
            );
        } else {
            tracing::error!(
                "All {} real-time endpoints exhausted",
                self.candidates.len()
            );
            return self.fail();
        }

        self.transition(ConnectionState::Reconnecting);
        vec![Effect::ScheduleRetry {
            delay: self.policy.delay,
            generation: self.generation,
        }]
    }

    fn open_current(&mut self) -> Vec<Effect> {
        let Some(endpoint) = self.candidates.get(self.index).cloned() else {
            return self.fail();
        };

        self.generation += 1;
        self.transition(ConnectionState::Connecting);
        vec![Effect::OpenTransport {
            endpoint,
            generation: self.generation,
        }]
    }

    fn fail(&mut self) -> Vec<Effect> {
        self.transition(ConnectionState::Failed);
        if self.failure_notified {
            return Vec::new();
        }
        self.failure_notified = true;
        vec![Effect::NotifyFailure]
    }

    fn reset(&mut self) {
        self.candidates.clear();
        self.index = 0;
        self.attempts = 0;
        self.failure_notified = false;
    }

    fn is_current(&self, generation: u64) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "Ignoring event from generation {} (current {})",
                generation,
                self.generation
            );
            return false;
        }
        true
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state != next {
            tracing::info!("Real-time connection: {} -> {}", self.state, next);
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{PageLocation, PathRewrite, normalize_endpoint};

    fn endpoint(raw: &str) -> Endpoint {
        let page = PageLocation::new(false, "localhost", Some(5173));
        normalize_endpoint(raw, &page, PathRewrite::ChannelSuffix).unwrap()
    }

    fn machine(max_attempts: u32) -> ConnectionMachine {
        ConnectionMachine::new(RetryPolicy {
            max_attempts_per_endpoint: max_attempts,
            delay: Duration::from_millis(500),
        })
    }

    /// Drives a machine to `Connecting` on the first of `candidates`.
    fn start(machine: &mut ConnectionMachine, candidates: Vec<Endpoint>) -> u64 {
        assert_eq!(
            machine.handle(ConnectionEvent::ConnectRequested),
            vec![Effect::ResolveEndpoints]
        );
        let effects = machine.handle(ConnectionEvent::Resolved(candidates));
        match effects.as_slice() {
            [Effect::OpenTransport { generation, .. }] => *generation,
            other => panic!("expected a single open, got {other:?}"),
        }
    }

    fn fail_current(machine: &mut ConnectionMachine) -> Vec<Effect> {
        machine.handle(ConnectionEvent::Errored {
            generation: machine.generation(),
            reason: "connection refused".into(),
        })
    }

    fn fire_timer(machine: &mut ConnectionMachine) -> Vec<Effect> {
        machine.handle(ConnectionEvent::RetryTimerFired {
            generation: machine.generation(),
        })
    }

    #[test]
    fn test_connect_resolve_open_handshake() {
        let mut machine = machine(3);
        let generation = start(&mut machine, vec![endpoint("localhost:3000")]);
        assert_eq!(machine.state(), ConnectionState::Connecting);

        let effects = machine.handle(ConnectionEvent::Opened { generation });
        assert_eq!(effects, vec![Effect::SendAuth]);
        assert_eq!(machine.state(), ConnectionState::Open);
    }

    #[test]
    fn test_connect_is_idempotent_while_busy() {
        let mut machine = machine(3);
        let generation = start(&mut machine, vec![endpoint("localhost:3000")]);

        assert!(machine.handle(ConnectionEvent::ConnectRequested).is_empty());
        assert_eq!(machine.state(), ConnectionState::Connecting);

        machine.handle(ConnectionEvent::Opened { generation });
        assert!(machine.handle(ConnectionEvent::ConnectRequested).is_empty());
        assert_eq!(machine.state(), ConnectionState::Open);
        assert_eq!(machine.generation(), generation);
    }

    #[test]
    fn test_connect_while_open_keeps_retry_counters() {
        let mut machine = machine(3);
        start(&mut machine, vec![endpoint("localhost:3000")]);
        fail_current(&mut machine);
        fire_timer(&mut machine);
        assert_eq!(machine.attempts(), 1);

        // Still connecting on the retried attempt: connect changes nothing
        assert!(machine.handle(ConnectionEvent::ConnectRequested).is_empty());
        assert_eq!(machine.attempts(), 1);

        // Opening resets the budget of the endpoint that worked
        let generation = machine.generation();
        machine.handle(ConnectionEvent::Opened { generation });
        assert_eq!(machine.attempts(), 0);
        assert!(machine.handle(ConnectionEvent::ConnectRequested).is_empty());
        assert_eq!(machine.attempts(), 0);
    }

    #[test]
    fn test_empty_resolution_fails_immediately_with_one_notification() {
        let mut machine = machine(3);
        machine.handle(ConnectionEvent::ConnectRequested);

        let effects = machine.handle(ConnectionEvent::Resolved(Vec::new()));
        assert_eq!(effects, vec![Effect::NotifyFailure]);
        assert_eq!(machine.state(), ConnectionState::Failed);
    }

    #[test]
    fn test_retry_budget_then_fallback_then_failure() {
        let first = endpoint("localhost:3000");
        let second = endpoint("localhost:5000");
        let mut machine = machine(3);
        start(&mut machine, vec![first.clone(), second.clone()]);

        let mut opened = vec![first.clone()];
        let mut notifications = 0;
        let mut failures = 0;

        while machine.state() != ConnectionState::Failed {
            failures += 1;
            for effect in fail_current(&mut machine) {
                match effect {
                    Effect::ScheduleRetry { delay, .. } => {
                        assert_eq!(delay, Duration::from_millis(500));
                        assert_eq!(machine.state(), ConnectionState::Reconnecting);
                    }
                    Effect::NotifyFailure => notifications += 1,
                    other => panic!("unexpected effect {other:?}"),
                }
            }
            if machine.state() == ConnectionState::Reconnecting {
                match fire_timer(&mut machine).as_slice() {
                    [Effect::OpenTransport { endpoint, .. }] => opened.push(endpoint.clone()),
                    other => panic!("expected reopen, got {other:?}"),
                }
            }
        }

        // Initial attempt plus three retries on each candidate
        let on_first = opened.iter().filter(|e| **e == first).count();
        let on_second = opened.iter().filter(|e| **e == second).count();
        assert_eq!((on_first, on_second), (4, 4));
        assert!(opened[..4].iter().all(|e| *e == first));
        assert_eq!(failures, 8);
        assert_eq!(notifications, 1);

        // Further silent failures do not notify again
        assert!(fail_current(&mut machine).is_empty());
        assert!(fire_timer(&mut machine).is_empty());
    }

    #[test]
    fn test_zero_budget_moves_straight_to_next_candidate() {
        let first = endpoint("localhost:3000");
        let second = endpoint("localhost:5000");
        let mut machine = machine(0);
        start(&mut machine, vec![first, second.clone()]);

        fail_current(&mut machine);
        assert_eq!(machine.current_endpoint(), Some(&second));
        fire_timer(&mut machine);

        assert_eq!(fail_current(&mut machine), vec![Effect::NotifyFailure]);
        assert_eq!(machine.state(), ConnectionState::Failed);
    }

    #[test]
    fn test_drop_after_open_retries_same_endpoint() {
        let first = endpoint("localhost:3000");
        let mut machine = machine(3);
        let generation = start(&mut machine, vec![first.clone(), endpoint("localhost:5000")]);
        machine.handle(ConnectionEvent::Opened { generation });

        let effects = machine.handle(ConnectionEvent::Closed { generation });
        assert!(matches!(effects.as_slice(), [Effect::ScheduleRetry { .. }]));
        assert_eq!(machine.current_endpoint(), Some(&first));
        assert_eq!(machine.attempts(), 1);
    }

    #[test]
    fn test_stale_events_are_ignored() {
        let mut machine = machine(3);
        let old = start(&mut machine, vec![endpoint("localhost:3000")]);
        fail_current(&mut machine);
        fire_timer(&mut machine);
        let current = machine.generation();
        assert_ne!(old, current);

        assert!(machine.handle(ConnectionEvent::Opened { generation: old }).is_empty());
        assert!(machine.handle(ConnectionEvent::Closed { generation: old }).is_empty());
        assert_eq!(machine.state(), ConnectionState::Connecting);

        assert_eq!(
            machine.handle(ConnectionEvent::Opened { generation: current }),
            vec![Effect::SendAuth]
        );
    }

    #[test]
    fn test_disconnect_resets_and_is_idempotent() {
        let mut machine = machine(3);
        let generation = start(&mut machine, vec![endpoint("localhost:3000")]);
        machine.handle(ConnectionEvent::Opened { generation });

        assert_eq!(
            machine.handle(ConnectionEvent::DisconnectRequested),
            vec![Effect::CloseTransport]
        );
        assert_eq!(machine.state(), ConnectionState::Idle);
        assert!(machine.candidates().is_empty());
        assert_eq!(machine.attempts(), 0);

        assert!(machine.handle(ConnectionEvent::DisconnectRequested).is_empty());

        // The old transport's close arrives late and is ignored
        assert!(machine.handle(ConnectionEvent::Closed { generation }).is_empty());
        assert_eq!(machine.state(), ConnectionState::Idle);
    }

    #[test]
    fn test_disconnect_while_reconnecting_cancels_timer() {
        let mut machine = machine(3);
        start(&mut machine, vec![endpoint("localhost:3000")]);
        fail_current(&mut machine);
        let pending = machine.generation();

        assert_eq!(
            machine.handle(ConnectionEvent::DisconnectRequested),
            vec![Effect::CancelRetry]
        );
        assert!(
            machine
                .handle(ConnectionEvent::RetryTimerFired {
                    generation: pending
                })
                .is_empty()
        );
        assert_eq!(machine.state(), ConnectionState::Idle);
    }

    #[test]
    fn test_reconnect_after_disconnect_restarts_from_first_candidate() {
        let first = endpoint("localhost:3000");
        let second = endpoint("localhost:5000");
        let mut machine = machine(0);
        start(&mut machine, vec![first.clone(), second.clone()]);
        fail_current(&mut machine);
        fire_timer(&mut machine);
        assert_eq!(machine.current_endpoint(), Some(&second));

        machine.handle(ConnectionEvent::DisconnectRequested);
        start(&mut machine, vec![first.clone(), second]);
        assert_eq!(machine.current_endpoint(), Some(&first));
    }

    #[test]
    fn test_connect_after_failure_starts_new_cycle_and_may_notify_again() {
        let mut machine = machine(0);
        start(&mut machine, vec![endpoint("localhost:3000")]);
        assert_eq!(fail_current(&mut machine), vec![Effect::NotifyFailure]);

        start(&mut machine, vec![endpoint("localhost:3000")]);
        assert_eq!(machine.state(), ConnectionState::Connecting);
        assert_eq!(fail_current(&mut machine), vec![Effect::NotifyFailure]);
    }

    #[test]
    fn test_late_resolution_after_disconnect_is_discarded() {
        let mut machine = machine(3);
        machine.handle(ConnectionEvent::ConnectRequested);
        machine.handle(ConnectionEvent::DisconnectRequested);

        assert!(
            machine
                .handle(ConnectionEvent::Resolved(vec![endpoint("localhost:3000")]))
                .is_empty()
        );
        assert_eq!(machine.state(), ConnectionState::Idle);
    }
}
