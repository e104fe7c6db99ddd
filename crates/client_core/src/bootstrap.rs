//! Push of the panel's displayed state to the controller once a connection is
//! up, so the actuators match what the panel shows.

use std::time::{Duration, Instant};

use serde::Deserialize;
use shared::domain::{ConnectionState, StepperDirection};

pub const DEFAULT_BOOTSTRAP_POLL: Duration = Duration::from_millis(400);
/// Direction carried by the first burst.
pub const DEFAULT_BOOTSTRAP_DIRECTION: StepperDirection = StepperDirection::Clockwise;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapPolicy {
    /// Re-send after every reconnect; a restarted controller has no state.
    #[default]
    EveryOpen,
    FirstOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapDecision {
    Idle,
    /// Armed but the connection is not open yet; check again later.
    Wait,
    /// Send the burst now. `first` is set for the very first burst.
    Fire { first: bool },
}

#[derive(Debug, Clone)]
pub struct BootstrapSync {
    policy: BootstrapPolicy,
    poll_interval: Duration,
    armed: bool,
    next_check: Option<Instant>,
    bursts: u32,
}

impl BootstrapSync {
    /// Starts armed: the first open always bootstraps.
    pub fn new(policy: BootstrapPolicy, poll_interval: Duration) -> Self {
        Self {
            policy,
            poll_interval,
            armed: true,
            next_check: None,
            bursts: 0,
        }
    }

    pub fn policy(&self) -> BootstrapPolicy {
        self.policy
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn bursts_sent(&self) -> u32 {
        self.bursts
    }

    /// The connection went away; the next open owes a burst under
    /// [`BootstrapPolicy::EveryOpen`]. Re-arming while armed is a no-op.
    pub fn connection_lost(&mut self) {
        if self.armed || self.bursts == 0 {
            return;
        }
        if self.policy == BootstrapPolicy::EveryOpen {
            self.armed = true;
            self.next_check = None;
        }
    }

    /// Poll-until-open timer. Call on every event loop turn.
    pub fn poll(&mut self, now: Instant, state: ConnectionState) -> BootstrapDecision {
        if !self.armed {
            return BootstrapDecision::Idle;
        }
        if let Some(next_check) = self.next_check {
            if now < next_check {
                return BootstrapDecision::Wait;
            }
        }
        if !state.is_open() {
            self.next_check = Some(now + self.poll_interval);
            return BootstrapDecision::Wait;
        }

        let first = self.bursts == 0;
        self.armed = false;
        self.next_check = None;
        self.bursts += 1;
        BootstrapDecision::Fire { first }
    }

    /// When the next check is due, if armed.
    pub fn next_check(&self) -> Option<Instant> {
        self.armed.then_some(self.next_check).flatten()
    }
}
