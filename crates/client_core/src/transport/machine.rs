use std::time::Duration;

use shared::domain::ConnectionState;

use crate::retry::RetryPolicy;

/// What the worker should do after a connection ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    RetryAfter(Duration),
    GiveUp,
}

/// Connection lifecycle: `Connecting -> Open -> Closed -> Connecting ...`.
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    policy: RetryPolicy,
    failed_attempts: u32,
}

impl ConnectionMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            state: ConnectionState::Connecting,
            policy,
            failed_attempts: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Handshake succeeded.
    pub fn opened(&mut self) -> ConnectionState {
        self.failed_attempts = 0;
        self.state = ConnectionState::Open;
        self.state
    }

    /// Any termination: failed handshake, error or normal close.
    pub fn closed(&mut self) -> NextStep {
        self.state = ConnectionState::Closed;
        self.failed_attempts = self.failed_attempts.saturating_add(1);
        match self.policy.delay_for(self.failed_attempts) {
            Some(delay) => NextStep::RetryAfter(delay),
            None => NextStep::GiveUp,
        }
    }

    /// Retry timer fired.
    pub fn retrying(&mut self) -> ConnectionState {
        self.state = ConnectionState::Connecting;
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_connecting_open_closed_connecting() {
        let mut machine = ConnectionMachine::new(RetryPolicy::default());
        assert_eq!(machine.state(), ConnectionState::Connecting);
        assert_eq!(machine.opened(), ConnectionState::Open);
        assert_eq!(
            machine.closed(),
            NextStep::RetryAfter(Duration::from_secs(2))
        );
        assert_eq!(machine.state(), ConnectionState::Closed);
        assert_eq!(machine.retrying(), ConnectionState::Connecting);
    }

    #[test]
    fn successful_open_resets_failure_count() {
        let policy = RetryPolicy::exponential(Duration::from_millis(100), Duration::from_secs(5));
        let mut machine = ConnectionMachine::new(policy);
        machine.closed();
        machine.retrying();
        assert_eq!(
            machine.closed(),
            NextStep::RetryAfter(Duration::from_millis(200))
        );
        machine.retrying();
        machine.opened();
        assert_eq!(machine.failed_attempts(), 0);
        assert_eq!(
            machine.closed(),
            NextStep::RetryAfter(Duration::from_millis(100))
        );
    }

    #[test]
    fn bounded_policy_stops_retrying() {
        let policy = RetryPolicy::fixed(Duration::from_millis(1)).with_max_attempts(Some(1));
        let mut machine = ConnectionMachine::new(policy);
        assert!(matches!(machine.closed(), NextStep::RetryAfter(_)));
        machine.retrying();
        assert_eq!(machine.closed(), NextStep::GiveUp);
    }
}
