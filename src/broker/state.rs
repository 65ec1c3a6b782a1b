//! Broker FSM state definitions
//!
//! One state machine instance per cross-node transfer request, keyed by
//! transaction id. Terminal states: COMMITTED, COMPENSATED, REJECTED.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrokerState {
    /// Request received, amount not yet validated.
    Received,

    /// Both home-node balances queried, origin covers the amount.
    BalanceVerified,

    /// Leg commits in flight on both nodes. A concurrent balance read can
    /// observe one committed leg without the other during this window.
    LegsCommitting,

    /// Terminal: both legs committed.
    Committed,

    /// A leg failed its retry budget; deletes going out to both nodes.
    Compensating,

    /// Terminal: compensation attempted on both nodes (best effort).
    Compensated,

    /// Terminal: rejected before any write occurred.
    Rejected,
}

impl BrokerState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BrokerState::Committed | BrokerState::Compensated | BrokerState::Rejected
        )
    }

    /// Is at least one leg possibly written while the outcome is open?
    #[inline]
    pub fn is_in_flight(&self) -> bool {
        matches!(self, BrokerState::LegsCommitting | BrokerState::Compensating)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BrokerState::Received => "RECEIVED",
            BrokerState::BalanceVerified => "BALANCE_VERIFIED",
            BrokerState::LegsCommitting => "LEGS_COMMITTING",
            BrokerState::Committed => "COMMITTED",
            BrokerState::Compensating => "COMPENSATING",
            BrokerState::Compensated => "COMPENSATED",
            BrokerState::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for BrokerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(BrokerState::Committed.is_terminal());
        assert!(BrokerState::Compensated.is_terminal());
        assert!(BrokerState::Rejected.is_terminal());

        assert!(!BrokerState::Received.is_terminal());
        assert!(!BrokerState::BalanceVerified.is_terminal());
        assert!(!BrokerState::LegsCommitting.is_terminal());
        assert!(!BrokerState::Compensating.is_terminal());
    }

    #[test]
    fn test_in_flight_states() {
        assert!(BrokerState::LegsCommitting.is_in_flight());
        assert!(BrokerState::Compensating.is_in_flight());
        assert!(!BrokerState::Received.is_in_flight());
        assert!(!BrokerState::Committed.is_in_flight());
    }

    #[test]
    fn test_display() {
        assert_eq!(BrokerState::Received.to_string(), "RECEIVED");
        assert_eq!(BrokerState::LegsCommitting.to_string(), "LEGS_COMMITTING");
        assert_eq!(BrokerState::Compensated.to_string(), "COMPENSATED");
    }
}
