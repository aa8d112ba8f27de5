//! Comprobante status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comprobante status in the emission lifecycle.
///
/// The valid transitions are:
/// - Pending → Sent (first submission attempt)
/// - Sent → Sent (resend after a transport failure)
/// - Sent → Accepted (authority accepted, artifact persisted)
/// - Sent → Rejected (authority rejected, reason persisted)
///
/// Accepted and Rejected are terminal; status never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComprobanteStatus {
    /// Sequence number reserved, authority not yet contacted.
    Pending,
    /// Submission attempted; outcome unknown or transport failed.
    Sent,
    /// Authority validated the document (immutable).
    Accepted,
    /// Authority rejected the document (immutable, number not reused).
    Rejected,
}

impl ComprobanteStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the comprobante reached a terminal outcome.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Checks whether moving from `self` to `to` is a legal transition.
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Sent)
                | (Self::Sent, Self::Sent | Self::Accepted | Self::Rejected)
        )
    }

    /// Validates a transition, returning the offending pair on failure.
    pub const fn ensure_transition(self, to: Self) -> Result<(), InvalidTransition> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for ComprobanteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Illegal status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid state transition from {from} to {to}")]
pub struct InvalidTransition {
    /// Current status.
    pub from: ComprobanteStatus,
    /// Requested status.
    pub to: ComprobanteStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ComprobanteStatus::Pending,
            ComprobanteStatus::Sent,
            ComprobanteStatus::Accepted,
            ComprobanteStatus::Rejected,
        ] {
            assert_eq!(ComprobanteStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ComprobanteStatus::parse("voided"), None);
    }

    #[test]
    fn test_legal_transitions() {
        use ComprobanteStatus::{Accepted, Pending, Rejected, Sent};

        assert!(Pending.can_transition(Sent));
        assert!(Sent.can_transition(Sent)); // resend
        assert!(Sent.can_transition(Accepted));
        assert!(Sent.can_transition(Rejected));
    }

    #[test]
    fn test_terminal_states_are_immutable() {
        use ComprobanteStatus::{Accepted, Pending, Rejected, Sent};

        for terminal in [Accepted, Rejected] {
            for target in [Pending, Sent, Accepted, Rejected] {
                assert!(
                    !terminal.can_transition(target),
                    "{terminal} -> {target} must be illegal"
                );
            }
        }
    }

    #[test]
    fn test_no_regression_to_pending() {
        use ComprobanteStatus::{Accepted, Pending, Rejected, Sent};

        for from in [Sent, Accepted, Rejected] {
            assert!(!from.can_transition(Pending));
        }
        // Pending never skips straight to a terminal outcome either
        assert!(!Pending.can_transition(Accepted));
        assert!(!Pending.can_transition(Rejected));
    }

    #[test]
    fn test_ensure_transition_reports_pair() {
        let err = ComprobanteStatus::Accepted
            .ensure_transition(ComprobanteStatus::Sent)
            .unwrap_err();
        assert_eq!(err.from, ComprobanteStatus::Accepted);
        assert_eq!(err.to, ComprobanteStatus::Sent);
    }
}

/// Property-based checks over the transition table.
#[cfg(test)]
mod props {
    use super::*;
    use proptest::prelude::*;

    fn status_strategy() -> impl Strategy<Value = ComprobanteStatus> {
        prop_oneof![
            Just(ComprobanteStatus::Pending),
            Just(ComprobanteStatus::Sent),
            Just(ComprobanteStatus::Accepted),
            Just(ComprobanteStatus::Rejected),
        ]
    }

    proptest! {
        /// *For any* pair of statuses, a transition out of a terminal
        /// status is illegal.
        #[test]
        fn prop_terminal_statuses_have_no_exits(
            from in status_strategy(),
            to in status_strategy(),
        ) {
            if from.is_terminal() {
                prop_assert!(!from.can_transition(to));
            }
        }

        /// *For any* legal transition, the target is never Pending:
        /// regressing would risk re-allocating a sequence number.
        #[test]
        fn prop_pending_is_never_a_target(
            from in status_strategy(),
            to in status_strategy(),
        ) {
            if from.can_transition(to) {
                prop_assert!(to != ComprobanteStatus::Pending);
            }
        }

        /// `ensure_transition` agrees with `can_transition`.
        #[test]
        fn prop_ensure_matches_table(
            from in status_strategy(),
            to in status_strategy(),
        ) {
            prop_assert_eq!(from.ensure_transition(to).is_ok(), from.can_transition(to));
        }
    }
}
