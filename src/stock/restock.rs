use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Restock shipment lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RestockStatus {
    Initiated,
    InTransit,
    Received,
    Cancelled,
}

impl RestockStatus {
    pub const ALL: [RestockStatus; 4] = [
        RestockStatus::Initiated,
        RestockStatus::InTransit,
        RestockStatus::Received,
        RestockStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RestockStatus::Initiated => "initiated",
            RestockStatus::InTransit => "in_transit",
            RestockStatus::Received => "received",
            RestockStatus::Cancelled => "cancelled",
        }
    }

    /// Still expected to arrive, so counted as incoming stock
    pub fn is_open(&self) -> bool {
        matches!(self, RestockStatus::Initiated | RestockStatus::InTransit)
    }
}

impl Default for RestockStatus {
    fn default() -> Self {
        RestockStatus::Initiated
    }
}

impl std::fmt::Display for RestockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Guards for restock status changes
///
/// - Initiated → InTransit (tracking number set)
/// - InTransit → InTransit (tracking number corrected)
/// - Initiated | InTransit → Received, Cancelled
/// - Received and Cancelled are terminal
pub struct RestockTransitions;

impl RestockTransitions {
    pub fn is_valid(from: RestockStatus, to: RestockStatus) -> bool {
        use RestockStatus::*;
        matches!(
            (from, to),
            (Initiated, InTransit)
                | (InTransit, InTransit)
                | (Initiated, Received)
                | (InTransit, Received)
                | (Initiated, Cancelled)
                | (InTransit, Cancelled)
        )
    }

    pub fn transition(from: RestockStatus, to: RestockStatus) -> Result<RestockStatus, String> {
        if Self::is_valid(from, to) {
            Ok(to)
        } else {
            Err(format!(
                "Invalid restock status transition from {} to {}",
                from, to
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RestockStatus::*;

    #[test]
    fn test_shipping_path() {
        assert!(RestockTransitions::is_valid(Initiated, InTransit));
        assert!(RestockTransitions::is_valid(InTransit, InTransit));
        assert!(RestockTransitions::is_valid(InTransit, Received));
    }

    #[test]
    fn test_receive_without_tracking() {
        assert!(RestockTransitions::is_valid(Initiated, Received));
    }

    #[test]
    fn test_cancel_only_while_open() {
        assert!(RestockTransitions::is_valid(Initiated, Cancelled));
        assert!(RestockTransitions::is_valid(InTransit, Cancelled));
        assert!(!RestockTransitions::is_valid(Received, Cancelled));
        assert!(!RestockTransitions::is_valid(Cancelled, Cancelled));
    }

    #[test]
    fn test_no_going_back() {
        assert!(!RestockTransitions::is_valid(InTransit, Initiated));
        assert!(!RestockTransitions::is_valid(Received, InTransit));
        assert!(!RestockTransitions::is_valid(Initiated, Initiated));
    }

    #[test]
    fn test_transition_error_message() {
        let err = RestockTransitions::transition(Received, InTransit).unwrap_err();
        assert_eq!(err, "Invalid restock status transition from received to in_transit");
    }

    #[test]
    fn test_open_statuses() {
        assert!(Initiated.is_open());
        assert!(InTransit.is_open());
        assert!(!Received.is_open());
        assert!(!Cancelled.is_open());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = RestockStatus> {
        prop::sample::select(RestockStatus::ALL.to_vec())
    }

    proptest! {
        /// Terminal statuses never move
        #[test]
        fn prop_terminal_statuses_are_final(to in any_status()) {
            prop_assert!(!RestockTransitions::is_valid(RestockStatus::Received, to));
            prop_assert!(!RestockTransitions::is_valid(RestockStatus::Cancelled, to));
        }

        /// Every allowed move starts from an open status
        #[test]
        fn prop_moves_start_open(from in any_status(), to in any_status()) {
            if RestockTransitions::is_valid(from, to) {
                prop_assert!(from.is_open());
            }
        }
    }
}
