use crate::orders::{
    error::OrderError,
    models::{Order, OrderStatus, PickupRequest},
};

/// Service for managing order status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Paid, Cancelled
    /// - Paid → Paid (repeat payment confirmation), Completed
    /// - Completed, Cancelled, PickedUp → nothing
    ///
    /// Pickup is not a transition of its own; see `check_pickup`.
    pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        match (from, to) {
            // From Pending
            (OrderStatus::Pending, OrderStatus::Paid) => true,
            (OrderStatus::Pending, OrderStatus::Cancelled) => true,

            // From Paid
            (OrderStatus::Paid, OrderStatus::Paid) => true,
            (OrderStatus::Paid, OrderStatus::Completed) => true,

            // All other transitions are invalid
            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(InvalidTransition)` otherwise
    pub fn transition(from: OrderStatus, to: OrderStatus) -> Result<OrderStatus, OrderError> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(OrderError::InvalidTransition(format!(
                "Invalid status transition from {} to {}",
                from, to
            )))
        }
    }

    /// Guards for handing an order over at the counter
    ///
    /// In order:
    /// 1. If both codes are supplied they must equal the stored ones
    /// 2. The order needs payment evidence: a pending, paid or completed
    ///    status, or a `paid_at` stamp
    /// 3. It must not have been picked up already
    pub fn check_pickup(order: &Order, request: &PickupRequest) -> Result<(), OrderError> {
        if let Some((invoice, receipt)) = request.codes() {
            if invoice != order.invoice_check_code || receipt != order.receipt_check_code {
                return Err(OrderError::CheckCodeMismatch);
            }
        }

        let already_picked_up =
            order.picked_up_at.is_some() || order.status == OrderStatus::PickedUp;

        let paid_evidence = matches!(
            order.status,
            OrderStatus::Pending | OrderStatus::Paid | OrderStatus::Completed
        ) || order.paid_at.is_some();

        // Legacy picked_up rows may lack paid_at
        if !paid_evidence && !already_picked_up {
            return Err(OrderError::NotPaid(order.order_number.clone()));
        }

        if already_picked_up {
            return Err(OrderError::AlreadyPickedUp(order.order_number.clone()));
        }

        Ok(())
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::ALL.to_vec())
    }

    proptest! {
        /// Cancelled, completed and picked up orders never change status
        #[test]
        fn prop_terminal_statuses(to in any_status()) {
            for from in [OrderStatus::Cancelled, OrderStatus::Completed, OrderStatus::PickedUp] {
                prop_assert!(!StatusMachine::is_valid_transition(from, to));
            }
        }

        /// Nothing leads back to pending
        #[test]
        fn prop_never_back_to_pending(from in any_status()) {
            prop_assert!(!StatusMachine::is_valid_transition(from, OrderStatus::Pending));
        }

        /// `transition` agrees with `is_valid_transition`
        #[test]
        fn prop_transition_matches_predicate(from in any_status(), to in any_status()) {
            prop_assert_eq!(
                StatusMachine::transition(from, to).is_ok(),
                StatusMachine::is_valid_transition(from, to)
            );
        }
    }
}
