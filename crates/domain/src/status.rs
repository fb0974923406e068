//! Order status state machine and related enums.

use serde::{Deserialize, Serialize};

/// How an order is fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentType {
    DineIn,
    Pickup,
    Delivery,
}

impl FulfillmentType {
    /// Returns the type name as a stable string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentType::DineIn => "DINE_IN",
            FulfillmentType::Pickup => "PICKUP",
            FulfillmentType::Delivery => "DELIVERY",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DINE_IN" => Some(FulfillmentType::DineIn),
            "PICKUP" => Some(FulfillmentType::Pickup),
            "DELIVERY" => Some(FulfillmentType::Delivery),
            _ => None,
        }
    }
}

impl std::fmt::Display for FulfillmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The state of an order in its fulfillment lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► Accepted ──► Preparing ──► Ready ──┬──► OutForDelivery ──► Delivered
///    │            │            │                 │         │
///    │            │            │                 └─────────┴──────────► Delivered
///    └────────────┴────────────┴──► Cancelled / Rejected (from any non-terminal)
/// ```
///
/// `OutForDelivery` is reachable only for delivery orders. `Delivered`,
/// `Cancelled`, and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order placed, awaiting restaurant acceptance.
    #[default]
    Pending,

    /// Restaurant accepted the order.
    Accepted,

    /// Kitchen is preparing the order.
    Preparing,

    /// Order is ready for pickup, service, or dispatch.
    Ready,

    /// Courier is en route (delivery orders only).
    OutForDelivery,

    /// Order was handed to the customer (terminal state).
    Delivered,

    /// Order was cancelled (terminal state).
    Cancelled,

    /// Restaurant rejected the order (terminal state).
    Rejected,
}

impl OrderStatus {
    /// The legal next states from this status for the given fulfillment
    /// type. This table is the single source of transition legality.
    pub fn successors(self, fulfillment: FulfillmentType) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match (self, fulfillment) {
            (Pending, _) => &[Accepted, Cancelled, Rejected],
            (Accepted, _) => &[Preparing, Cancelled, Rejected],
            (Preparing, _) => &[Ready, Cancelled, Rejected],
            (Ready, FulfillmentType::Delivery) => &[OutForDelivery, Delivered, Cancelled, Rejected],
            (Ready, _) => &[Delivered, Cancelled, Rejected],
            (OutForDelivery, _) => &[Delivered, Cancelled, Rejected],
            (Delivered | Cancelled | Rejected, _) => &[],
        }
    }

    /// Returns true if `next` is a legal transition from this status.
    pub fn can_transition_to(self, next: OrderStatus, fulfillment: FulfillmentType) -> bool {
        self.successors(fulfillment).contains(&next)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    /// Returns true if the order can still be cancelled with full reversal
    /// of inventory and customer statistics. Later stages are deliberately
    /// not cancellable: the kitchen has already committed resources.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Accepted)
    }

    /// Returns the status name as a stable string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rejected => "REJECTED",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "ACCEPTED" => Some(OrderStatus::Accepted),
            "PREPARING" => Some(OrderStatus::Preparing),
            "READY" => Some(OrderStatus::Ready),
            "OUT_FOR_DELIVERY" => Some(OrderStatus::OutForDelivery),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            "REJECTED" => Some(OrderStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the customer pays for the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Online => "ONLINE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CASH" => Some(PaymentMethod::Cash),
            "CARD" => Some(PaymentMethod::Card),
            "ONLINE" => Some(PaymentMethod::Online),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ledger status of the payment. The engine records this; capturing or
/// refunding funds at a gateway happens outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "COMPLETED" => Some(PaymentStatus::Completed),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who performed a lifecycle action, recorded on every history entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actor {
    /// The engine itself (order creation, automated transitions).
    System,
    /// The customer who owns the order.
    Customer,
    /// A staff member, identified by their staff id.
    Staff(String),
}

impl Actor {
    /// Returns the actor identifier as stored in the audit trail.
    pub fn as_str(&self) -> &str {
        match self {
            Actor::System => "SYSTEM",
            Actor::Customer => "CUSTOMER",
            Actor::Staff(id) => id,
        }
    }

    /// Parses the stored identifier. Anything other than the two reserved
    /// markers is a staff id.
    pub fn parse(s: &str) -> Self {
        match s {
            "SYSTEM" => Actor::System,
            "CUSTOMER" => Actor::Customer,
            other => Actor::Staff(other.to_string()),
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const ALL: [OrderStatus; 8] = [
        Pending,
        Accepted,
        Preparing,
        Ready,
        OutForDelivery,
        Delivered,
        Cancelled,
        Rejected,
    ];

    #[test]
    fn default_status_is_pending() {
        assert_eq!(OrderStatus::default(), Pending);
    }

    #[test]
    fn forward_path_for_pickup() {
        let f = FulfillmentType::Pickup;
        assert!(Pending.can_transition_to(Accepted, f));
        assert!(Accepted.can_transition_to(Preparing, f));
        assert!(Preparing.can_transition_to(Ready, f));
        assert!(Ready.can_transition_to(Delivered, f));
    }

    #[test]
    fn no_skipping_stages() {
        let f = FulfillmentType::DineIn;
        assert!(!Pending.can_transition_to(Delivered, f));
        assert!(!Pending.can_transition_to(Preparing, f));
        assert!(!Accepted.can_transition_to(Ready, f));
    }

    #[test]
    fn out_for_delivery_requires_delivery_type() {
        assert!(Ready.can_transition_to(OutForDelivery, FulfillmentType::Delivery));
        assert!(!Ready.can_transition_to(OutForDelivery, FulfillmentType::Pickup));
        assert!(!Ready.can_transition_to(OutForDelivery, FulfillmentType::DineIn));
    }

    #[test]
    fn delivery_may_skip_out_for_delivery() {
        assert!(Ready.can_transition_to(Delivered, FulfillmentType::Delivery));
    }

    #[test]
    fn cancelled_and_rejected_reachable_from_all_non_terminal() {
        for status in ALL {
            for f in [
                FulfillmentType::DineIn,
                FulfillmentType::Pickup,
                FulfillmentType::Delivery,
            ] {
                if status.is_terminal() {
                    assert!(!status.can_transition_to(Cancelled, f));
                    assert!(!status.can_transition_to(Rejected, f));
                } else {
                    assert!(status.can_transition_to(Cancelled, f), "{status} -> CANCELLED");
                    assert!(status.can_transition_to(Rejected, f), "{status} -> REJECTED");
                }
            }
        }
    }

    #[test]
    fn terminal_states_have_no_successors() {
        for status in [Delivered, Cancelled, Rejected] {
            assert!(status.is_terminal());
            assert!(status.successors(FulfillmentType::Delivery).is_empty());
        }
    }

    #[test]
    fn no_backward_transitions() {
        let f = FulfillmentType::Delivery;
        assert!(!Accepted.can_transition_to(Pending, f));
        assert!(!Preparing.can_transition_to(Accepted, f));
        assert!(!Ready.can_transition_to(Preparing, f));
        assert!(!OutForDelivery.can_transition_to(Ready, f));
    }

    #[test]
    fn only_pending_and_accepted_are_cancellable() {
        for status in ALL {
            assert_eq!(
                status.is_cancellable(),
                matches!(status, Pending | Accepted),
                "{status}"
            );
        }
    }

    #[test]
    fn status_string_roundtrip() {
        for status in ALL {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("SHIPPED"), None);
    }

    #[test]
    fn fulfillment_string_roundtrip() {
        for f in [
            FulfillmentType::DineIn,
            FulfillmentType::Pickup,
            FulfillmentType::Delivery,
        ] {
            assert_eq!(FulfillmentType::parse(f.as_str()), Some(f));
        }
    }

    #[test]
    fn payment_string_roundtrip() {
        for m in [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Online] {
            assert_eq!(PaymentMethod::parse(m.as_str()), Some(m));
        }
        for s in [
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(PaymentStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn actor_identifiers() {
        assert_eq!(Actor::System.as_str(), "SYSTEM");
        assert_eq!(Actor::Customer.as_str(), "CUSTOMER");
        assert_eq!(Actor::Staff("staff-42".into()).as_str(), "staff-42");
        assert_eq!(Actor::parse("SYSTEM"), Actor::System);
        assert_eq!(Actor::parse("staff-42"), Actor::Staff("staff-42".into()));
    }
}
