use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type OrderId = Uuid;

/// Fulfillment workflow position. Lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Accepted,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "accepted" => Some(OrderStatus::Accepted),
            "preparing" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Allowed forward transitions. Cancellation is possible until the
    /// kitchen hands the order over; a ready order can only complete.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted | Cancelled)
                | (Accepted, Preparing | Cancelled)
                | (Preparing, Ready | Cancelled)
                | (Ready, Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state, independent of the fulfillment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    Pickup,
    #[default]
    Delivery,
}

impl DeliveryType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryType::Pickup => "pickup",
            DeliveryType::Delivery => "delivery",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pickup" => Some(DeliveryType::Pickup),
            "delivery" => Some(DeliveryType::Delivery),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
}

/// GeoJSON-style point: `{"type": "Point", "coordinates": [lon, lat]}`.
/// Kept loose so create-order validation can itemize shape errors instead
/// of bouncing the whole payload at the deserializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl GeoPoint {
    pub fn longitude(&self) -> Option<f64> {
        self.coordinates.first().copied()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coordinates.get(1).copied()
    }

    /// Shape and range errors, prefixed with the wire field name.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.kind != "Point" {
            errors.push("deliveryLocation.type must be 'Point'".to_string());
        }
        if self.coordinates.len() != 2 {
            errors.push("deliveryLocation.coordinates must contain exactly two numbers".to_string());
            return errors;
        }
        let lon = self.coordinates[0];
        let lat = self.coordinates[1];
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            errors.push("deliveryLocation.coordinates[0] must be a longitude in [-180, 180]".to_string());
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            errors.push("deliveryLocation.coordinates[1] must be a latitude in [-90, 90]".to_string());
        }
        errors
    }
}

/// The central order record. Identity and `created_at` are immutable once
/// assigned; after creation only `status` changes, through the lifecycle
/// controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_location: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    pub delivery_type: DeliveryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_str("shipped"), None);
        assert_eq!(OrderStatus::from_str("Pending"), None);
    }

    #[test]
    fn transition_table_allows_the_happy_path() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Accepted.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Completed));
    }

    #[test]
    fn transition_table_allows_cancel_until_ready() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Accepted.can_transition_to(Cancelled));
        assert!(Preparing.can_transition_to(Cancelled));
        assert!(!Ready.can_transition_to(Cancelled));
    }

    #[test]
    fn transition_table_rejects_regressions_and_terminal_exits() {
        use OrderStatus::*;
        assert!(!Ready.can_transition_to(Pending));
        assert!(!Preparing.can_transition_to(Accepted));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Accepted));
        for status in OrderStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn terminal_states() {
        use OrderStatus::*;
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Ready.is_terminal());
    }

    #[test]
    fn geo_point_validation() {
        let good = GeoPoint { kind: "Point".into(), coordinates: vec![79.86, 6.93] };
        assert!(good.validation_errors().is_empty());

        let bad_kind = GeoPoint { kind: "Polygon".into(), coordinates: vec![0.0, 0.0] };
        assert_eq!(bad_kind.validation_errors().len(), 1);

        let short = GeoPoint { kind: "Point".into(), coordinates: vec![1.0] };
        assert_eq!(short.validation_errors().len(), 1);

        let out_of_range = GeoPoint { kind: "Point".into(), coordinates: vec![200.0, 95.0] };
        assert_eq!(out_of_range.validation_errors().len(), 2);

        let not_finite = GeoPoint { kind: "Point".into(), coordinates: vec![f64::NAN, 0.0] };
        assert_eq!(not_finite.validation_errors().len(), 1);
    }
}
