//! Core route types for courier-sync.
//!
//! This module defines the data structures exchanged with the backend and
//! persisted on the device: routes, their delivery points, and the
//! confirmations a courier records against them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome state of a delivery point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Not yet visited.
    #[default]
    Pending,
    /// Package handed over.
    Delivered,
    /// Delivery attempted and failed.
    Failed,
}

impl DeliveryStatus {
    /// Whether this is an outcome a courier can confirm.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Delivered => write!(f, "delivered"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Kind of stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    /// Collect a package.
    Pickup,
    /// Drop off a package.
    Delivery,
}

impl std::fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pickup => write!(f, "pickup"),
            Self::Delivery => write!(f, "delivery"),
        }
    }
}

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Location {
    /// Create a new location.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A single stop on a route.
///
/// The `id` is stable across fetches and is the join key for status updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPoint {
    /// Identifier, unique within a route.
    pub id: String,

    /// Pickup or delivery.
    #[serde(rename = "type")]
    pub kind: DeliveryType,

    /// Street address for display.
    pub address: String,

    /// Where the stop is.
    pub location: Location,

    /// Who receives (or hands over) the package.
    pub recipient_name: String,

    /// Recipient contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_phone: Option<String>,

    /// Package identifier.
    pub package_id: String,

    /// What the package contains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_description: Option<String>,

    /// Courier-facing notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Current outcome.
    #[serde(default)]
    pub status: DeliveryStatus,

    /// Expected arrival time, as sent by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,

    /// Position in the planned visiting order. Zero means unplanned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<f64>,

    /// Handling instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

/// The ordered set of stops assigned to a courier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Route identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Working day the route belongs to, as the backend wrote it
    /// (`2025-10-12` or a full ISO-8601 timestamp).
    pub date: String,

    /// Stops in display order.
    #[serde(default)]
    pub points: Vec<DeliveryPoint>,

    /// Total length in metres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_distance: Option<f64>,

    /// Expected duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<f64>,
}

impl Route {
    /// Look up a point by identifier.
    #[must_use]
    pub fn point(&self, point_id: &str) -> Option<&DeliveryPoint> {
        self.points.iter().find(|p| p.id == point_id)
    }

    /// Set the status of the point with the given identifier.
    ///
    /// Returns `false` and leaves the route untouched if no point matches.
    pub fn set_point_status(&mut self, point_id: &str, status: DeliveryStatus) -> bool {
        match self.points.iter_mut().find(|p| p.id == point_id) {
            Some(point) => {
                point.status = status;
                true
            }
            None => false,
        }
    }

    /// Reflect a confirmation in this route.
    pub fn apply_confirmation(&mut self, confirmation: &DeliveryConfirmation) -> bool {
        self.set_point_status(&confirmation.point_id, confirmation.status)
    }

    /// Count points by status.
    #[must_use]
    pub fn stats(&self) -> RouteStats {
        let mut stats = RouteStats {
            total: self.points.len(),
            ..RouteStats::default()
        };
        for point in &self.points {
            match point.status {
                DeliveryStatus::Pending => stats.pending += 1,
                DeliveryStatus::Delivered => stats.delivered += 1,
                DeliveryStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }
}

/// Progress counters for a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouteStats {
    /// Number of points.
    pub total: usize,
    /// Points delivered.
    pub delivered: usize,
    /// Points still to visit.
    pub pending: usize,
    /// Points that failed.
    pub failed: usize,
}

/// A courier's recorded outcome for one point.
///
/// Either consumed by a successful push or kept in the pending queue until a
/// batch flush succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryConfirmation {
    /// The confirmed point.
    pub point_id: String,

    /// Resulting status.
    pub status: DeliveryStatus,

    /// When the courier confirmed, UTC.
    #[serde(with = "timestamp_millis")]
    pub timestamp: DateTime<Utc>,

    /// Signature image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    /// Photo reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,

    /// Free-text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DeliveryConfirmation {
    /// Create a confirmation with no attachments.
    #[must_use]
    pub fn new(
        point_id: impl Into<String>,
        status: DeliveryStatus,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            point_id: point_id.into(),
            status,
            timestamp,
            signature: None,
            photo: None,
            notes: None,
        }
    }
}

/// Body of a courier location ping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPing {
    /// Courier sending the ping.
    pub courier_id: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// When the position was taken.
    #[serde(with = "timestamp_millis")]
    pub timestamp: DateTime<Utc>,
}

/// Timestamps on the wire are always `YYYY-MM-DDTHH:MM:SS.sssZ`.
///
/// Any RFC 3339 form is accepted on input.
mod timestamp_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(
        timestamp: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }
}
