//! Shared test fixtures: sample data and a scripted backend double.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::remote::{DeliveryApi, RemoteError};
use crate::route::{
    DeliveryConfirmation, DeliveryPoint, DeliveryStatus, DeliveryType, Location, LocationPing,
    Route,
};

pub(crate) fn point(id: &str, order: u32, latitude: f64, longitude: f64) -> DeliveryPoint {
    DeliveryPoint {
        id: id.to_string(),
        kind: DeliveryType::Delivery,
        address: format!("{id} street"),
        location: Location::new(latitude, longitude),
        recipient_name: format!("Recipient of {id}"),
        recipient_phone: None,
        package_id: format!("PKG-{id}"),
        package_description: None,
        notes: None,
        status: DeliveryStatus::Pending,
        estimated_time: None,
        order_number: Some(f64::from(order)),
        special_instructions: None,
    }
}

/// Three pending points, `point-001` to `point-003`.
pub(crate) fn sample_route() -> Route {
    Route {
        id: "route-001".to_string(),
        name: "Route - October 12, 2025".to_string(),
        date: "2025-10-12".to_string(),
        points: vec![
            point("point-001", 1, 49.820_472, 19.039_027),
            point("point-002", 2, 49.825_582, 19.030_660),
            point("point-003", 3, 49.828_133, 19.053_366),
        ],
        total_distance: Some(28_000.0),
        estimated_duration: Some(270.0),
    }
}

pub(crate) fn fixed_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-10-12T10:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub(crate) fn confirmation(point_id: &str, status: DeliveryStatus) -> DeliveryConfirmation {
    DeliveryConfirmation::new(point_id, status, fixed_time())
}

/// In-process backend that is either reachable or not.
#[derive(Debug, Default)]
pub(crate) struct FakeApi {
    offline: AtomicBool,
    route: Mutex<Option<Route>>,
    pub(crate) confirmed: Mutex<Vec<DeliveryConfirmation>>,
    pub(crate) batches: Mutex<Vec<Vec<DeliveryConfirmation>>>,
    pub(crate) pings: Mutex<Vec<LocationPing>>,
    pub(crate) calls: AtomicUsize,
}

impl FakeApi {
    pub(crate) fn online() -> Self {
        Self::default()
    }

    pub(crate) fn offline() -> Self {
        let api = Self::default();
        api.set_offline(true);
        api
    }

    pub(crate) fn with_route(self, route: Route) -> Self {
        *self.route.lock().unwrap() = Some(route);
        self
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn reach(&self) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            Err(RemoteError::transport("network unreachable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DeliveryApi for FakeApi {
    async fn fetch_current_route(&self, _courier_id: &str) -> Result<Route, RemoteError> {
        self.reach()?;
        self.route
            .lock()
            .unwrap()
            .clone()
            .ok_or(RemoteError::Status {
                status: 404,
                body: String::new(),
            })
    }

    async fn confirm_delivery(
        &self,
        confirmation: &DeliveryConfirmation,
    ) -> Result<(), RemoteError> {
        self.reach()?;
        self.confirmed.lock().unwrap().push(confirmation.clone());
        Ok(())
    }

    async fn confirm_batch(
        &self,
        confirmations: &[DeliveryConfirmation],
    ) -> Result<(), RemoteError> {
        self.reach()?;
        self.batches.lock().unwrap().push(confirmations.to_vec());
        Ok(())
    }

    async fn send_location(&self, ping: &LocationPing) -> Result<(), RemoteError> {
        self.reach()?;
        self.pings.lock().unwrap().push(ping.clone());
        Ok(())
    }

    async fn fetch_delivery_point(&self, point_id: &str) -> Result<DeliveryPoint, RemoteError> {
        self.reach()?;
        self.route
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|r| r.point(point_id).cloned())
            .ok_or(RemoteError::Status {
                status: 404,
                body: String::new(),
            })
    }
}
