//! Remote sync client for courier-sync.
//!
//! [`SyncClient`] decides what happens when the backend is unreachable:
//! route fetches fall back to the cached copy, confirmations fall into the
//! pending queue, and queue flushes report their outcome instead of failing.
//! The client keeps no state of its own between calls; everything durable
//! lives in the [`RouteStore`] it borrows.

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::remote::{DeliveryApi, RemoteError};
use crate::route::{DeliveryConfirmation, DeliveryPoint, LocationPing, Route};
use crate::store::RouteStore;

/// Outcome of flushing the pending confirmation queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReport {
    /// The queue was empty; the backend was not contacted.
    NothingPending,

    /// The backend accepted the batch and the queue was cleared.
    Flushed {
        /// Number of confirmations sent.
        sent: usize,
    },

    /// The flush did not complete; every queued confirmation is still queued.
    Retained {
        /// Number of confirmations left in the queue.
        pending: usize,
        /// Why the flush stopped.
        reason: String,
    },
}

impl SyncReport {
    /// Check if the queue is empty after this flush.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        !matches!(self, Self::Retained { .. })
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingPending => write!(f, "nothing to sync"),
            Self::Flushed { sent } => write!(f, "synced {sent} confirmation(s)"),
            Self::Retained { pending, reason } => {
                write!(f, "{pending} confirmation(s) still pending: {reason}")
            }
        }
    }
}

/// Result of a pull-to-refresh: a route fetch followed by a queue flush.
#[derive(Debug)]
pub struct RefreshReport {
    /// The fetched or cached route.
    pub route: Result<Route>,
    /// What happened to the pending queue.
    pub sync: SyncReport,
}

/// Applies the offline policy on top of a [`DeliveryApi`].
#[derive(Debug)]
pub struct SyncClient<'s, A> {
    api: A,
    store: &'s RouteStore,
}

impl<'s, A: DeliveryApi> SyncClient<'s, A> {
    /// Create a client over the given backend and store.
    #[must_use]
    pub fn new(api: A, store: &'s RouteStore) -> Self {
        Self { api, store }
    }

    /// Get the backend.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Get the store.
    #[must_use]
    pub fn store(&self) -> &'s RouteStore {
        self.store
    }

    /// Fetch the courier's current route.
    ///
    /// A fetched route replaces the cached one and stamps the last sync time.
    /// If the backend cannot be reached the cached route is returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRouteAvailable`] if the fetch fails and nothing is
    /// cached, or a storage error if the fetched route cannot be saved.
    pub async fn fetch_route(&self, courier_id: &str) -> Result<Route> {
        match self.api.fetch_current_route(courier_id).await {
            Ok(route) => {
                self.store.save_route(&route)?;
                self.store.set_last_sync();
                info!(
                    "Fetched route {} with {} points",
                    route.id,
                    route.points.len()
                );
                Ok(route)
            }
            Err(source) => match self.store.get_route() {
                Some(route) => {
                    warn!("Route fetch failed, using cached route {}: {}", route.id, source);
                    Ok(route)
                }
                None => {
                    warn!("Route fetch failed and no route is cached: {}", source);
                    Err(Error::NoRouteAvailable { source })
                }
            },
        }
    }

    /// Push a confirmation and reflect it in the stored route.
    ///
    /// The local status is updated whether or not the push succeeds. When the
    /// push fails the confirmation is queued first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SavedOffline`] when the confirmation was queued; the
    /// local route already shows the outcome, so callers should treat it as a
    /// warning. Storage failures propagate as hard errors.
    pub async fn confirm_delivery(&self, confirmation: &DeliveryConfirmation) -> Result<()> {
        match self.api.confirm_delivery(confirmation).await {
            Ok(()) => {
                debug!("Backend accepted confirmation for {}", confirmation.point_id);
                self.store
                    .update_point_status(&confirmation.point_id, confirmation.status)?;
                Ok(())
            }
            Err(source) => {
                self.store.save_pending_confirmation(confirmation)?;
                self.store
                    .update_point_status(&confirmation.point_id, confirmation.status)?;
                info!(
                    "Queued confirmation for {} until the backend is reachable",
                    confirmation.point_id
                );
                Err(Error::SavedOffline {
                    point_id: confirmation.point_id.clone(),
                    source,
                })
            }
        }
    }

    /// Send every queued confirmation in one batch.
    ///
    /// The queue is cleared only after the backend acknowledges the whole
    /// batch. Failures are reported in the returned [`SyncReport`].
    pub async fn sync_pending_confirmations(&self) -> SyncReport {
        let pending = self.store.get_pending_confirmations();
        if pending.is_empty() {
            debug!("No pending confirmations to sync");
            return SyncReport::NothingPending;
        }

        if let Err(err) = self.api.confirm_batch(&pending).await {
            debug!("Batch sync of {} confirmations failed: {}", pending.len(), err);
            return SyncReport::Retained {
                pending: pending.len(),
                reason: err.to_string(),
            };
        }

        // The backend has the batch now; a failed clear means it will be resent.
        if let Err(err) = self.store.clear_pending_confirmations() {
            warn!("Batch accepted but the pending queue could not be cleared: {}", err);
            return SyncReport::Retained {
                pending: pending.len(),
                reason: err.to_string(),
            };
        }

        info!("Synced {} pending confirmations", pending.len());
        SyncReport::Flushed {
            sent: pending.len(),
        }
    }

    /// Report the courier's position.
    ///
    /// Nothing is queued or retried.
    ///
    /// # Errors
    ///
    /// Returns the backend error so the caller can decide whether to log it.
    pub async fn update_location(
        &self,
        courier_id: &str,
        latitude: f64,
        longitude: f64,
    ) -> std::result::Result<(), RemoteError> {
        let ping = LocationPing {
            courier_id: courier_id.to_string(),
            latitude,
            longitude,
            timestamp: chrono::Utc::now(),
        };
        self.api.send_location(&ping).await
    }

    /// Fetch the full record for one point. Nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PointDetailsUnavailable`] if the fetch fails.
    pub async fn get_delivery_point_details(&self, point_id: &str) -> Result<DeliveryPoint> {
        self.api
            .fetch_delivery_point(point_id)
            .await
            .map_err(|source| Error::PointDetailsUnavailable {
                point_id: point_id.to_string(),
                source,
            })
    }

    /// Fetch the route, then flush the pending queue.
    ///
    /// The fetch runs first, so a freshly fetched route can overwrite local
    /// statuses whose confirmations are still waiting in the queue. They
    /// reappear once the backend has processed the flush.
    pub async fn refresh(&self, courier_id: &str) -> RefreshReport {
        let route = self.fetch_route(courier_id).await;
        let sync = self.sync_pending_confirmations().await;
        RefreshReport { route, sync }
    }
}
