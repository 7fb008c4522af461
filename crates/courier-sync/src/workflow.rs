//! Confirmation workflow for courier-sync.
//!
//! Turns a courier's "delivered" or "failed" decision into a timestamped
//! [`DeliveryConfirmation`] and hands it to the [`SyncClient`]. Queuing for
//! later sync is an expected outcome here, reported in the receipt rather
//! than as an error.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::info;

use crate::error::{Error, Result};
use crate::remote::DeliveryApi;
use crate::route::{DeliveryConfirmation, DeliveryPoint, DeliveryStatus, Route};
use crate::sync::SyncClient;

/// Source of confirmation timestamps.
pub type Clock = fn() -> DateTime<Utc>;

/// Optional attachments for a confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationDetails {
    /// Free-text note.
    pub notes: Option<String>,
    /// Signature image reference.
    pub signature: Option<String>,
    /// Photo reference.
    pub photo: Option<String>,
}

impl ConfirmationDetails {
    /// Attach a note.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// How the backend learned about a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// The backend accepted it immediately.
    Synced,
    /// It is waiting in the pending queue.
    QueuedOffline,
}

impl fmt::Display for Acknowledgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synced => write!(f, "synced"),
            Self::QueuedOffline => write!(f, "queued offline"),
        }
    }
}

/// What the courier sees after confirming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationReceipt {
    /// The confirmation that was recorded.
    pub confirmation: DeliveryConfirmation,
    /// Whether it reached the backend.
    pub delivery: Acknowledgement,
}

impl ConfirmationReceipt {
    /// Message for the courier.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match (self.delivery, self.confirmation.status) {
            (Acknowledgement::QueuedOffline, _) => {
                "Confirmation saved offline. Will be sent when connection is available."
            }
            (Acknowledgement::Synced, DeliveryStatus::Failed) => "Marked as failed",
            (Acknowledgement::Synced, _) => "Delivery confirmed",
        }
    }
}

/// Records delivery outcomes through a [`SyncClient`].
#[derive(Debug)]
pub struct ConfirmationWorkflow<'c, 's, A> {
    sync: &'c SyncClient<'s, A>,
    clock: Clock,
}

impl<'c, 's, A: DeliveryApi> ConfirmationWorkflow<'c, 's, A> {
    /// Create a workflow that stamps confirmations with the system clock.
    #[must_use]
    pub fn new(sync: &'c SyncClient<'s, A>) -> Self {
        Self {
            sync,
            clock: Utc::now,
        }
    }

    /// Use a different timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Confirm the outcome of a visit to `point`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOutcome`] for [`DeliveryStatus::Pending`],
    /// [`Error::AlreadyConfirmed`] if the point already has an outcome, or a
    /// storage error from the sync client.
    pub async fn confirm(
        &self,
        point: &DeliveryPoint,
        outcome: DeliveryStatus,
        details: ConfirmationDetails,
    ) -> Result<ConfirmationReceipt> {
        if !outcome.is_terminal() {
            return Err(Error::InvalidOutcome(outcome));
        }
        if point.status.is_terminal() {
            return Err(Error::AlreadyConfirmed {
                point_id: point.id.clone(),
                status: point.status,
            });
        }

        let confirmation = self.mint(&point.id, outcome, details);
        let delivery = match self.sync.confirm_delivery(&confirmation).await {
            Ok(()) => Acknowledgement::Synced,
            Err(err) if err.is_offline_queued() => Acknowledgement::QueuedOffline,
            Err(err) => return Err(err),
        };

        info!("Point {} marked {} ({})", point.id, outcome, delivery);
        Ok(ConfirmationReceipt {
            confirmation,
            delivery,
        })
    }

    /// Confirm a point of `route` and apply the outcome to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PointNotFound`] if the route has no such point, plus
    /// everything [`confirm`](Self::confirm) can return.
    pub async fn confirm_and_apply(
        &self,
        route: &mut Route,
        point_id: &str,
        outcome: DeliveryStatus,
        details: ConfirmationDetails,
    ) -> Result<ConfirmationReceipt> {
        let point = route
            .point(point_id)
            .ok_or_else(|| Error::PointNotFound(point_id.to_string()))?;
        let receipt = self.confirm(point, outcome, details).await?;
        route.apply_confirmation(&receipt.confirmation);
        Ok(receipt)
    }

    fn mint(
        &self,
        point_id: &str,
        status: DeliveryStatus,
        details: ConfirmationDetails,
    ) -> DeliveryConfirmation {
        DeliveryConfirmation {
            point_id: point_id.to_string(),
            status,
            timestamp: (self.clock)().trunc_subsecs(3),
            signature: details.signature,
            photo: details.photo,
            notes: details.notes,
        }
    }
}
