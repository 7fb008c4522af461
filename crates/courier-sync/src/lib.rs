//! `courier-sync` - Offline-first delivery confirmation sync for couriers
//!
//! This library keeps the courier's current route on the device, records
//! delivery outcomes, and pushes them to the backend when it is reachable,
//! queuing them durably when it is not.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod geo;
pub mod logging;
pub mod remote;
pub mod route;
pub mod store;
pub mod sync;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use remote::{DeliveryApi, HttpDeliveryApi, RemoteError};
pub use route::{
    DeliveryConfirmation, DeliveryPoint, DeliveryStatus, DeliveryType, Location, Route, RouteStats,
};
pub use store::{RouteStore, StoreStats};
pub use sync::{RefreshReport, SyncClient, SyncReport};
pub use workflow::{Acknowledgement, ConfirmationDetails, ConfirmationReceipt, ConfirmationWorkflow};
