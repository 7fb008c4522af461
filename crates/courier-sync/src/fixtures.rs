//! Sample route used to seed a store for demos and manual testing.

use tracing::info;

use crate::error::Result;
use crate::route::Route;
use crate::store::RouteStore;

const SAMPLE_ROUTE_JSON: &str = include_str!("../fixtures/sample_route.json");

/// What [`seed_store`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The sample route was written.
    Seeded {
        /// Identifier of the written route.
        route_id: String,
        /// Number of points in it.
        points: usize,
    },
    /// A route was already stored and was left alone.
    AlreadyPresent {
        /// Identifier of the stored route.
        route_id: String,
    },
}

/// Parse the bundled ten-stop sample route.
///
/// # Errors
///
/// Returns an error if the bundled JSON does not describe a route.
pub fn sample_route() -> Result<Route> {
    Ok(serde_json::from_str(SAMPLE_ROUTE_JSON)?)
}

/// Store the sample route unless a route is already present.
///
/// With `force`, any stored route is replaced.
///
/// # Errors
///
/// Returns an error if the sample cannot be parsed or saved.
pub fn seed_store(store: &RouteStore, force: bool) -> Result<SeedOutcome> {
    if !force {
        if let Some(existing) = store.get_route() {
            return Ok(SeedOutcome::AlreadyPresent {
                route_id: existing.id,
            });
        }
    }

    let route = sample_route()?;
    store.save_route(&route)?;
    info!("Seeded store with sample route {}", route.id);

    Ok(SeedOutcome::Seeded {
        route_id: route.id,
        points: route.points.len(),
    })
}
