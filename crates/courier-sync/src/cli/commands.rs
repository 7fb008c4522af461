//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::route::{DeliveryStatus, Location};
use crate::workflow::ConfirmationDetails;

/// Route commands.
#[derive(Debug, Subcommand)]
pub enum RouteCommand {
    /// Fetch the current route, falling back to the cached copy
    Fetch {
        /// Courier to fetch for (defaults to the configured courier)
        #[arg(long)]
        courier: Option<String>,
    },

    /// Show the cached route
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the stop sequence a map would draw
    Path(PositionArgs),
}

/// An optional current position.
#[derive(Debug, Args)]
pub struct PositionArgs {
    /// Current latitude in degrees
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Current longitude in degrees
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl PositionArgs {
    /// The position, if both coordinates were given.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        self.lat.zip(self.lon).map(|(lat, lon)| Location::new(lat, lon))
    }
}

/// Confirm command arguments.
#[derive(Debug, Args)]
pub struct ConfirmCommand {
    /// The point to confirm
    pub point_id: String,

    /// Record a failed delivery instead of a successful one
    #[arg(long)]
    pub failed: bool,

    /// Note attached to the confirmation
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Signature image reference
    #[arg(long)]
    pub signature: Option<String>,

    /// Photo reference
    #[arg(long)]
    pub photo: Option<String>,
}

impl ConfirmCommand {
    /// The outcome being recorded.
    #[must_use]
    pub fn outcome(&self) -> DeliveryStatus {
        if self.failed {
            DeliveryStatus::Failed
        } else {
            DeliveryStatus::Delivered
        }
    }

    /// Attachments for the confirmation.
    #[must_use]
    pub fn details(&self) -> ConfirmationDetails {
        ConfirmationDetails {
            notes: self.notes.clone(),
            signature: self.signature.clone(),
            photo: self.photo.clone(),
        }
    }
}

/// Refresh command arguments.
#[derive(Debug, Args)]
pub struct RefreshCommand {
    /// Courier to fetch for (defaults to the configured courier)
    #[arg(long)]
    pub courier: Option<String>,
}

/// Pending command arguments.
#[derive(Debug, Args)]
pub struct PendingCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Point command arguments.
#[derive(Debug, Args)]
pub struct PointCommand {
    /// The point to look up
    pub point_id: String,
}

/// Ping command arguments.
#[derive(Debug, Args)]
pub struct PingCommand {
    /// Latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Courier sending the ping (defaults to the configured courier)
    #[arg(long)]
    pub courier: Option<String>,
}

/// Seed command arguments.
#[derive(Debug, Args)]
pub struct SeedCommand {
    /// Replace a route that is already stored
    #[arg(short, long)]
    pub force: bool,
}

/// Reset command arguments.
#[derive(Debug, Args)]
pub struct ResetCommand {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
