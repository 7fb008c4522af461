//! Command-line interface for courier-sync.
//!
//! This module provides the CLI structure for the `courier` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, ConfirmCommand, PendingCommand, PingCommand, PointCommand, PositionArgs,
    RefreshCommand, ResetCommand, RouteCommand, SeedCommand, StatusCommand,
};

use crate::logging::Verbosity;

/// courier - Work a delivery route, online or not
///
/// Keeps the current route on this device, records delivery outcomes, and
/// sends them to the backend as soon as it can be reached.
#[derive(Debug, Parser)]
#[command(name = "courier")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, show, or trace the current route
    #[command(subcommand)]
    Route(RouteCommand),

    /// Record the outcome of a delivery
    Confirm(ConfirmCommand),

    /// Send queued confirmations to the backend
    Sync,

    /// Fetch the route, then send queued confirmations
    Refresh(RefreshCommand),

    /// List confirmations waiting to be sent
    Pending(PendingCommand),

    /// Show route progress and sync state
    Status(StatusCommand),

    /// Fetch full details for one point from the backend
    Point(PointCommand),

    /// Report the courier's position
    Ping(PingCommand),

    /// Load the sample route into the local store
    Seed(SeedCommand),

    /// Delete the cached route, queue, and sync time
    Reset(ResetCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("courier").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "courier");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["sync"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["-v", "sync"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["-vv", "sync"]).verbosity(), Verbosity::Trace);
        assert_eq!(parse(&["-q", "-v", "sync"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_route_fetch() {
        let cli = parse(&["route", "fetch", "--courier", "courier-7"]);
        assert!(matches!(
            cli.command,
            Command::Route(RouteCommand::Fetch { courier: Some(ref c) }) if c == "courier-7"
        ));
    }

    #[test]
    fn test_parse_route_path_with_position() {
        let cli = parse(&["route", "path", "--lat", "49.82", "--lon", "19.04"]);
        let Command::Route(RouteCommand::Path(position)) = cli.command else {
            panic!("expected route path");
        };
        assert_eq!(position.lat, Some(49.82));
        assert_eq!(position.lon, Some(19.04));
    }

    #[test]
    fn test_parse_route_path_requires_both_coordinates() {
        let result = Cli::try_parse_from(["courier", "route", "path", "--lat", "49.82"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_confirm_failed_with_notes() {
        let cli = parse(&["confirm", "point-003", "--failed", "--notes", "nobody home"]);
        let Command::Confirm(cmd) = cli.command else {
            panic!("expected confirm");
        };
        assert_eq!(cmd.point_id, "point-003");
        assert!(cmd.failed);
        assert_eq!(cmd.notes.as_deref(), Some("nobody home"));
    }

    #[test]
    fn test_parse_ping_negative_longitude() {
        let cli = parse(&["ping", "--lat", "40.71", "--lon", "-74.00"]);
        let Command::Ping(cmd) = cli.command else {
            panic!("expected ping");
        };
        assert!((cmd.lon + 74.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_sync_and_status() {
        assert!(matches!(parse(&["sync"]).command, Command::Sync));
        assert!(matches!(
            parse(&["status", "--json"]).command,
            Command::Status(StatusCommand { json: true })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["-c", "/custom/config.toml", "pending"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_reset_and_seed() {
        assert!(matches!(
            parse(&["reset", "--yes"]).command,
            Command::Reset(ResetCommand { yes: true })
        ));
        assert!(matches!(
            parse(&["seed", "--force"]).command,
            Command::Seed(SeedCommand { force: true })
        ));
    }
}
