//! `courier` - CLI for courier-sync
//!
//! This binary drives the route cache and the confirmation sync from the
//! command line.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use clap::Parser;

use courier_sync::cli::{
    Cli, Command, ConfigCommand, ConfirmCommand, PingCommand, PositionArgs, RouteCommand,
};
use courier_sync::fixtures::{self, SeedOutcome};
use courier_sync::geo;
use courier_sync::{
    init_logging, Config, ConfirmationWorkflow, HttpDeliveryApi, Route, RouteStore, SyncClient,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Configuration commands must work even when the config is broken
    if let Command::Config(config_cmd) = cli.command {
        return handle_config(cli.config, config_cmd);
    }

    let config = Config::load_from(cli.config.clone())?;
    let store =
        RouteStore::open(config.database_path())?.with_namespace(config.storage.namespace.clone());
    let api = HttpDeliveryApi::from_config(&config.api)?;
    let sync = SyncClient::new(api, &store);
    let courier_id = |flag: Option<String>| flag.unwrap_or_else(|| config.courier.courier_id.clone());

    match cli.command {
        Command::Route(RouteCommand::Fetch { courier }) => {
            handle_fetch(&sync, &courier_id(courier)).await
        }
        Command::Route(RouteCommand::Show { json }) => handle_show(&store, json),
        Command::Route(RouteCommand::Path(position)) => handle_path(&store, &position),
        Command::Confirm(cmd) => handle_confirm(&sync, &cmd).await,
        Command::Sync => {
            println!("{}", sync.sync_pending_confirmations().await);
            Ok(())
        }
        Command::Refresh(cmd) => handle_refresh(&sync, &courier_id(cmd.courier)).await,
        Command::Pending(cmd) => handle_pending(&store, cmd.json),
        Command::Status(cmd) => handle_status(&config, &store, cmd.json),
        Command::Point(cmd) => {
            let point = sync.get_delivery_point_details(&cmd.point_id).await?;
            println!("{}", serde_json::to_string_pretty(&point)?);
            Ok(())
        }
        Command::Ping(cmd) => {
            let courier = courier_id(cmd.courier.clone());
            handle_ping(&sync, &courier, &cmd).await;
            Ok(())
        }
        Command::Seed(cmd) => handle_seed(&store, cmd.force),
        Command::Reset(cmd) => handle_reset(&store, cmd.yes),
        Command::Config(_) => Ok(()),
    }
}

fn print_route(route: &Route) {
    let stats = route.stats();
    println!("{} ({})", route.name, route.date);
    println!(
        "  {} stops: {} delivered, {} failed, {} pending",
        stats.total, stats.delivered, stats.failed, stats.pending
    );
    if let Some(distance) = route.total_distance {
        println!("  Distance:  {}", geo::format_distance(distance));
    }
    if let Some(minutes) = route.estimated_duration {
        let minutes = minutes.round();
        println!(
            "  Duration:  {:.0}h {:02.0}m",
            (minutes / 60.0).floor(),
            minutes % 60.0
        );
    }
}

async fn handle_fetch(sync: &SyncClient<'_, HttpDeliveryApi>, courier_id: &str) -> CliResult {
    match sync.fetch_route(courier_id).await {
        Ok(route) => {
            print_route(&route);
            Ok(())
        }
        Err(e) if e.is_no_data() => {
            println!("Unable to load route: {e}");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn handle_show(store: &RouteStore, json: bool) -> CliResult {
    let Some(route) = store.get_route() else {
        println!("No route cached. Run `courier route fetch` or `courier seed`.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&route)?);
        return Ok(());
    }

    print_route(&route);
    println!();
    for point in &route.points {
        let order = point
            .order_number
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        println!(
            "{order:>3}. [{:<9}] {:<10} {:<8} {}",
            point.status.to_string(),
            point.id,
            point.kind.to_string(),
            point.address
        );
        println!("       {} ({})", point.recipient_name, point.package_id);
    }
    Ok(())
}

fn handle_path(store: &RouteStore, position: &PositionArgs) -> CliResult {
    let Some(route) = store.get_route() else {
        println!("No route cached.");
        return Ok(());
    };

    let current = position.location();
    let stops = geo::ordered_stops(&route.points, current);
    if stops.is_empty() {
        println!("Not enough numbered stops to draw a path.");
        return Ok(());
    }

    let mut previous = current;
    for (i, point) in stops.iter().enumerate() {
        let leg = previous
            .map(|from| geo::format_distance(geo::distance_meters(from, point.location)))
            .unwrap_or_default();
        println!(
            "{:>3}. {:<10} {:>9.5},{:>9.5} {:>9}  {}",
            i + 1,
            point.id,
            point.location.latitude,
            point.location.longitude,
            leg,
            point.address
        );
        previous = Some(point.location);
    }

    let path = geo::route_path(&route.points, current);
    let total: f64 = path
        .windows(2)
        .map(|leg| geo::distance_meters(leg[0], leg[1]))
        .sum();
    println!("     Total {}", geo::format_distance(total));
    Ok(())
}

async fn handle_confirm(sync: &SyncClient<'_, HttpDeliveryApi>, cmd: &ConfirmCommand) -> CliResult {
    let Some(mut route) = sync.store().get_route() else {
        return Err("no route cached; run `courier route fetch` first".into());
    };

    let workflow = ConfirmationWorkflow::new(sync);
    let receipt = workflow
        .confirm_and_apply(&mut route, &cmd.point_id, cmd.outcome(), cmd.details())
        .await?;

    println!("{}", receipt.message());
    let stats = route.stats();
    println!(
        "  {} of {} stops done",
        stats.delivered + stats.failed,
        stats.total
    );
    Ok(())
}

async fn handle_refresh(sync: &SyncClient<'_, HttpDeliveryApi>, courier_id: &str) -> CliResult {
    let report = sync.refresh(courier_id).await;
    match &report.route {
        Ok(route) => print_route(route),
        Err(e) => println!("Unable to load route: {e}"),
    }
    println!("Sync: {}", report.sync);
    Ok(())
}

fn handle_pending(store: &RouteStore, json: bool) -> CliResult {
    let pending = store.get_pending_confirmations();
    if json {
        println!("{}", serde_json::to_string_pretty(&pending)?);
        return Ok(());
    }

    if pending.is_empty() {
        println!("No confirmations waiting.");
        return Ok(());
    }
    for confirmation in &pending {
        println!(
            "{}  {:<10} {:<9} {}",
            confirmation
                .timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            confirmation.point_id,
            confirmation.status.to_string(),
            confirmation.notes.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn handle_status(config: &Config, store: &RouteStore, json: bool) -> CliResult {
    let stats = store.stats();
    let progress = store.get_route().map(|route| route.stats());

    if json {
        let status = serde_json::json!({
            "courier_id": config.courier.courier_id,
            "api": config.api.base_url,
            "database_path": store.path(),
            "store": stats,
            "progress": progress,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("courier status");
    println!("--------------");
    println!("Courier:       {}", config.courier.courier_id);
    println!("API:           {}", config.api.base_url);
    println!("Database:      {}", store.path().display());
    println!(
        "Route:         {}",
        stats.route_id.as_deref().unwrap_or("none")
    );
    if let Some(progress) = progress {
        println!(
            "Progress:      {}/{} done ({} failed)",
            progress.delivered + progress.failed,
            progress.total,
            progress.failed
        );
    }
    println!("Pending:       {}", stats.pending_confirmations);
    println!(
        "Last sync:     {}",
        stats
            .last_sync
            .map_or_else(|| "never".to_string(), |t| t.to_rfc3339())
    );
    Ok(())
}

async fn handle_ping(sync: &SyncClient<'_, HttpDeliveryApi>, courier_id: &str, cmd: &PingCommand) {
    match sync.update_location(courier_id, cmd.lat, cmd.lon).await {
        Ok(()) => println!("Location sent."),
        Err(e) => {
            tracing::debug!("Location ping failed: {}", e);
            println!("Location not sent: {e}");
        }
    }
}

fn handle_seed(store: &RouteStore, force: bool) -> CliResult {
    match fixtures::seed_store(store, force)? {
        SeedOutcome::Seeded { route_id, points } => {
            println!("Seeded route {route_id} with {points} stops.");
        }
        SeedOutcome::AlreadyPresent { route_id } => {
            println!("Route {route_id} is already stored. Use --force to replace it.");
        }
    }
    Ok(())
}

fn handle_reset(store: &RouteStore, yes: bool) -> CliResult {
    if !yes {
        println!("This will delete the cached route and every unsent confirmation.");
        println!("Use --yes to confirm.");
        return Ok(());
    }

    let pending = store.get_pending_confirmations().len();
    store.clear_all()?;
    if pending > 0 {
        println!("Cleared local data ({pending} unsent confirmations discarded).");
    } else {
        println!("Cleared local data.");
    }
    Ok(())
}

fn handle_config(path: Option<std::path::PathBuf>, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[API]");
                println!("  Base URL:           {}", config.api.base_url);
                println!("  Timeout (secs):     {}", config.api.timeout_secs);
                println!(
                    "  Auth token:         {}",
                    if config.api.auth_token.is_some() {
                        "set"
                    } else {
                        "not set"
                    }
                );
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Namespace:          {}", config.storage.namespace);
                println!();
                println!("[Courier]");
                println!("  Courier id:         {}", config.courier.courier_id);
            }
        }
        ConfigCommand::Path => {
            println!(
                "{}",
                path.unwrap_or_else(Config::default_config_path).display()
            );
        }
        ConfigCommand::Validate { file } => {
            let path = file.or(path).unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
