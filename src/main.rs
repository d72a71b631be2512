use fleetmap::auth::{FileTokenStore, TokenStore};
use fleetmap::config::Config;
use fleetmap::constants::{DEFAULT_NEARBY_RADIUS_METERS, DEFAULT_REVERSE_ZOOM};
use fleetmap::models::{GeoPoint, PlaceCategory, TravelProfile};
use fleetmap::services::{BusSimulator, MapDataService};
use serde::Serialize;
use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_TRACK_TICKS: usize = 3;

fn print_help() {
    eprintln!(
        "\
Usage: fleetmap <COMMAND> [ARGS] [OPTIONS]

Commands:
  health                                   Check the map backend
  types                                    List place categories and profiles
  search <QUERY>                           Search places
  address <QUERY>                          Address autocomplete (3+ chars)
  reverse <LAT> <LON>                      Reverse geocode a point
  nearby <LAT> <LON> <TYPE> [RADIUS_M]     Places of TYPE around a point
  popular <LAT> <LON>                      Top places for everyday categories
  route <LAT> <LON> <LAT> <LON> [PROFILE]  Route between two points
  track                                    Print simulated bus positions

Options:
  --limit=N             Search result limit (default: 5)
  --country=CODE        Search country filter (default: DEFAULT_COUNTRY)
  --ticks=N             Snapshots printed by `track` (default: 3)
  --help                Show this help message"
    );
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_point(lat: Option<&String>, lon: Option<&String>) -> Result<GeoPoint, String> {
    let lat: f64 = lat
        .ok_or("missing latitude")?
        .parse()
        .map_err(|e| format!("invalid latitude: {}", e))?;
    let lon: f64 = lon
        .ok_or("missing longitude")?
        .parse()
        .map_err(|e| format!("invalid longitude: {}", e))?;
    GeoPoint::new(lat, lon).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetmap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help") {
        print_help();
        return Ok(());
    }

    let option = |name: &str| {
        let prefix = format!("--{}=", name);
        args.iter()
            .find_map(|a| a.strip_prefix(prefix.as_str()).map(|v| v.to_string()))
    };
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    let arg = |i: usize| positional.get(i).copied();

    let config = Config::from_env().map_err(|e| format!("Config error: {}", e))?;
    tracing::debug!("Using map backend at {}", config.api_base_url);

    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(
        &config.storage_dir,
        &config.storage_prefix,
    ));
    let service = MapDataService::from_config(&config, Some(tokens))?;

    let mut options = service.default_search_options();
    if let Some(limit) = option("limit") {
        options.limit = limit.parse().map_err(|e| format!("invalid --limit: {}", e))?;
    }
    if let Some(country) = option("country") {
        options.countrycodes = country;
    }

    match arg(0).map(String::as_str) {
        Some("health") => print_json(&service.check_health().await)?,
        Some("types") => print_json(&service.available_types().await)?,
        Some("search") => {
            let query = arg(1).ok_or("search needs a query")?;
            print_json(&service.search_places(query, &options).await?)?;
        }
        Some("address") => {
            let query = arg(1).ok_or("address needs a query")?;
            print_json(&service.search_addresses(query, &options).await?)?;
        }
        Some("reverse") => {
            let point = parse_point(arg(1), arg(2))?;
            print_json(&service.reverse_geocode(point, DEFAULT_REVERSE_ZOOM).await?)?;
        }
        Some("nearby") => {
            let point = parse_point(arg(1), arg(2))?;
            let category: PlaceCategory = arg(3).ok_or("nearby needs a place type")?.parse()?;
            let radius = match arg(4) {
                Some(r) => r.parse().map_err(|e| format!("invalid radius: {}", e))?,
                None => DEFAULT_NEARBY_RADIUS_METERS,
            };
            print_json(&service.find_nearby_places(point, &category, radius).await?)?;
        }
        Some("popular") => {
            let point = parse_point(arg(1), arg(2))?;
            print_json(&service.popular_places(point).await?)?;
        }
        Some("route") => {
            let origin = parse_point(arg(1), arg(2))?;
            let destination = parse_point(arg(3), arg(4))?;
            let profile: TravelProfile = match arg(5) {
                Some(p) => p.parse()?,
                None => TravelProfile::default(),
            };
            let route = service.calculate_route(origin, destination, profile).await?;
            eprintln!("{}", route.summary());
            print_json(&route)?;
        }
        Some("track") => {
            let ticks: usize = option("ticks")
                .and_then(|t| t.parse().ok())
                .unwrap_or(DEFAULT_TRACK_TICKS);
            run_tracking_demo(&config, ticks).await?;
        }
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_help();
            std::process::exit(2);
        }
        None => print_help(),
    }

    Ok(())
}

async fn run_tracking_demo(config: &Config, ticks: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut simulator = BusSimulator::new(0x5eed);
    simulator.add_bus(
        "B-101",
        vec![
            GeoPoint::new(4.5981, -74.0758)?,
            GeoPoint::new(4.6097, -74.0817)?,
            GeoPoint::new(4.6280, -74.0650)?,
        ],
        28.0,
    )?;
    simulator.add_bus(
        "B-202",
        vec![
            GeoPoint::new(4.6486, -74.0628)?,
            GeoPoint::new(4.6660, -74.0535)?,
        ],
        35.0,
    )?;

    let handle = simulator.spawn(config.simulation_interval)?;
    let mut updates = handle.subscribe();
    print_json(&*updates.borrow_and_update())?;

    for _ in 0..ticks {
        updates.changed().await?;
        print_json(&*updates.borrow_and_update())?;
    }

    handle.stop();
    Ok(())
}
