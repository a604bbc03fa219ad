//! opensky: command-line access to OpenSky historical flights and tracks.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use comfy_table::{Cell, Table};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use opensky_client::{ClientConfig, ClientError, OpenSkyClient};
use opensky_core::config::{self, Config};
use opensky_core::query::TimeWindow;
use opensky_core::types::{Flight, TrackResponse};

#[derive(Parser)]
#[command(
    name = "opensky",
    version,
    about = "OpenSky historical flights and trajectories"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// OpenSky account name (overrides the config file)
    #[arg(long, env = "OPENSKY_USERNAME", global = true)]
    username: Option<String>,

    /// OpenSky account password (overrides the config file)
    #[arg(long, env = "OPENSKY_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// API root (overrides the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,
}

/// Optional time bounds. Epoch seconds or RFC 3339.
#[derive(Args, Debug, Default)]
struct WindowArgs {
    /// Start of the interval
    #[arg(long, value_parser = parse_time)]
    begin: Option<DateTime<Utc>>,

    /// End of the interval
    #[arg(long, value_parser = parse_time)]
    end: Option<DateTime<Utc>>,
}

impl From<WindowArgs> for TimeWindow {
    fn from(args: WindowArgs) -> Self {
        TimeWindow {
            begin: args.begin,
            end: args.end,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List all flights in a time interval
    Flights {
        #[command(flatten)]
        window: WindowArgs,
    },

    /// List flights of one aircraft
    Aircraft {
        /// Transponder address, lowercase hex (e.g. 3c675a)
        icao24: String,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// List flights arriving at an airport
    Arrivals {
        /// Airport ICAO code (e.g. EDDF)
        airport: String,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// List flights departing from an airport
    Departures {
        /// Airport ICAO code (e.g. EDDF)
        airport: String,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Show the trajectory of one aircraft
    Track {
        /// Transponder address, lowercase hex (e.g. 3c675a)
        icao24: String,

        /// Any time during the flight; omit for the live track
        #[arg(long, value_parser = parse_time)]
        time: Option<DateTime<Utc>>,
    },

    /// Write the current settings to ~/.opensky/config.yaml
    ///
    /// Credentials from flags or OPENSKY_USERNAME/OPENSKY_PASSWORD are
    /// saved too, and the password is stored in plaintext.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = resolve_config(config::load_config(), &cli);

    if let Commands::Config = cli.command {
        cmd_config(&config);
        return;
    }

    let client = OpenSkyClient::new(ClientConfig::from(&config)).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    tracing::debug!("Using {:?}", client.config());

    let json = cli.json;
    let result = match cli.command {
        Commands::Flights { window } => client
            .get_flights(window.into())
            .await
            .map(|f| print_flights(&f, json)),
        Commands::Aircraft { icao24, window } => client
            .get_flights_by_aircraft(&icao24, window.into())
            .await
            .map(|f| print_flights(&f, json)),
        Commands::Arrivals { airport, window } => client
            .get_arrivals_by_airport(&airport, window.into())
            .await
            .map(|f| print_flights(&f, json)),
        Commands::Departures { airport, window } => client
            .get_departures_by_airport(&airport, window.into())
            .await
            .map(|f| print_flights(&f, json)),
        Commands::Track { icao24, time } => client
            .get_track_by_aircraft(&icao24, time)
            .await
            .map(|t| print_track(&t, json)),
        Commands::Config => Ok(()),
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}

/// Layer command-line and environment settings over the config file.
fn resolve_config(mut config: Config, cli: &Cli) -> Config {
    if let Some(username) = &cli.username {
        config.credentials.username = username.clone();
    }
    if let Some(password) = &cli.password {
        config.credentials.password = password.clone();
    }
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    config
}

/// Accept epoch seconds or an RFC 3339 timestamp.
fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(seconds) = s.parse::<i64>() {
        return DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| format!("timestamp out of range: {s}"));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected epoch seconds or RFC 3339, got {s:?}: {e}"))
}

fn cmd_config(config: &Config) {
    match config::save_config(config) {
        Ok(path) => {
            println!("Config written to {}", path.display());
            if !config.credentials.password.is_empty() {
                eprintln!("Note: the password is stored in plaintext in that file");
            }
        }
        Err(e) => {
            eprintln!("Error writing config: {e}");
            std::process::exit(1);
        }
    }
}

fn report(err: &ClientError) {
    match err {
        ClientError::Upstream { status, message } => {
            eprintln!("Error: OpenSky returned {status}: {message}")
        }
        other => eprintln!("Error: {other}"),
    }
}

fn format_time(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or("-".into())
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("Error encoding JSON: {e}"),
    }
}

fn print_flights(flights: &[Flight], json: bool) {
    if json {
        print_json(flights);
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ICAO24",
        "Callsign",
        "From",
        "To",
        "First seen (UTC)",
        "Last seen (UTC)",
    ]);

    for f in flights {
        table.add_row(vec![
            Cell::new(&f.icao24),
            Cell::new(f.callsign.as_deref().unwrap_or("-")),
            Cell::new(f.est_departure_airport.as_deref().unwrap_or("-")),
            Cell::new(f.est_arrival_airport.as_deref().unwrap_or("-")),
            Cell::new(format_time(f.first_seen_time())),
            Cell::new(format_time(f.last_seen_time())),
        ]);
    }

    println!("{table}");
    println!("{} flights", flights.len());
}

fn print_track(track: &TrackResponse, json: bool) {
    if json {
        print_json(track);
        return;
    }

    println!();
    println!("Track: {} {}", track.icao24, track.callsign);
    println!(
        "  {} .. {}  ({} waypoints)",
        format_time(Some(track.start_time)),
        format_time(Some(track.end_time)),
        track.path.len()
    );
    println!();

    if track.path.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Time (UTC)", "Lat", "Lon", "Alt (m)", "Trk", "Ground"]);

    for wp in &track.path {
        table.add_row(vec![
            Cell::new(format_time(wp.time)),
            Cell::new(
                wp.latitude
                    .map(|l| format!("{l:.4}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                wp.longitude
                    .map(|l| format!("{l:.4}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                wp.baro_altitude
                    .map(|a| format!("{a:.0}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                wp.true_track
                    .map(|h| format!("{h:.1}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(if wp.on_ground { "yes" } else { "no" }),
        ]);
    }

    println!("{table}");
}
