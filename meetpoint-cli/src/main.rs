use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::PlannerOptions;

/// Weighted meeting point calculator
#[derive(Parser)]
#[command(name = "meetpoint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Google Maps API key (geocoding and travel distances)
    #[arg(long, env = "MEETPOINT_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Travel mode: driving, walking, bicycling or transit
    #[arg(
        short,
        long,
        env = "MEETPOINT_TRAVEL_MODE",
        default_value = "driving",
        global = true
    )]
    mode: String,

    /// HTTP timeout in seconds
    #[arg(long, env = "MEETPOINT_TIMEOUT_SECS", default_value = "30", global = true)]
    timeout: u64,

    /// Retries per HTTP request
    #[arg(long, env = "MEETPOINT_MAX_RETRIES", default_value = "2", global = true)]
    retries: u32,

    /// Maximum geocoded codes in cache
    #[arg(long, env = "MEETPOINT_CACHE_SIZE", default_value = "1000", global = true)]
    cache_size: u64,

    /// Never call Google Maps, even if an API key is set
    #[arg(long, global = true)]
    offline: bool,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the meeting point for a list of location codes
    Midpoint {
        /// File with one code per line, or a CSV file (reads stdin if omitted)
        input: Option<PathBuf>,

        /// Column holding the codes (CSV only)
        #[arg(long, default_value = "code")]
        column: String,

        /// Output the full plan as JSON
        #[arg(short, long)]
        json: bool,

        /// Write the map FeatureCollection to this file
        #[arg(long)]
        geojson: Option<PathBuf>,
    },

    /// Decode a full Plus Code
    Decode {
        /// Plus Code, e.g. 849VCWC8+R9
        code: String,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Encode a coordinate as a Plus Code
    Encode {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Number of digits (2, 4, 6, 8 or 10 to 15)
        #[arg(short, long, default_value = "10")]
        length: usize,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "meetpoint=debug"
    } else {
        "meetpoint=error"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = PlannerOptions {
        api_key: cli.api_key,
        mode: cli.mode,
        timeout_secs: cli.timeout,
        max_retries: cli.retries,
        cache_size: cli.cache_size,
        offline: cli.offline,
    };

    match cli.command {
        Commands::Midpoint {
            input,
            column,
            json,
            geojson,
        } => commands::midpoint::run(&options, input, &column, json, geojson),
        Commands::Decode { code, json } => commands::decode::run(&code, json),
        Commands::Encode { lat, lng, length } => commands::encode::run(lat, lng, length),
    }
}
