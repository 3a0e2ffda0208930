//! Glasscalc CLI
//!
//! Drives the calculation engine and the rate service from the terminal.

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use glasscalc_fx::RateServiceConfig;

mod commands;

/// Glasscalc CLI
#[derive(Parser, Debug)]
#[command(name = "glasscalc")]
#[command(about = "Calculator engine and currency conversion from the terminal")]
struct Args {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Rate source base URL (overrides GLASSCALC_RATE_URL)
    #[arg(long, global = true)]
    rate_url: Option<String>,

    /// Rate cache TTL in seconds (overrides GLASSCALC_RATE_TTL_SECS)
    #[arg(long, global = true)]
    ttl_secs: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay keys through the calculator, e.g. `calc 3 + 4 x 2 =`
    Calc {
        /// Keys: 0-9 . + - x / = % +/- C back
        #[arg(required = true, allow_hyphen_values = true)]
        keys: Vec<String>,

        /// Print every completed calculation
        #[arg(long)]
        history: bool,
    },

    /// Convert an amount between currencies
    Convert {
        amount: f64,
        from: String,
        to: String,
    },

    /// List currencies known to the rate source
    Currencies,

    /// Tip on a bill, optionally split between people
    Tip {
        bill: f64,
        percent: f64,
        #[arg(short, long, default_value = "1")]
        people: u32,
    },

    /// Price after a percentage discount
    Discount { price: f64, percent: f64 },

    /// Split a total evenly
    Split { total: f64, people: u32 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
    );
    if args.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // Load configuration
    let mut config = RateServiceConfig::from_env();
    if let Some(url) = args.rate_url {
        config.base_url = url;
    }
    if let Some(secs) = args.ttl_secs {
        if let Err(e) = config.set_ttl_secs(secs) {
            error!(error = %e, "Invalid configuration");
            return Err(anyhow::anyhow!("Configuration error: {}", e));
        }
    }
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    info!(rate_url = %config.base_url, "Starting glasscalc");

    match args.command {
        Command::Calc { keys, history } => commands::calc(&keys, history),
        Command::Convert { amount, from, to } => commands::convert(&config, amount, &from, &to).await,
        Command::Currencies => commands::currencies(&config).await,
        Command::Tip {
            bill,
            percent,
            people,
        } => commands::tip(bill, percent, people),
        Command::Discount { price, percent } => commands::discount(price, percent),
        Command::Split { total, people } => commands::split(total, people),
    }
}
