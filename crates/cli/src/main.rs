//! Vitrine CLI - Operator tools for the Vitrine admin.
//!
//! # Usage
//!
//! ```bash
//! # Walk a drafted order through the checkout wizard and submit it
//! vitrine checkout order.yaml
//!
//! # Validate every step without creating a cart or an order
//! vitrine checkout order.yaml --dry-run
//!
//! # Quote shipping for a draft's physical items
//! vitrine shipping 29100-000 order.yaml
//!
//! # Look up an address by CEP
//! vitrine address 29100-000
//!
//! # Check that a product slug is free
//! vitrine slug camiseta-basica
//!
//! # Create or update a coupon
//! vitrine coupon black-friday.yaml [--id cpn_123]
//! ```
//!
//! # Commands
//!
//! - `checkout` - Run the checkout wizard over a YAML draft
//! - `shipping` - Quote shipping and show the free option
//! - `address` - CEP lookup
//! - `slug` - Product slug / coupon code uniqueness
//! - `coupon` - Validate and write a coupon

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vitrine_admin::{AdminConfig, AppError};

mod commands;

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(author, version, about = "Vitrine admin CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the checkout wizard over a drafted order
    Checkout {
        /// YAML order draft
        draft: PathBuf,

        /// Validate every step, but create nothing
        #[arg(long)]
        dry_run: bool,
    },
    /// Quote shipping for the physical items of a draft
    Shipping {
        /// Destination CEP
        cep: String,

        /// YAML order draft
        draft: PathBuf,
    },
    /// Look up an address by CEP
    Address {
        /// CEP, masked or bare digits
        cep: String,
    },
    /// Check that a unique value is free
    Slug {
        /// Value to check
        value: String,

        /// What the value is
        #[arg(short, long, value_enum, default_value = "product")]
        resource: commands::lookup::SlugResource,
    },
    /// Create or update a coupon from a YAML file
    Coupon {
        /// YAML coupon form
        file: PathBuf,

        /// Update this coupon instead of creating one
        #[arg(long)]
        id: Option<String>,

        /// Validate only
        #[arg(long)]
        dry_run: bool,
    },
}

/// Initialize Sentry error tracking.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vitrine_admin=info,vitrine_cli=info".into());

    // JSON lines when shipping logs somewhere, text on a terminal
    let json = std::env::var("VITRINE_LOG_JSON").is_ok();
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AdminConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            print_error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from(2);
        }
    };

    // Dropped at the end of main, which flushes pending Sentry events
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            print_error(&format!("Error: {e}"));
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::print_stderr)]
fn print_error(line: &str) {
    eprintln!("{line}");
}

async fn run(cli: Cli, config: &AdminConfig) -> Result<(), AppError> {
    match cli.command {
        Commands::Checkout { draft, dry_run } => {
            commands::checkout::run(config, &draft, dry_run).await
        }
        Commands::Shipping { cep, draft } => commands::lookup::shipping(config, &cep, &draft).await,
        Commands::Address { cep } => commands::lookup::address(config, &cep).await,
        Commands::Slug { value, resource } => {
            commands::lookup::slug(config, resource, &value).await
        }
        Commands::Coupon { file, id, dry_run } => {
            commands::coupon::write(config, &file, id.as_deref(), dry_run).await
        }
    }
}
