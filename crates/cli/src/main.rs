//! Truffle CLI - drive the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse and fill the cart
//! truffle catalog
//! truffle cart add 2
//! truffle cart qty 2 3
//! truffle cart show
//!
//! # Log in and book a delivery
//! truffle login -e ada@truffle.shop -p 'secret'
//! truffle checkout --date 2026-10-24
//! truffle checkout --date 2026-10-24 --slot 1 --notes "Ring twice"
//!
//! # Account
//! truffle profile
//! truffle address "Via Roma 1, Alba"
//! ```
//!
//! Cart and session state persist in `TRUFFLE_STATE_DIR` between runs; the
//! API session cookie does not, so every run starts by checking the session.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use truffle_core::{ProductId, SlotId};
use truffle_storefront::config::StorefrontConfig;
use truffle_storefront::error::AppError;
use truffle_storefront::state::Storefront;

mod commands;
mod surface;

use surface::TerminalSurface;

#[derive(Parser)]
#[command(name = "truffle")]
#[command(author, version, about = "Truffle shop storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the products for sale
    Catalog,
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Log in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "TRUFFLE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "TRUFFLE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Delivery address
        #[arg(short, long, default_value = "")]
        address: String,
    },
    /// Log out
    Logout,
    /// Show who is logged in
    Session,
    /// Book a delivery and place the order
    Checkout {
        /// Delivery date (`YYYY-MM-DD`)
        #[arg(short, long)]
        date: String,

        /// Delivery slot id; omit to list the slots for the date
        #[arg(short, long)]
        slot: Option<SlotId>,

        /// Notes for the courier
        #[arg(short, long, default_value = "")]
        notes: String,
    },
    /// Show account details and order history
    Profile,
    /// Change the delivery address
    Address {
        address: String,
    },
    /// Show the order just placed
    Confirmation,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add { product_id: ProductId },
    /// Set a line's quantity; 0 or anything non-numeric removes it
    Qty { product_id: ProductId, quantity: String },
    /// Remove a line
    Remove { product_id: ProductId },
    /// Empty the cart
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
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

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Configuration error: {e}");
            }
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "truffle_storefront=info,truffle_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        report_failure(e.as_ref());
        std::process::exit(1);
    }
}

/// Log a failed command, sending local faults to Sentry.
fn report_failure(error: &(dyn std::error::Error + 'static)) {
    let app_error = error.downcast_ref::<AppError>().or_else(|| {
        match error.downcast_ref::<commands::CommandError>() {
            Some(commands::CommandError::App(app)) => Some(app),
            _ => None,
        }
    });

    match app_error {
        Some(app) => {
            app.report();
            #[allow(clippy::print_stderr)]
            {
                eprintln!("error: {}", app.user_message());
            }
        }
        None => tracing::error!("Command failed: {error}"),
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let surface = Arc::new(TerminalSurface::new());
    let storefront = Storefront::from_config(config, surface.clone())?;

    match cli.command {
        Commands::Catalog => commands::shop::catalog(&storefront).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&storefront).await?,
            CartAction::Add { product_id } => commands::cart::add(&storefront, product_id).await?,
            CartAction::Qty {
                product_id,
                quantity,
            } => commands::cart::set_quantity(&storefront, product_id, &quantity).await?,
            CartAction::Remove { product_id } => {
                commands::cart::remove(&storefront, product_id).await?;
            }
            CartAction::Clear => commands::cart::clear(&storefront).await?,
        },
        Commands::Login { email, password } => {
            commands::account::login(&storefront, &email, password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
            address,
        } => commands::account::register(&storefront, name, email, password, address).await?,
        Commands::Logout => commands::account::logout(&storefront).await?,
        Commands::Session => commands::account::session(&storefront).await?,
        Commands::Checkout { date, slot, notes } => {
            commands::shop::checkout(&storefront, &date, slot, &notes).await?;
        }
        Commands::Profile => commands::account::profile(&storefront).await?,
        Commands::Address { address } => commands::account::address(&storefront, &address).await?,
        Commands::Confirmation => commands::shop::confirmation(&storefront).await?,
    }

    surface.flush_errors()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;
    use truffle_storefront::views::{Region, Surface, Tone};

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_checkout() {
        let cli = Cli::try_parse_from([
            "truffle", "checkout", "--date", "2026-10-24", "--slot", "3", "--notes", "Gate B",
        ])
        .unwrap();
        match cli.command {
            Commands::Checkout { date, slot, notes } => {
                assert_eq!(date, "2026-10-24");
                assert_eq!(slot, Some(SlotId::new(3)));
                assert_eq!(notes, "Gate B");
            }
            _ => panic!("expected checkout"),
        }
    }

    #[test]
    fn test_parse_cart_qty_keeps_raw_quantity() {
        let cli = Cli::try_parse_from(["truffle", "cart", "qty", "2", "abc"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cart {
                action: CartAction::Qty { ref quantity, .. }
            } if quantity == "abc"
        ));
    }

    #[test]
    fn test_terminal_surface_counts_errors() {
        let surface = TerminalSurface::new();
        surface.message(Region::LoginMessage, Tone::Error, "");
        assert!(surface.flush_errors().is_ok());

        surface.message(Region::LoginMessage, Tone::Error, "Invalid credentials");
        assert!(surface.flush_errors().is_err());
    }
}
