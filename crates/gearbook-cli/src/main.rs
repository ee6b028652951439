//! Gearbook CLI - a terminal client for the gearbook asset-booking service.
//!
//! Browse the asset inventory, file booking requests, and walk your own
//! bookings through their lifecycle (cancel, receive, return). All session
//! handling - token storage, silent refresh, 401 retry - lives in
//! gearbook-core; this binary is command dispatch and plain-text output.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gearbook_core::api::{ApiClient, ApiError, SignupRequest};
use gearbook_core::auth::{FileTokenStore, TokenStore};
use gearbook_core::config::Config;
use gearbook_core::models::{filter_assets, Asset, AssetFilter, Category, NewBooking};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_usage() {
    eprintln!(
        "gearbook - asset booking client

Usage: gearbook <command> [args]

Commands:
  login                         Log in and store the session tokens
  logout                        Drop the stored session tokens
  signup                        Create an account
  verify-email <token>          Verify an email address
  assets [--category N] [--subcategory N]
                                List assets, optionally filtered
  asset <id>                    Show one asset in detail
  categories                    List categories and subcategories
  bookings                      List your bookings
  book <asset-id> <start> <end> [--purpose TEXT] [--name TEXT]
       [--email TEXT] [--mobile TEXT] [--address TEXT] [--location N]
                                Request a booking (RFC 3339 timestamps)
  cancel <id> [reason]          Request cancellation of a booking
  receive <id> <image>          Mark an accepted booking as received
  return <id> <image>           Mark a received booking as returned

Environment:
  GEARBOOK_API_BASE             Override the service base URL"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        print_usage();
        return Ok(());
    };

    let config = Config::load()?;
    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(Config::config_dir()?));
    let client = ApiClient::new(&config.resolve_base_url(), store)?;

    let result = match command.as_str() {
        "login" => login(&client, config).await,
        "logout" => {
            client.logout();
            println!("Logged out.");
            Ok(())
        }
        "signup" => signup(&client).await,
        "verify-email" => verify_email(&client, &args).await,
        "assets" => list_assets(&client, &args).await,
        "asset" => show_asset(&client, &args).await,
        "categories" => list_categories(&client).await,
        "bookings" => list_bookings(&client).await,
        "book" => book(&client, &args).await,
        "cancel" => cancel(&client, &args).await,
        "receive" => handover(&client, &args, Handover::Receive).await,
        "return" => handover(&client, &args, Handover::Return).await,
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            bail!("Unknown command: {other}. Run `gearbook help` for usage.")
        }
    };

    if let Err(err) = result {
        if matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::AuthRequired | ApiError::Unauthorized)
        ) {
            eprintln!("Session expired or missing. Run `gearbook login` first.");
            std::process::exit(1);
        }
        return Err(err);
    }
    Ok(())
}

// ===== Prompts and argument helpers =====

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_with_default(label: &str, default: Option<&str>) -> Result<String> {
    let value = match default {
        Some(d) => prompt(&format!("{label} [{d}]"))?,
        None => prompt(label)?,
    };
    if value.is_empty() {
        if let Some(d) = default {
            return Ok(d.to_string());
        }
    }
    Ok(value)
}

/// Value of `--flag VALUE` if the flag is present. A flag with no
/// following value is an error, not an absent flag.
fn flag_value(args: &[String], flag: &str) -> Result<Option<String>> {
    match args.iter().position(|a| a == flag) {
        Some(i) => match args.get(i + 1) {
            Some(value) => Ok(Some(value.clone())),
            None => bail!("Missing value for {flag}"),
        },
        None => Ok(None),
    }
}

fn parse_id(args: &[String], what: &str) -> Result<i64> {
    let raw = args
        .get(2)
        .with_context(|| format!("Missing {what} argument"))?;
    raw.parse()
        .with_context(|| format!("Invalid {what}: {raw}"))
}

fn parse_datetime(raw: &str, what: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid {what} (expected RFC 3339, e.g. 2026-09-01T09:00:00Z): {raw}"))
}

// ===== Commands =====

async fn login(client: &ApiClient, mut config: Config) -> Result<()> {
    let username = prompt_with_default("Username", config.last_username.as_deref())?;
    if username.is_empty() {
        bail!("Username is required");
    }
    let password = rpassword::prompt_password("Password: ")?;

    client.login(&username, &password).await?;
    info!(username = %username, "Login succeeded");

    config.last_username = Some(username);
    config.save()?;
    println!("Login successful.");
    Ok(())
}

async fn signup(client: &ApiClient) -> Result<()> {
    let username = prompt("Username")?;
    let email = prompt("Email")?;
    let first_name = prompt("First name (optional)")?;
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    let response = client
        .signup(&SignupRequest {
            username,
            password,
            email,
            first_name: (!first_name.is_empty()).then_some(first_name),
        })
        .await?;

    println!("{} (user id {})", response.detail, response.id);
    Ok(())
}

async fn verify_email(client: &ApiClient, args: &[String]) -> Result<()> {
    let token = args.get(2).context("Missing verification token")?;
    let response = client.verify_email(token).await?;
    println!("{}", response.detail);
    Ok(())
}

async fn list_assets(client: &ApiClient, args: &[String]) -> Result<()> {
    let (assets, categories) =
        tokio::try_join!(client.fetch_assets(), client.fetch_categories())?;

    let filter = asset_filter_from_args(args, &categories)?;
    let visible = filter_assets(&assets, filter);

    if let Some(label) = filter.label(&categories) {
        println!("Filtering by: {label} ({} assets)", visible.len());
    }
    for asset in &visible {
        print_asset_row(asset);
    }
    if visible.is_empty() {
        println!("No assets found for the selected category.");
    }
    Ok(())
}

fn asset_filter_from_args(args: &[String], categories: &[Category]) -> Result<AssetFilter> {
    if let Some(raw) = flag_value(args, "--subcategory")? {
        let id: i64 = raw
            .parse()
            .with_context(|| format!("Invalid subcategory id: {raw}"))?;
        let category = categories
            .iter()
            .find(|c| c.subcategories.iter().any(|s| s.id == id))
            .map(|c| c.id)
            .unwrap_or(0);
        return Ok(AssetFilter::Subcategory { id, category });
    }
    if let Some(raw) = flag_value(args, "--category")? {
        let id = raw
            .parse()
            .with_context(|| format!("Invalid category id: {raw}"))?;
        return Ok(AssetFilter::Category(id));
    }
    Ok(AssetFilter::All)
}

fn print_asset_row(asset: &Asset) {
    let category = asset
        .category
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or("-");
    let location = asset
        .location
        .as_ref()
        .map(|l| l.name.as_str())
        .unwrap_or("-");
    println!(
        "{:>5}  {:<30}  {:<15}  {:<12}  {}",
        asset.id,
        asset.name,
        category,
        asset.status().to_string(),
        location
    );
}

async fn show_asset(client: &ApiClient, args: &[String]) -> Result<()> {
    let id = parse_id(args, "asset id")?;
    let asset = client.fetch_asset(id).await?;

    println!("{} (id {})", asset.name, asset.id);
    println!("Status: {}", asset.status());
    if let Some(ref category) = asset.category {
        match asset.subcategory {
            Some(ref sub) => println!("Category: {} > {}", category.name, sub.name),
            None => println!("Category: {}", category.name),
        }
    }
    if let Some(ref location) = asset.location {
        println!("Location: {}", location.name);
    }
    if let Some(ref serial) = asset.serial_number {
        println!("Serial: {serial}");
    }
    if !asset.description.is_empty() {
        println!("\n{}", asset.description);
    }
    if !asset.details.is_empty() {
        println!("\n{}", asset.details);
    }
    Ok(())
}

async fn list_categories(client: &ApiClient) -> Result<()> {
    let categories = client.fetch_categories().await?;
    for category in &categories {
        println!("{:>4}  {}", category.id, category.name);
        for sub in &category.subcategories {
            println!("      {:>4}  {}", sub.id, sub.name);
        }
    }
    Ok(())
}

async fn list_bookings(client: &ApiClient) -> Result<()> {
    let bookings = client.fetch_bookings().await?;
    if bookings.is_empty() {
        println!("No bookings.");
        return Ok(());
    }
    for booking in &bookings {
        println!(
            "{:>5}  {:<30}  {} -> {}  [{}]",
            booking.id,
            booking.asset.name,
            booking.start_datetime.format("%Y-%m-%d %H:%M"),
            booking.end_datetime.format("%Y-%m-%d %H:%M"),
            booking.status
        );
    }
    Ok(())
}

async fn book(client: &ApiClient, args: &[String]) -> Result<()> {
    let asset_id = parse_id(args, "asset id")?;
    let start = parse_datetime(args.get(3).context("Missing start time")?, "start time")?;
    let end = parse_datetime(args.get(4).context("Missing end time")?, "end time")?;

    let contact_name = match flag_value(args, "--name")? {
        Some(name) => name,
        None => prompt("Full name")?,
    };
    let contact_email = match flag_value(args, "--email")? {
        Some(email) => email,
        None => prompt("Email")?,
    };
    let contact_mobile = match flag_value(args, "--mobile")? {
        Some(mobile) => mobile,
        None => prompt("Mobile")?,
    };
    let purpose = flag_value(args, "--purpose")?
        .unwrap_or_else(|| format!("Booking for {contact_name}"));
    let contact_location_id = match flag_value(args, "--location")? {
        Some(raw) => Some(
            raw.parse()
                .with_context(|| format!("Invalid location id: {raw}"))?,
        ),
        None => None,
    };

    let booking = client
        .create_booking(&NewBooking {
            asset_id,
            start_datetime: start,
            end_datetime: end,
            purpose,
            contact_name,
            contact_email,
            contact_mobile,
            contact_address: flag_value(args, "--address")?.unwrap_or_default(),
            contact_location_id,
        })
        .await?;

    println!(
        "Booking created (id {}), status: {}",
        booking.id, booking.status
    );
    Ok(())
}

async fn cancel(client: &ApiClient, args: &[String]) -> Result<()> {
    let id = parse_id(args, "booking id")?;
    let reason = args.get(3).map(|s| s.as_str());
    let booking = client.cancel_booking(id, reason).await?;
    println!("Booking {} is now: {}", booking.id, booking.status);
    Ok(())
}

enum Handover {
    Receive,
    Return,
}

async fn handover(client: &ApiClient, args: &[String], action: Handover) -> Result<()> {
    let id = parse_id(args, "booking id")?;
    let image = args.get(3).context("Missing handover image path")?;
    let image = Path::new(image);

    let booking = match action {
        Handover::Receive => client.receive_booking(id, image).await?,
        Handover::Return => client.return_booking(id, image).await?,
    };
    println!("Booking {} is now: {}", booking.id, booking.status);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flag_value_extracts_following_argument() {
        let args = args(&["gearbook", "assets", "--category", "3"]);
        assert_eq!(
            flag_value(&args, "--category").unwrap().as_deref(),
            Some("3")
        );
        assert_eq!(flag_value(&args, "--subcategory").unwrap(), None);
    }

    #[test]
    fn flag_without_value_is_an_error_not_absent() {
        let args = args(&["gearbook", "assets", "--category"]);
        let err = flag_value(&args, "--category").unwrap_err();
        assert!(err.to_string().contains("--category"));
    }
}
