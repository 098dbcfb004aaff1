//! Book command - run one booking from the command line.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use oddjob_core::{
    create_client, selection::format_time, BookingOutcome, BookingRequest, Config, Platform,
};

use crate::booking::run_request;
use crate::schedule::{parse_run_at, wait_until};
use crate::state::AppState;

/// Arguments for the book command.
#[derive(Debug, Args)]
pub struct BookArgs {
    /// Reservation platform (resy or opentable).
    #[arg(long, default_value = "resy")]
    pub platform: Platform,

    /// Venue id (Resy) or restaurant id (OpenTable).
    #[arg(long)]
    pub venue_id: String,

    /// Reservation date, YYYY-MM-DD.
    #[arg(long)]
    pub date: String,

    /// Number of guests.
    #[arg(long, default_value = "2")]
    pub party_size: u32,

    /// Ideal time, e.g. 19:00.
    #[arg(long)]
    pub best: String,

    /// Earliest acceptable time.
    #[arg(long)]
    pub earliest: String,

    /// Latest acceptable time.
    #[arg(long)]
    pub latest: String,

    /// Preferred table type, matched case-insensitively (repeatable).
    #[arg(long = "table-type")]
    pub table_types: Vec<String>,

    /// Attempts before giving up (overrides orchestrator.max_attempts).
    #[arg(long)]
    pub retries: Option<u32>,

    /// Find and select a slot without booking it.
    #[arg(long)]
    pub dry_run: bool,

    /// Wait until this local time before starting, YYYY-MM-DD HH:MM:SS.
    #[arg(long)]
    pub run_at: Option<String>,
}

impl BookArgs {
    pub fn to_request(&self) -> BookingRequest {
        BookingRequest {
            platform: self.platform,
            venue_id: self.venue_id.clone(),
            date: self.date.clone(),
            party_size: self.party_size,
            best: self.best.clone(),
            earliest: self.earliest.clone(),
            latest: self.latest.clone(),
            table_types: (!self.table_types.is_empty()).then(|| self.table_types.clone()),
            retries: self.retries,
            dry_run: self.dry_run,
        }
    }
}

/// Execute the book command.
///
/// Returns whether a slot was booked (or selected, on a dry run).
pub async fn execute(args: BookArgs, config: &Config) -> Result<bool> {
    let start_at = args.run_at.as_deref().map(parse_run_at).transpose()?;

    // Surface credential problems before waiting for the start time.
    create_client(args.platform, config)
        .with_context(|| format!("Failed to create {} client", args.platform))?;

    let platform = args.platform;
    let client_config = config.clone();
    let state = AppState::new(config.orchestrator.clone()).with_client_factory(
        platform,
        Arc::new(move || create_client(platform, &client_config)),
    );

    let request = args.to_request();
    request
        .clone()
        .into_plan(state.today())
        .context("Invalid booking request")?;

    if let Some(start_at) = start_at {
        wait_until(start_at).await?;
    }

    let outcome = run_request(&state, request)
        .await
        .context("Booking failed")?;

    print_outcome(&outcome);
    Ok(outcome.is_success())
}

fn print_outcome(outcome: &BookingOutcome) {
    match outcome {
        BookingOutcome::Booked {
            confirmation,
            slot,
            attempts,
        } => {
            println!("Reservation booked!");
            println!();
            println!("  Platform:     {}", confirmation.platform);
            println!("  Time:         {}", format_time(slot.time));
            println!("  Table type:   {}", slot.table_type);
            println!("  Confirmation: {}", confirmation.confirmation_id);
            if let Some(reservation_id) = &confirmation.reservation_id {
                println!("  Reservation:  {}", reservation_id);
            }
            println!("  Attempts:     {}", attempts);
        }
        BookingOutcome::Selected { slot, attempts } => {
            println!("Dry run, not booked.");
            println!();
            println!("  Time:       {}", format_time(slot.time));
            println!("  Table type: {}", slot.table_type);
            println!("  Attempts:   {}", attempts);
        }
        BookingOutcome::Exhausted { attempts, failures } => {
            println!("No reservation after {} attempts.", attempts);
            for (i, failure) in failures.iter().enumerate() {
                println!("  {}. {}", i + 1, failure);
            }
        }
    }
}
