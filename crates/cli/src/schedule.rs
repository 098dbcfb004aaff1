//! Delayed start for the `book` command.
//!
//! Reservations usually open at a fixed wall-clock time; the run is started
//! the moment that time arrives.

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use tracing::{debug, info};

const COARSE_STEP: Duration = Duration::from_secs(30);
const FINE_STEP: Duration = Duration::from_secs(1);
const COARSE_THRESHOLD: Duration = Duration::from_secs(60);
const FINE_THRESHOLD: Duration = Duration::from_secs(5);

/// Parse a local start time, `YYYY-MM-DD HH:MM:SS`.
pub fn parse_run_at(value: &str) -> Result<DateTime<Local>> {
    let value = value.trim();
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| anyhow!("invalid run-at '{}', use YYYY-MM-DD HH:MM:SS", value))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| anyhow!("run-at '{}' does not exist in the local timezone", value))
}

/// How long to sleep before checking the clock again.
pub fn next_sleep(remaining: Duration) -> Duration {
    if remaining > COARSE_THRESHOLD {
        COARSE_STEP
    } else if remaining > FINE_THRESHOLD {
        FINE_STEP
    } else {
        remaining
    }
}

/// Sleep until `target`, logging the countdown.
pub async fn wait_until(target: DateTime<Local>) -> Result<()> {
    if target <= Local::now() {
        bail!("run-at {} is not in the future", target.format("%Y-%m-%d %H:%M:%S"));
    }

    info!("Waiting until {}", target.format("%Y-%m-%d %H:%M:%S"));

    loop {
        let Ok(remaining) = (target - Local::now()).to_std() else {
            break;
        };
        if remaining.is_zero() {
            break;
        }

        let step = next_sleep(remaining);
        if step == COARSE_STEP {
            info!("{}s until start", remaining.as_secs());
        } else {
            debug!("{}s until start", remaining.as_secs());
        }

        tokio::time::sleep(step).await;
    }

    info!("Starting");
    Ok(())
}
