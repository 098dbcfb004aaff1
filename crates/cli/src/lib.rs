//! # oddjob
//!
//! Books restaurant reservations the moment they open.
//!
//! ## Commands
//!
//! - `oddjob book` - Run one booking now or at `--run-at`
//! - `oddjob serve` - Accept scheduler invocations at `POST /api/v1/invoke`
//!
//! ## Configuration
//!
//! Credentials and retry settings are read from a TOML file (`--config`,
//! `ODDJOB_CONFIG`, default `config.toml`) and `ODDJOB_`-prefixed
//! environment variables.

pub mod api;
pub mod booking;
pub mod commands;
pub mod schedule;
pub mod state;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Restaurant reservation booking.
#[derive(Debug, Parser)]
#[command(name = "oddjob")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(long, global = true, env = "ODDJOB_CONFIG", default_value = "config.toml")]
    pub config: PathBuf,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Book a reservation.
    Book(commands::book::BookArgs),
    /// Serve the invocation endpoint.
    Serve(commands::serve::ServeArgs),
}
