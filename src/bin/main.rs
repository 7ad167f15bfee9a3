// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use train_ticket_rs::validation::{validate_email, validate_purchase};
use train_ticket_rs::{
    ConfigError, PurchaseOutcome, PurchaseRequest, RegistryConfig, RegistryError, Section, Seat,
    TicketId, TicketRegistry, User, ValidationError,
};

/// Train Ticket - Run ticket commands against a seat registry
///
/// Reads commands from a CSV file and writes the final passenger manifest,
/// ordered by seat, to stdout. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "train-ticket-rs")]
#[command(about = "Allocates train seats from a CSV of ticket commands", long_about = None)]
struct Args {
    /// Path to CSV file with commands
    ///
    /// Expected header: op,ticket,first_name,last_name,email,from,to,price,seat,section
    /// Example: cargo run -- commands.csv > manifest.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Section capacity as SECTION=SEATS; repeat or comma-separate for several
    #[arg(
        long = "section",
        value_name = "SECTION=SEATS",
        env = "TICKET_SECTIONS",
        value_delimiter = ',',
        default_values = ["A=5", "B=5"]
    )]
    sections: Vec<String>,

    /// Give up on a busy registry after this many milliseconds
    #[arg(long, value_name = "MS", env = "TICKET_LOCK_TIMEOUT_MS")]
    lock_timeout_ms: Option<u64>,
}

impl Args {
    fn registry_config(&self) -> Result<RegistryConfig, ConfigError> {
        let config = RegistryConfig::from_specs(&self.sections)?;
        Ok(match self.lock_timeout_ms {
            Some(ms) => config.with_lock_timeout(Duration::from_millis(ms)),
            None => config,
        })
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("unknown op {0:?}")]
    UnknownOp(String),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match args.registry_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", CliError::from(e));
            process::exit(2);
        }
    };
    info!(sections = ?config.capacities, "registry configured");

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            error!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let registry = match process_commands(BufReader::new(file), config) {
        Ok(registry) => registry,
        Err(e) => {
            error!("Error processing commands: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_manifest(&registry, std::io::stdout()) {
        error!("Error writing manifest: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the command format.
///
/// Only the columns relevant to `op` need values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CommandRecord {
    op: String,
    /// Caller-chosen label bound to the ticket minted by `purchase`
    ticket: String,
    first_name: String,
    last_name: String,
    email: String,
    from: String,
    to: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    price: Option<Decimal>,
    seat: String,
    section: String,
}

impl CommandRecord {
    fn purchase_request(&self) -> PurchaseRequest {
        PurchaseRequest::new(
            self.from.clone(),
            self.to.clone(),
            User::new(
                self.first_name.clone(),
                self.last_name.clone(),
                self.email.clone(),
            ),
            self.price.unwrap_or(Decimal::ZERO),
        )
    }
}

/// Applies one command. Business failures are logged, not returned.
fn apply(
    registry: &TicketRegistry,
    labels: &mut HashMap<String, TicketId>,
    record: CommandRecord,
) -> Result<(), CliError> {
    let resolve = |labels: &HashMap<String, TicketId>, label: &str| -> Result<TicketId, CliError> {
        match labels.get(label) {
            Some(ticket_id) => Ok(*ticket_id),
            None => Ok(label.parse::<TicketId>()?),
        }
    };

    match record.op.to_lowercase().as_str() {
        "purchase" => {
            let request = record.purchase_request();
            validate_purchase(&request)?;
            match registry.purchase_ticket(request)? {
                PurchaseOutcome::Purchased(receipt) => {
                    if !record.ticket.is_empty() {
                        labels.insert(record.ticket, receipt.ticket_id);
                    }
                }
                sold_out @ PurchaseOutcome::SoldOut => {
                    warn!(email = %record.email, "{}", sold_out.message());
                }
            }
        }
        "remove" => {
            validate_email(&record.email)?;
            let outcome = registry.remove_user(&record.email)?;
            if !outcome.is_success() {
                warn!(email = %record.email, "{}", outcome.message());
            }
        }
        "modify" => {
            let ticket_id = resolve(labels, &record.ticket)?;
            let seat: Seat = record.seat.parse()?;
            let outcome = registry.modify_seat_by_ticket_id(&ticket_id, seat)?;
            if !outcome.is_success() {
                warn!(%ticket_id, %seat, "{}", outcome.message());
            }
        }
        "show" => {
            let ticket_id = resolve(labels, &record.ticket)?;
            let receipt = registry.get_receipt_details(&ticket_id)?;
            info!(
                %ticket_id,
                seat = %receipt.seat,
                from = %receipt.from_location,
                to = %receipt.to_location,
                email = %receipt.user.email,
                price = %receipt.price_paid,
                "receipt"
            );
        }
        "list" => {
            let section: Section = record.section.parse()?;
            let listing = registry.get_users_by_section(section)?;
            for holder in &listing.holders {
                info!(%section, seat = %holder.seat, email = %holder.user.email, "seated");
            }
        }
        other => return Err(CliError::UnknownOp(other.to_string())),
    }
    Ok(())
}

/// Runs commands from a CSV reader against a fresh registry.
///
/// Parsing is streaming. Malformed rows and rejected commands are logged and
/// skipped.
///
/// # CSV Format
///
/// Columns: `op, ticket, first_name, last_name, email, from, to, price, seat, section`
/// - `op`: purchase, remove, modify, show, list
/// - `ticket`: label for the ticket (bound on purchase, referenced later)
///
/// # Example
///
/// ```csv
/// op,ticket,first_name,last_name,email,from,to,price,seat,section
/// purchase,t1,Ada,Lovelace,ada@example.com,London,France,20.00,,
/// modify,t1,,,,,,,B2,
/// list,,,,,,,,,B
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
fn process_commands<R: Read>(reader: R, config: RegistryConfig) -> Result<TicketRegistry, CliError> {
    let registry = TicketRegistry::try_new(config)?;
    let mut labels = HashMap::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for (line, result) in rdr.deserialize::<CommandRecord>().enumerate() {
        match result {
            Ok(record) => {
                let op = record.op.clone();
                if let Err(e) = apply(&registry, &mut labels, record) {
                    warn!(row = line + 1, %op, "skipping command: {}", e);
                }
            }
            Err(e) => {
                warn!(row = line + 1, "skipping malformed row: {}", e);
            }
        }
    }

    Ok(registry)
}

/// One manifest line.
#[derive(Debug, Serialize)]
struct ManifestRow {
    ticket_id: TicketId,
    seat: Seat,
    first_name: String,
    last_name: String,
    email: String,
    from: String,
    to: String,
    price_paid: Decimal,
    purchased_at: String,
}

/// Writes every active receipt as CSV, ordered by seat.
///
/// # CSV Format
///
/// Columns: `ticket_id, seat, first_name, last_name, email, from, to, price_paid, purchased_at`
///
/// # Errors
///
/// Returns an error if the registry is unavailable or writing fails.
fn write_manifest<W: Write>(registry: &TicketRegistry, writer: W) -> Result<(), CliError> {
    let mut wtr = Writer::from_writer(writer);

    for receipt in registry.receipts()? {
        wtr.serialize(ManifestRow {
            ticket_id: receipt.ticket_id,
            seat: receipt.seat,
            first_name: receipt.user.first_name,
            last_name: receipt.user.last_name,
            email: receipt.user.email,
            from: receipt.from_location,
            to: receipt.to_location,
            price_paid: receipt.price_paid,
            purchased_at: receipt.purchased_at.to_rfc3339(),
        })?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
