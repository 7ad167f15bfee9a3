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

//! # Train Ticket
//!
//! This library provides a seat-allocation and ticket registry for a single
//! train split into named sections, each with a fixed number of seats.
//!
//! ## Core Components
//!
//! - [`TicketRegistry`]: Allocates seats and stores receipts
//! - [`Receipt`]: Record of a purchase (route, passenger, price, seat)
//! - [`Seat`] / [`Section`]: Seat addressing, rendered as `"A3"`
//! - [`PurchaseOutcome`], [`RemoveOutcome`], [`ModifyOutcome`]: Business results
//! - [`RegistryError`]: System errors
//!
//! ## Example
//!
//! ```
//! use train_ticket_rs::{PurchaseRequest, RegistryConfig, Section, TicketRegistry, User};
//! use rust_decimal_macros::dec;
//!
//! let registry = TicketRegistry::new(RegistryConfig::default());
//!
//! // Buy a ticket
//! let request = PurchaseRequest::new(
//!     "London",
//!     "France",
//!     User::new("Ada", "Lovelace", "ada@example.com"),
//!     dec!(20.00),
//! );
//! let receipt = registry.purchase_ticket(request).unwrap().into_receipt().unwrap();
//! assert_eq!(receipt.seat.to_string(), "A1");
//!
//! // Move it to another seat
//! let outcome = registry.modify_user_seat(&receipt, "B3".parse().unwrap()).unwrap();
//! assert!(outcome.is_success());
//!
//! let listing = registry.get_users_by_section(Section::B).unwrap();
//! assert_eq!(listing.len(), 1);
//! ```
//!
//! ## Thread Safety
//!
//! The registry serializes all operations behind one mutex, so it can be
//! shared across threads with an [`std::sync::Arc`].

mod base;
pub mod config;
pub mod error;
pub mod outcome;
mod receipt;
mod registry;
pub mod validation;

pub use base::{Seat, Section, TicketId, User};
pub use config::{ConfigError, RegistryConfig};
pub use error::RegistryError;
pub use outcome::{ModifyOutcome, PurchaseOutcome, RemoveOutcome, SectionListing};
pub use receipt::{PurchaseRequest, Receipt, SeatHolder};
pub use registry::TicketRegistry;
pub use validation::ValidationError;
