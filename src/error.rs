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

//! System errors raised by the ticket registry.
//!
//! Expected domain conditions (sold out, seat taken, unknown passenger) are
//! not errors; they are reported through the outcome types in
//! [`crate::outcome`].

use crate::base::{Seat, TicketId};
use std::time::Duration;
use thiserror::Error;

/// Registry failures that the caller should treat as a failed call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No receipt is stored under the ticket ID
    #[error("receipt not found for ticketID {0}")]
    ReceiptNotFound(TicketId),

    /// Removal was requested without an email
    #[error("email is required")]
    MissingEmail,

    /// Ticket ID is not a valid identifier
    #[error("invalid ticket ID: {0:?}")]
    InvalidTicketId(String),

    /// Section tag is unknown or not configured on this train
    #[error("invalid section: {0:?}")]
    InvalidSection(String),

    /// Seat string does not have the `<section><ordinal>` shape
    #[error("invalid seat: {0:?}")]
    InvalidSeat(String),

    /// Seat ordinal lies beyond the section's configured capacity
    #[error("seat {seat} is out of range (section capacity is {capacity})")]
    SeatOutOfRange { seat: Seat, capacity: u16 },

    /// Lock could not be acquired before the configured deadline
    #[error("registry busy: lock not acquired within {0:?}")]
    LockTimeout(Duration),
}
