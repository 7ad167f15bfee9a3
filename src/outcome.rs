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

//! Business outcomes.
//!
//! Every registry call that completes returns one of these, even when the
//! request could not be honoured. A failed outcome means "change the request
//! before retrying"; a [`crate::RegistryError`] means the call itself failed.

use crate::base::{Seat, Section, TicketId};
use crate::receipt::{Receipt, SeatHolder};
use serde::Serialize;

pub const MSG_PURCHASED: &str = "Ticket purchased successfully!";
pub const MSG_NO_AVAILABLE_SEATS: &str = "no available seats on the train";
pub const MSG_USER_REMOVED: &str = "user removed successfully";
pub const MSG_USER_NOT_FOUND: &str = "user not found";
pub const MSG_SEAT_UPDATED: &str = "seat updated successfully";
pub const MSG_RECEIPT_NOT_FOUND: &str = "receipt not found";
pub const MSG_SEAT_OCCUPIED: &str = "requested seat is already occupied";

/// Result of a purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased(Receipt),
    /// Every configured seat is taken.
    SoldOut,
}

impl PurchaseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Purchased(_))
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Purchased(_) => MSG_PURCHASED,
            Self::SoldOut => MSG_NO_AVAILABLE_SEATS,
        }
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            Self::Purchased(receipt) => Some(receipt),
            Self::SoldOut => None,
        }
    }

    pub fn into_receipt(self) -> Option<Receipt> {
        match self {
            Self::Purchased(receipt) => Some(receipt),
            Self::SoldOut => None,
        }
    }
}

/// Result of removing a passenger by email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed { ticket_id: TicketId, seat: Seat },
    UserNotFound,
}

impl RemoveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Removed { .. })
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Removed { .. } => MSG_USER_REMOVED,
            Self::UserNotFound => MSG_USER_NOT_FOUND,
        }
    }
}

/// Result of a seat reassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyOutcome {
    /// The receipt now holds this seat.
    Updated(Seat),
    /// The ticket was removed before the reassignment ran.
    ReceiptNotFound,
    /// Another ticket holds the requested seat.
    SeatOccupied,
}

impl ModifyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Updated(_))
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Updated(_) => MSG_SEAT_UPDATED,
            Self::ReceiptNotFound => MSG_RECEIPT_NOT_FOUND,
            Self::SeatOccupied => MSG_SEAT_OCCUPIED,
        }
    }

    pub fn updated_seat(&self) -> Option<Seat> {
        match self {
            Self::Updated(seat) => Some(*seat),
            _ => None,
        }
    }
}

/// Passengers seated in one section, ordered by seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionListing {
    pub section: Section,
    pub holders: Vec<SeatHolder>,
}

impl SectionListing {
    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn seats(&self) -> impl Iterator<Item = Seat> + '_ {
        self.holders.iter().map(|holder| holder.seat)
    }
}
