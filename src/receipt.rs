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

//! Receipts and the purchase request that creates them.
//!
//! Receipt lifecycle:
//!
//! ```text
//! (none) ──purchase──► active(seat S) ──modify──► active(seat S') ──remove──► (none)
//! ```

use crate::base::{Seat, TicketId, User};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A request to buy one ticket.
///
/// Field presence and `price_paid > 0` are checked by
/// [`crate::validation::validate_purchase`] before the registry sees it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PurchaseRequest {
    pub from_location: String,
    pub to_location: String,
    pub user: User,
    pub price_paid: Decimal,
}

impl PurchaseRequest {
    pub fn new(
        from_location: impl Into<String>,
        to_location: impl Into<String>,
        user: User,
        price_paid: Decimal,
    ) -> Self {
        Self {
            from_location: from_location.into(),
            to_location: to_location.into(),
            user,
            price_paid,
        }
    }
}

/// Record of a completed purchase.
///
/// The registry owns the authoritative copy; callers always receive clones.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Receipt {
    pub ticket_id: TicketId,
    pub from_location: String,
    pub to_location: String,
    pub user: User,
    pub price_paid: Decimal,
    pub seat: Seat,
    pub purchased_at: DateTime<Utc>,
}

impl Receipt {
    pub(crate) fn issue(
        ticket_id: TicketId,
        request: PurchaseRequest,
        seat: Seat,
        purchased_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ticket_id,
            from_location: request.from_location,
            to_location: request.to_location,
            user: request.user,
            price_paid: request.price_paid,
            seat,
            purchased_at,
        }
    }
}

/// One entry of a section listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeatHolder {
    pub user: User,
    pub seat: Seat,
}

impl From<&Receipt> for SeatHolder {
    fn from(receipt: &Receipt) -> Self {
        Self {
            user: receipt.user.clone(),
            seat: receipt.seat,
        }
    }
}
