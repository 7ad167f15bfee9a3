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

//! Ticket registry.
//!
//! The [`TicketRegistry`] owns every receipt and the seat occupancy index.
//! It supports five operations:
//!
//! - **Purchase**: Allocate the next free seat and issue a receipt.
//! - **Get receipt**: Look a receipt up by ticket ID.
//! - **List section**: Passengers seated in one section, ordered by seat.
//! - **Remove user**: Cancel a passenger's ticket by email, freeing the seat.
//! - **Modify seat**: Move a ticket to another free seat.
//!
//! # Thread Safety
//!
//! A single [`parking_lot::Mutex`] guards receipts, occupancy and the capacity
//! table together. Every operation holds it for its whole duration, so seat
//! allocation is linearizable and two purchases can never share a seat.

use crate::base::{Seat, Section, TicketId};
use crate::config::{ConfigError, RegistryConfig};
use crate::outcome::{ModifyOutcome, PurchaseOutcome, RemoveOutcome, SectionListing};
use crate::receipt::{PurchaseRequest, Receipt, SeatHolder};
use crate::RegistryError;
use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug)]
struct RegistryState {
    /// Receipts indexed by ticket ID.
    receipts: HashMap<TicketId, Receipt>,
    /// Seat -> ticket currently holding it. Derived from `receipts`.
    occupied: HashMap<Seat, TicketId>,
    /// Seats per section, iterated in allocation order.
    capacities: BTreeMap<Section, u16>,
}

impl RegistryState {
    fn new(capacities: BTreeMap<Section, u16>) -> Self {
        Self {
            receipts: HashMap::new(),
            occupied: HashMap::new(),
            capacities,
        }
    }

    fn assert_invariants(&self) {
        debug_assert_eq!(
            self.receipts.len(),
            self.occupied.len(),
            "Invariant violated: {} receipts but {} occupied seats",
            self.receipts.len(),
            self.occupied.len()
        );
        for (ticket_id, receipt) in &self.receipts {
            debug_assert_eq!(
                self.occupied.get(&receipt.seat),
                Some(ticket_id),
                "Invariant violated: seat {} not indexed to ticket {}",
                receipt.seat,
                ticket_id
            );
        }
        for (section, capacity) in &self.capacities {
            let taken = self.occupied.keys().filter(|s| s.section == *section).count();
            debug_assert!(
                taken <= usize::from(*capacity),
                "Invariant violated: section {} holds {} tickets, capacity {}",
                section,
                taken,
                capacity
            );
        }
    }

    /// First free seat scanning sections in priority order, then ordinals
    /// ascending. `None` when the train is full.
    fn find_next_available_seat(&self) -> Option<Seat> {
        self.capacities.iter().find_map(|(section, capacity)| {
            (1..=*capacity)
                .map(|number| Seat::new(*section, number))
                .find(|seat| !self.occupied.contains_key(seat))
        })
    }

    fn check_section(&self, section: Section) -> Result<u16, RegistryError> {
        self.capacities
            .get(&section)
            .copied()
            .ok_or_else(|| RegistryError::InvalidSection(section.to_string()))
    }

    /// Rejects seats that do not exist on this train.
    fn check_seat(&self, seat: Seat) -> Result<(), RegistryError> {
        let capacity = self.check_section(seat.section)?;
        if seat.number == 0 || seat.number > capacity {
            return Err(RegistryError::SeatOutOfRange { seat, capacity });
        }
        Ok(())
    }

    fn mint_ticket_id(&self) -> TicketId {
        loop {
            let ticket_id = TicketId::new();
            if !self.receipts.contains_key(&ticket_id) {
                return ticket_id;
            }
        }
    }

    fn insert(&mut self, receipt: Receipt) {
        self.occupied.insert(receipt.seat, receipt.ticket_id);
        self.receipts.insert(receipt.ticket_id, receipt);
        self.assert_invariants();
    }

    fn remove(&mut self, ticket_id: &TicketId) -> Option<Receipt> {
        let receipt = self.receipts.remove(ticket_id)?;
        self.occupied.remove(&receipt.seat);
        self.assert_invariants();
        Some(receipt)
    }

    /// Moves `ticket_id` to `new_seat`. The seat must already be range-checked.
    fn reassign(&mut self, ticket_id: &TicketId, new_seat: Seat) -> ModifyOutcome {
        let Some(receipt) = self.receipts.get_mut(ticket_id) else {
            return ModifyOutcome::ReceiptNotFound;
        };

        match self.occupied.get(&new_seat) {
            Some(holder) if holder == ticket_id => return ModifyOutcome::Updated(new_seat),
            Some(_) => return ModifyOutcome::SeatOccupied,
            None => {}
        }

        let old_seat = receipt.seat;
        receipt.seat = new_seat;
        self.occupied.remove(&old_seat);
        self.occupied.insert(new_seat, *ticket_id);
        self.assert_invariants();

        info!(%ticket_id, from = %old_seat, to = %new_seat, "seat reassigned");
        ModifyOutcome::Updated(new_seat)
    }

    fn listing(&self, section: Section) -> SectionListing {
        let mut holders: Vec<SeatHolder> = self
            .receipts
            .values()
            .filter(|receipt| receipt.seat.section == section)
            .map(SeatHolder::from)
            .collect();
        holders.sort_by_key(|holder| holder.seat);
        SectionListing { section, holders }
    }
}

/// In-memory seat allocator and receipt store for one train.
///
/// # Invariants
///
/// - Every receipt's seat maps back to that receipt's ticket ID.
/// - Every occupied seat belongs to exactly one stored receipt.
/// - No section holds more tickets than its configured capacity.
/// - Ticket IDs are never reused while the registry lives.
#[derive(Debug)]
pub struct TicketRegistry {
    inner: Mutex<RegistryState>,
    lock_timeout: Option<Duration>,
}

impl TicketRegistry {
    /// Creates an empty registry with the given section capacities.
    pub fn new(config: RegistryConfig) -> Self {
        let lock_timeout = config.lock_timeout();
        TicketRegistry {
            inner: Mutex::new(RegistryState::new(config.capacities)),
            lock_timeout,
        }
    }

    /// Like [`Self::new`], but validates the config first.
    pub fn try_new(config: RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryState>, RegistryError> {
        match self.lock_timeout {
            Some(timeout) => self
                .inner
                .try_lock_for(timeout)
                .ok_or(RegistryError::LockTimeout(timeout)),
            None => Ok(self.inner.lock()),
        }
    }

    /// Buys a ticket on the first free seat.
    ///
    /// A full train is not an error: it yields [`PurchaseOutcome::SoldOut`].
    ///
    /// # Errors
    ///
    /// - [`RegistryError::LockTimeout`] - The registry stayed busy past the deadline.
    pub fn purchase_ticket(
        &self,
        request: PurchaseRequest,
    ) -> Result<PurchaseOutcome, RegistryError> {
        let mut state = self.lock()?;

        let Some(seat) = state.find_next_available_seat() else {
            warn!(email = %request.user.email, "purchase failed: no available seats");
            return Ok(PurchaseOutcome::SoldOut);
        };

        let ticket_id = state.mint_ticket_id();
        let receipt = Receipt::issue(ticket_id, request, seat, Utc::now());
        state.insert(receipt.clone());

        info!(%ticket_id, %seat, email = %receipt.user.email, "ticket purchased");
        Ok(PurchaseOutcome::Purchased(receipt))
    }

    /// Returns a copy of the receipt for `ticket_id`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ReceiptNotFound`] - No such ticket.
    /// - [`RegistryError::LockTimeout`] - The registry stayed busy past the deadline.
    pub fn get_receipt_details(&self, ticket_id: &TicketId) -> Result<Receipt, RegistryError> {
        let state = self.lock()?;
        debug!(%ticket_id, "receipt lookup");
        state
            .receipts
            .get(ticket_id)
            .cloned()
            .ok_or(RegistryError::ReceiptNotFound(*ticket_id))
    }

    /// Lists passengers seated in `section`, ordered by seat.
    ///
    /// An empty section yields an empty listing.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidSection`] - The section is not configured on this train.
    /// - [`RegistryError::LockTimeout`] - The registry stayed busy past the deadline.
    pub fn get_users_by_section(&self, section: Section) -> Result<SectionListing, RegistryError> {
        let state = self.lock()?;
        state.check_section(section)?;
        Ok(state.listing(section))
    }

    /// Cancels the ticket held by `email` and frees its seat.
    ///
    /// If several tickets share the email, the one on the lowest seat (in
    /// allocation order) is removed.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::MissingEmail`] - `email` is blank.
    /// - [`RegistryError::LockTimeout`] - The registry stayed busy past the deadline.
    pub fn remove_user(&self, email: &str) -> Result<RemoveOutcome, RegistryError> {
        if email.trim().is_empty() {
            return Err(RegistryError::MissingEmail);
        }

        let mut state = self.lock()?;
        let found = state
            .receipts
            .values()
            .filter(|receipt| receipt.user.email == email)
            .min_by_key(|receipt| receipt.seat)
            .map(|receipt| receipt.ticket_id);

        let Some(ticket_id) = found else {
            warn!(%email, "removal failed: user not found");
            return Ok(RemoveOutcome::UserNotFound);
        };

        match state.remove(&ticket_id) {
            Some(receipt) => {
                info!(%ticket_id, seat = %receipt.seat, %email, "user removed");
                Ok(RemoveOutcome::Removed {
                    ticket_id,
                    seat: receipt.seat,
                })
            }
            None => Ok(RemoveOutcome::UserNotFound),
        }
    }

    /// Moves the ticket on `receipt` to `new_seat`.
    ///
    /// `receipt` only identifies the ticket; the registry's own copy is the
    /// one updated. Asking for the seat already held succeeds without change.
    ///
    /// # Outcomes
    ///
    /// | Outcome | When |
    /// |---------|------|
    /// | `Updated` | Seat was free, or already held by this ticket |
    /// | `ReceiptNotFound` | Ticket was removed since it was fetched, whatever `new_seat` is |
    /// | `SeatOccupied` | Another ticket holds `new_seat` |
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidSection`] - `new_seat` is in an unconfigured section.
    /// - [`RegistryError::SeatOutOfRange`] - `new_seat` exceeds its section's capacity.
    /// - [`RegistryError::LockTimeout`] - The registry stayed busy past the deadline.
    pub fn modify_user_seat(
        &self,
        receipt: &Receipt,
        new_seat: Seat,
    ) -> Result<ModifyOutcome, RegistryError> {
        let mut state = self.lock()?;
        if !state.receipts.contains_key(&receipt.ticket_id) {
            warn!(
                ticket_id = %receipt.ticket_id,
                seat = %new_seat,
                "seat change rejected: receipt not found"
            );
            return Ok(ModifyOutcome::ReceiptNotFound);
        }
        state.check_seat(new_seat)?;

        let outcome = state.reassign(&receipt.ticket_id, new_seat);
        if !outcome.is_success() {
            warn!(ticket_id = %receipt.ticket_id, seat = %new_seat, reason = outcome.message(), "seat change rejected");
        }
        Ok(outcome)
    }

    /// Looks up `ticket_id` and moves it to `new_seat` under one lock.
    ///
    /// # Errors
    ///
    /// Same as [`Self::modify_user_seat`], plus
    /// [`RegistryError::ReceiptNotFound`] when the ticket does not exist.
    pub fn modify_seat_by_ticket_id(
        &self,
        ticket_id: &TicketId,
        new_seat: Seat,
    ) -> Result<ModifyOutcome, RegistryError> {
        let mut state = self.lock()?;
        if !state.receipts.contains_key(ticket_id) {
            return Err(RegistryError::ReceiptNotFound(*ticket_id));
        }
        state.check_seat(new_seat)?;

        let outcome = state.reassign(ticket_id, new_seat);
        if !outcome.is_success() {
            warn!(%ticket_id, seat = %new_seat, reason = outcome.message(), "seat change rejected");
        }
        Ok(outcome)
    }

    /// Number of active receipts.
    pub fn receipt_count(&self) -> Result<usize, RegistryError> {
        Ok(self.lock()?.receipts.len())
    }

    /// Number of occupied seats in `section`.
    pub fn occupied_seats(&self, section: Section) -> Result<usize, RegistryError> {
        let state = self.lock()?;
        Ok(state.occupied.keys().filter(|seat| seat.section == section).count())
    }

    /// Free seats across all sections.
    pub fn available_seats(&self) -> Result<usize, RegistryError> {
        let state = self.lock()?;
        let total: usize = state.capacities.values().map(|c| usize::from(*c)).sum();
        Ok(total - state.occupied.len())
    }

    /// Configured seat count for `section`, zero if absent.
    pub fn capacity(&self, section: Section) -> Result<u16, RegistryError> {
        Ok(self.lock()?.capacities.get(&section).copied().unwrap_or(0))
    }

    /// Snapshot of every receipt, ordered by seat.
    pub fn receipts(&self) -> Result<Vec<Receipt>, RegistryError> {
        let state = self.lock()?;
        let mut receipts: Vec<Receipt> = state.receipts.values().cloned().collect();
        receipts.sort_by_key(|receipt| receipt.seat);
        Ok(receipts)
    }
}

impl Default for TicketRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}
