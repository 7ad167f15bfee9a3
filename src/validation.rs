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

//! Request checks run by adapters before a request reaches the registry.

use crate::receipt::PurchaseRequest;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("FromLocation is required")]
    MissingFromLocation,

    #[error("ToLocation is required")]
    MissingToLocation,

    #[error("User is required")]
    MissingUser,

    #[error("PricePaid must be greater than zero")]
    InvalidPrice,

    #[error("email is required")]
    MissingEmail,
}

/// Checks that a purchase request is complete and carries a positive price.
///
/// A user counts as present when at least one of its fields is non-blank.
pub fn validate_purchase(request: &PurchaseRequest) -> Result<(), ValidationError> {
    let result = if request.from_location.trim().is_empty() {
        Err(ValidationError::MissingFromLocation)
    } else if request.to_location.trim().is_empty() {
        Err(ValidationError::MissingToLocation)
    } else if [
        &request.user.first_name,
        &request.user.last_name,
        &request.user.email,
    ]
    .iter()
    .all(|field| field.trim().is_empty())
    {
        Err(ValidationError::MissingUser)
    } else if request.price_paid <= Decimal::ZERO {
        Err(ValidationError::InvalidPrice)
    } else {
        Ok(())
    };

    if let Err(e) = &result {
        debug!(error = %e, "purchase request rejected");
    }
    result
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    Ok(())
}
