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

//! REST API server example for the ticket registry.
//!
//! Run with: `cargo run --example server`
//!
//! # Example requests
//!
//! ```bash
//! # Purchase
//! curl -X POST http://localhost:3000/tickets \
//!   -H "Content-Type: application/json" \
//!   -d '{"from_location": "London", "to_location": "France", "price_paid": "20.00",
//!        "user": {"first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com"}}'
//!
//! # Receipt
//! curl http://localhost:3000/tickets/<TICKET_ID>
//!
//! # Section listing
//! curl http://localhost:3000/sections/A
//!
//! # Change seat
//! curl -X PUT http://localhost:3000/tickets/<TICKET_ID>/seat \
//!   -H "Content-Type: application/json" -d '{"seat": "B2"}'
//!
//! # Remove passenger
//! curl -X DELETE http://localhost:3000/users/ada@example.com
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use train_ticket_rs::validation::{validate_email, validate_purchase};
use train_ticket_rs::{
    PurchaseRequest, Receipt, RegistryConfig, RegistryError, Seat, SeatHolder, Section, TicketId,
    TicketRegistry, ValidationError,
};

// === Request/Response DTOs ===

#[derive(Debug, Deserialize)]
pub struct ModifySeatRequest {
    pub seat: Seat,
}

/// Envelope for business outcomes: always HTTP 200.
#[derive(Debug, Serialize)]
pub struct OutcomeResponse<T: Serialize> {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TicketRegistry>,
}

// === Error Handling ===

pub enum AppError {
    Registry(RegistryError),
    Validation(ValidationError),
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        AppError::Registry(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = match &self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", e.to_string()),
            AppError::Registry(e) => {
                let (status, code) = match e {
                    RegistryError::ReceiptNotFound(_) => {
                        (StatusCode::NOT_FOUND, "RECEIPT_NOT_FOUND")
                    }
                    RegistryError::MissingEmail => (StatusCode::BAD_REQUEST, "MISSING_EMAIL"),
                    RegistryError::InvalidTicketId(_) => {
                        (StatusCode::BAD_REQUEST, "INVALID_TICKET_ID")
                    }
                    RegistryError::InvalidSection(_) => {
                        (StatusCode::BAD_REQUEST, "INVALID_SECTION")
                    }
                    RegistryError::InvalidSeat(_) => (StatusCode::BAD_REQUEST, "INVALID_SEAT"),
                    RegistryError::SeatOutOfRange { .. } => {
                        (StatusCode::BAD_REQUEST, "SEAT_OUT_OF_RANGE")
                    }
                    RegistryError::LockTimeout(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "REGISTRY_BUSY")
                    }
                };
                (status, code, e.to_string())
            }
        };

        (
            status,
            Json(ErrorResponse {
                error,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /tickets - Purchase a ticket.
async fn purchase_ticket(
    State(state): State<AppState>,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<OutcomeResponse<Receipt>>, AppError> {
    validate_purchase(&request)?;
    let outcome = state.registry.purchase_ticket(request)?;
    Ok(Json(OutcomeResponse {
        success: outcome.is_success(),
        message: outcome.message(),
        data: outcome.into_receipt(),
    }))
}

/// GET /tickets/{id} - Receipt details.
async fn get_receipt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Receipt>, AppError> {
    let ticket_id: TicketId = id.parse()?;
    Ok(Json(state.registry.get_receipt_details(&ticket_id)?))
}

/// GET /sections/{section} - Passengers in a section.
async fn list_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<Json<Vec<SeatHolder>>, AppError> {
    let section: Section = section.parse()?;
    let listing = state.registry.get_users_by_section(section)?;
    Ok(Json(listing.holders))
}

/// DELETE /users/{email} - Remove a passenger.
async fn remove_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<OutcomeResponse<TicketId>>, AppError> {
    validate_email(&email)?;
    let outcome = state.registry.remove_user(&email)?;
    let data = match outcome {
        train_ticket_rs::RemoveOutcome::Removed { ticket_id, .. } => Some(ticket_id),
        train_ticket_rs::RemoveOutcome::UserNotFound => None,
    };
    Ok(Json(OutcomeResponse {
        success: outcome.is_success(),
        message: outcome.message(),
        data,
    }))
}

/// PUT /tickets/{id}/seat - Change seat.
async fn modify_seat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ModifySeatRequest>,
) -> Result<Json<OutcomeResponse<Seat>>, AppError> {
    let ticket_id: TicketId = id.parse()?;
    let outcome = state
        .registry
        .modify_seat_by_ticket_id(&ticket_id, request.seat)?;
    Ok(Json(OutcomeResponse {
        success: outcome.is_success(),
        message: outcome.message(),
        data: outcome.updated_seat(),
    }))
}

// === Router ===

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/tickets", post(purchase_ticket))
        .route("/tickets/{id}", get(get_receipt))
        .route("/tickets/{id}/seat", put(modify_seat))
        .route("/sections/{section}", get(list_section))
        .route("/users/{email}", delete(remove_user))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let state = AppState {
        registry: Arc::new(TicketRegistry::new(RegistryConfig::default())),
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("Ticket API server running on http://127.0.0.1:3000");
    tracing::info!("  POST   /tickets              - Purchase a ticket");
    tracing::info!("  GET    /tickets/:id          - Receipt details");
    tracing::info!("  PUT    /tickets/:id/seat     - Change seat");
    tracing::info!("  GET    /sections/:section    - Passengers in a section");
    tracing::info!("  DELETE /users/:email         - Remove a passenger");

    axum::serve(listener, app).await?;
    Ok(())
}
