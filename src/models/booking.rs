use chrono::NaiveDate;
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use std::fmt;

use crate::models::{ServiceCategory, User, UserResponse, WorkerProfileResponse, WorkerWithOwner};
use crate::utils::to_chrono;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    Completed,
}

impl BookingStatus {
    #[cfg(test)]
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Accepted,
        BookingStatus::Rejected,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    /// Outgoing edges of the lifecycle graph.
    pub fn next_states(&self) -> &'static [BookingStatus] {
        match self {
            BookingStatus::Pending => &[
                BookingStatus::Accepted,
                BookingStatus::Rejected,
                BookingStatus::Cancelled,
            ],
            BookingStatus::Accepted => &[BookingStatus::Completed, BookingStatus::Cancelled],
            BookingStatus::Rejected | BookingStatus::Cancelled | BookingStatus::Completed => &[],
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        self.next_states().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub customer_id: ObjectId,
    pub worker_id: ObjectId,
    /// Midnight UTC of the booked day.
    pub service_date: DateTime,
    pub address: Option<String>,
    pub service_type: ServiceCategory,
    pub status: BookingStatus,
    pub description: Option<String>,
    pub warranty_until: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// A validated booking request as the ledger receives it.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub worker_id: ObjectId,
    pub service_date: NaiveDate,
    pub address: Option<String>,
    pub service_type: ServiceCategory,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BookingDetails {
    pub booking: Booking,
    pub customer: Option<User>,
    pub worker: Option<WorkerWithOwner>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingDto {
    pub worker_id: String,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    pub service_date: String,
    pub address: Option<String>,
    pub service_type: ServiceCategory,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateBookingStatusDto {
    pub status: BookingStatus,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub customer_id: String,
    pub worker_id: String,
    pub customer: Option<UserResponse>,
    pub worker: Option<WorkerProfileResponse>,
    pub service_date: chrono::DateTime<chrono::Utc>,
    pub address: Option<String>,
    pub service_type: ServiceCategory,
    pub status: BookingStatus,
    pub description: Option<String>,
    pub warranty_until: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        BookingResponse {
            id: booking.id.to_hex(),
            customer_id: booking.customer_id.to_hex(),
            worker_id: booking.worker_id.to_hex(),
            customer: None,
            worker: None,
            service_date: to_chrono(booking.service_date),
            address: booking.address,
            service_type: booking.service_type,
            status: booking.status,
            description: booking.description,
            warranty_until: to_chrono(booking.warranty_until),
            created_at: to_chrono(booking.created_at),
        }
    }
}

impl From<BookingDetails> for BookingResponse {
    fn from(details: BookingDetails) -> Self {
        let mut response = BookingResponse::from(details.booking);
        response.customer = details.customer.map(UserResponse::from);
        response.worker = details.worker.map(WorkerProfileResponse::from);
        response
    }
}
