use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Asset, Location, User};

/// Lifecycle state of a booking, as assigned by the server.
///
/// The client never moves a booking between states on its own; it only
/// requests transitions (cancel, receive, return) and renders the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    CancellationRequested,
    Cancelled,
    Received,
    Returned,
}

impl BookingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Accepted => "Accepted",
            BookingStatus::Rejected => "Rejected",
            BookingStatus::CancellationRequested => "Cancellation Requested",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Received => "Received",
            BookingStatus::Returned => "Returned",
        }
    }

    /// Whether the server still counts this booking against the asset's
    /// calendar.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending
                | BookingStatus::Accepted
                | BookingStatus::CancellationRequested
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A booking as returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub asset: Asset,
    #[serde(default)]
    pub user: Option<User>,
    pub status: BookingStatus,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_mobile: String,
    #[serde(default)]
    pub contact_address: String,
    #[serde(default)]
    pub contact_location: Option<Location>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub received_image: Option<String>,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub returned_image: Option<String>,
    #[serde(default)]
    pub returned_at: Option<DateTime<Utc>>,
}

/// Payload for creating a booking request.
#[derive(Debug, Clone, Serialize)]
pub struct NewBooking {
    pub asset_id: i64,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub purpose: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_mobile: String,
    pub contact_address: String,
    pub contact_location_id: Option<i64>,
}

impl NewBooking {
    /// Pre-submit checks mirroring the service's own validation. Overlap
    /// detection stays entirely server-side and is surfaced as an error
    /// string on submission.
    pub fn validate(&self) -> Result<(), String> {
        if self.end_datetime <= self.start_datetime {
            return Err("End must be after start.".to_string());
        }
        if self.start_datetime < Utc::now() {
            return Err("Booking start time cannot be in the past.".to_string());
        }
        if self.contact_name.is_empty()
            || self.contact_mobile.is_empty()
            || self.contact_email.is_empty()
        {
            return Err("Please fill in all personal details.".to_string());
        }
        Ok(())
    }
}
