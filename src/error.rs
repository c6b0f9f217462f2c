// Error types for the booking core
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::models::BookingStatus;

// Rejection reasons surfaced to the caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Check-in and check-out dates are required")]
    MissingDates,

    #[error("At least one room must be selected")]
    MissingRoomSelection,

    #[error("Guest name and email are required")]
    MissingGuestDetails,

    #[error("Check-out ({check_out}) must be after check-in ({check_in})")]
    InvalidDateRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("At least one adult is required")]
    InvalidGuestCount,

    #[error("{guests} guests exceed the capacity of the selected rooms ({capacity})")]
    OccupancyExceeded { guests: u32, capacity: u32 },

    #[error("Unknown room type: {0}")]
    UnknownRoomType(String),

    #[error(
        "Not enough {room_type} rooms on {date}: {requested} requested, {remaining} remaining"
    )]
    InsufficientInventory {
        room_type: String,
        date: NaiveDate,
        requested: u32,
        remaining: u32,
    },

    #[error("Rooms were booked by someone else in the meantime: {reason}")]
    ConcurrentBookingConflict { reason: String },

    #[error("Total price overflows for room type {0}")]
    PriceOverflow(String),

    #[error("Invalid room definition: {0}")]
    InvalidRoom(String),

    #[error("Room type already exists: {0}")]
    DuplicateRoomType(String),

    #[error("Invalid month: {0}")]
    InvalidMonth(u32),

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Booking {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: BookingStatus,
        to: BookingStatus,
    },
}

/// Coarse category of a [`BookingError`], used by callers to pick a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingInput,
    InvalidInput,
    InsufficientInventory,
    Conflict,
    NotFound,
    InvalidTransition,
    /// Transport-level failure outside the booking core.
    Internal,
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::MissingDates
            | BookingError::MissingRoomSelection
            | BookingError::MissingGuestDetails => ErrorKind::MissingInput,
            BookingError::InvalidDateRange { .. }
            | BookingError::InvalidGuestCount
            | BookingError::OccupancyExceeded { .. }
            | BookingError::PriceOverflow(_)
            | BookingError::InvalidRoom(_)
            | BookingError::InvalidMonth(_) => ErrorKind::InvalidInput,
            BookingError::InsufficientInventory { .. } => ErrorKind::InsufficientInventory,
            BookingError::ConcurrentBookingConflict { .. }
            | BookingError::DuplicateRoomType(_) => ErrorKind::Conflict,
            BookingError::UnknownRoomType(_) | BookingError::BookingNotFound(_) => {
                ErrorKind::NotFound
            }
            BookingError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Failed to read room file {path}: {source}")]
    RoomFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse room file {path}: {source}")]
    RoomFileFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_inventory_message_names_type_and_date() {
        let err = BookingError::InsufficientInventory {
            room_type: "deluxe-ac".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            requested: 4,
            remaining: 3,
        };

        let message = err.to_string();
        assert!(message.contains("deluxe-ac"));
        assert!(message.contains("2024-05-02"));
        assert_eq!(err.kind(), ErrorKind::InsufficientInventory);
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(BookingError::MissingDates.kind(), ErrorKind::MissingInput);
        assert_eq!(
            BookingError::MissingRoomSelection.kind(),
            ErrorKind::MissingInput
        );
        assert_eq!(
            BookingError::ConcurrentBookingConflict {
                reason: "sold out".to_string()
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            BookingError::BookingNotFound("BK1".to_string()).kind(),
            ErrorKind::NotFound
        );
    }
}
