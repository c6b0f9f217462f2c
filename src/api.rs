// JSON request/response contract between the presentation layer and the booking core
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::booking::BookingService;
use crate::error::{BookingError, ErrorKind};
use crate::inventory::InventoryStore;
use crate::models::{
    Booking, BookingRequest, GuestInfo, NewRoomType, RoomSelection, RoomType, StayDates,
};
use crate::pricing::PriceLine;

// Booking form as posted by the site; dates are optional so a missing one can be reported
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    #[serde(default)]
    pub check_in: Option<NaiveDate>,
    #[serde(default)]
    pub check_out: Option<NaiveDate>,
    #[serde(default)]
    pub rooms: Vec<RoomSelection>,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
}

fn default_adults() -> u32 {
    1
}

impl BookingPayload {
    pub fn into_request(self) -> Result<BookingRequest, BookingError> {
        let (check_in, check_out) = match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) => (check_in, check_out),
            _ => return Err(BookingError::MissingDates),
        };
        if self.rooms.iter().all(|r| r.quantity == 0) {
            return Err(BookingError::MissingRoomSelection);
        }

        Ok(BookingRequest {
            stay: StayDates::new(check_in, check_out)?,
            rooms: self.rooms,
            adults: self.adults,
            children: self.children,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservePayload {
    #[serde(flatten)]
    pub booking: BookingPayload,
    #[serde(default)]
    pub user: Option<GuestInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RejectPayload {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuery {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingQuery {
    pub month: Option<u32>,
}

// Room card shown while browsing; the per-night counters stay in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub category: String,
    #[serde(rename = "isAC")]
    pub is_ac: bool,
    pub max_occupancy: u32,
    pub price: u64,
    pub description: String,
    pub amenities: Vec<String>,
    /// Rooms free on every night of the queried stay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_rooms: Option<u32>,
}

impl RoomSummary {
    fn new(room: RoomType, stay: Option<&StayDates>) -> Self {
        let available_rooms = stay.map(|stay| room.min_remaining(stay));
        Self {
            id: room.id,
            category: room.category,
            is_ac: room.is_ac,
            max_occupancy: room.max_occupancy,
            price: room.price,
            description: room.description,
            amenities: room.amenities,
            available_rooms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomsResponse {
    pub success: bool,
    pub rooms: Vec<RoomSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomResponse {
    pub success: bool,
    pub room: RoomSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub success: bool,
    pub number_of_nights: u32,
    pub total_price: u64,
    pub currency: String,
    pub rooms: Vec<PriceLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResponse {
    pub success: bool,
    pub booking: Booking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingsResponse {
    pub success: bool,
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub kind: ErrorKind,
}

/// A rejected call: the core's reason plus the HTTP status it maps to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(transparent)]
pub struct ApiError(#[from] pub BookingError);

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self.0.kind() {
            ErrorKind::MissingInput | ErrorKind::InvalidInput => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::InsufficientInventory | ErrorKind::Conflict => 409,
            ErrorKind::InvalidTransition => 422,
            ErrorKind::Internal => 500,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            message: self.0.to_string(),
            kind: self.0.kind(),
        }
    }
}

// Endpoints the website and the admin dashboard call
#[async_trait]
pub trait HotelApi: Send + Sync + 'static {
    // Room browsing, with free-room counts when a stay is given
    async fn list_rooms(&self, query: RoomQuery) -> Result<RoomsResponse, ApiError>;

    // Availability and price for a booking form, nothing is written
    async fn validate_booking(&self, payload: BookingPayload)
        -> Result<ValidationResponse, ApiError>;

    // Write the reservation after re-validating it
    async fn reserve(&self, payload: ReservePayload) -> Result<BookingResponse, ApiError>;

    // Admin: move a reserved booking to confirmed
    async fn confirm_booking(&self, id: &str) -> Result<BookingResponse, ApiError>;

    // Admin: reject a reserved booking and free its rooms
    async fn reject_booking(
        &self,
        id: &str,
        payload: RejectPayload,
    ) -> Result<BookingResponse, ApiError>;

    // Admin: booking list, optionally for one check-in month
    async fn view_bookings(&self, query: BookingQuery) -> Result<BookingsResponse, ApiError>;

    // Admin: add a room type from the dashboard form
    async fn add_room(&self, form: NewRoomType) -> Result<RoomResponse, ApiError>;
}

pub struct HotelService<S: InventoryStore> {
    bookings: Arc<BookingService<S>>,
    today: fn() -> NaiveDate,
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

impl<S: InventoryStore> HotelService<S> {
    pub fn new(bookings: Arc<BookingService<S>>) -> Self {
        Self {
            bookings,
            today: utc_today,
        }
    }

    /// Replaces the clock used as the opening date of newly added rooms.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn bookings(&self) -> &Arc<BookingService<S>> {
        &self.bookings
    }
}

#[async_trait]
impl<S: InventoryStore> HotelApi for HotelService<S> {
    async fn list_rooms(&self, query: RoomQuery) -> Result<RoomsResponse, ApiError> {
        let stay = match (query.check_in, query.check_out) {
            (Some(check_in), Some(check_out)) => Some(StayDates::new(check_in, check_out)?),
            (None, None) => None,
            _ => return Err(BookingError::MissingDates.into()),
        };

        let rooms = self
            .bookings
            .store()
            .room_types()
            .into_iter()
            .map(|room| RoomSummary::new(room, stay.as_ref()))
            .collect();

        Ok(RoomsResponse {
            success: true,
            rooms,
        })
    }

    async fn validate_booking(
        &self,
        payload: BookingPayload,
    ) -> Result<ValidationResponse, ApiError> {
        let request = payload.into_request()?;
        let quote = self.bookings.validate(&request)?;

        Ok(ValidationResponse {
            success: true,
            number_of_nights: quote.number_of_nights,
            total_price: quote.total_price,
            currency: self.bookings.config().currency.clone(),
            rooms: quote.lines,
        })
    }

    async fn reserve(&self, payload: ReservePayload) -> Result<BookingResponse, ApiError> {
        let request = payload.booking.into_request()?;
        let guest = payload.user.ok_or(BookingError::MissingGuestDetails)?;
        let booking = self.bookings.reserve(&request, guest)?;

        Ok(BookingResponse {
            success: true,
            booking,
        })
    }

    async fn confirm_booking(&self, id: &str) -> Result<BookingResponse, ApiError> {
        let booking = self.bookings.confirm(id)?;
        Ok(BookingResponse {
            success: true,
            booking,
        })
    }

    async fn reject_booking(
        &self,
        id: &str,
        payload: RejectPayload,
    ) -> Result<BookingResponse, ApiError> {
        let booking = self.bookings.reject(id, payload.reason)?;
        Ok(BookingResponse {
            success: true,
            booking,
        })
    }

    async fn view_bookings(&self, query: BookingQuery) -> Result<BookingsResponse, ApiError> {
        let bookings = self.bookings.list_bookings(query.month)?;
        Ok(BookingsResponse {
            success: true,
            bookings,
        })
    }

    async fn add_room(&self, form: NewRoomType) -> Result<RoomResponse, ApiError> {
        let room = self.bookings.add_room_type(&form, (self.today)())?;
        Ok(RoomResponse {
            success: true,
            room: RoomSummary::new(room, None),
        })
    }
}
