// Booking writer: validates requests, reserves inventory and keeps the booking ledger
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{info, warn};

use crate::config::HotelConfig;
use crate::error::BookingError;
use crate::inventory::InventoryStore;
use crate::models::{Booking, BookingRequest, BookingStatus, GuestInfo, NewRoomType, RoomType};
use crate::pricing::Quote;

#[derive(Debug, Default)]
pub struct BookingStats {
    pub validations: AtomicUsize,
    pub rejected_validations: AtomicUsize,
    pub reservations: AtomicUsize,
    pub conflicts: AtomicUsize,
    pub confirmations: AtomicUsize,
    pub rejections: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BookingStatsReport {
    pub validations: usize,
    pub rejected_validations: usize,
    pub reservations: usize,
    pub conflicts: usize,
    pub confirmations: usize,
    pub rejections: usize,
}

pub struct BookingService<S: InventoryStore> {
    store: Arc<S>,
    bookings: DashMap<String, Booking>,
    config: HotelConfig,
    stats: BookingStats,
}

impl<S: InventoryStore> BookingService<S> {
    pub fn new(store: Arc<S>, config: HotelConfig) -> Self {
        Self {
            store,
            bookings: DashMap::new(),
            config,
            stats: BookingStats::default(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &HotelConfig {
        &self.config
    }

    /// Creates a room type from the admin form, seeded from `opening` for the
    /// configured inventory horizon.
    pub fn add_room_type(
        &self,
        new: &NewRoomType,
        opening: NaiveDate,
    ) -> Result<RoomType, BookingError> {
        let room = RoomType::from_new(new, opening, self.config.inventory_horizon_days)?;
        self.store.add_room_type(room.clone())?;
        Ok(room)
    }

    /// Checks guests, availability and price without touching inventory.
    pub fn validate(&self, request: &BookingRequest) -> Result<Quote, BookingError> {
        self.stats.validations.fetch_add(1, Ordering::SeqCst);

        let result = self
            .check_request(request)
            .and_then(|_| self.store.quote(&request.stay, &request.rooms));

        if let Err(err) = &result {
            self.stats.rejected_validations.fetch_add(1, Ordering::SeqCst);
            info!(
                check_in = %request.stay.check_in,
                check_out = %request.stay.check_out,
                reason = %err,
                "booking validation rejected"
            );
        }
        result
    }

    /// Re-validates and writes the reservation. Stock that is already short
    /// fails with `InsufficientInventory` and leaves no trace. A reservation
    /// that passed that check but lost the race for the last rooms is kept in
    /// the ledger as rejected, priced as requested.
    pub fn reserve(
        &self,
        request: &BookingRequest,
        guest: GuestInfo,
    ) -> Result<Booking, BookingError> {
        guest.validate()?;
        self.check_request(request)?;
        let quoted = self.store.quote(&request.stay, &request.rooms)?;

        match self.store.reserve(&request.stay, &request.rooms) {
            Ok(quote) => {
                let booking = self.record(request, guest, quote, BookingStatus::Reserved, None);
                self.stats.reservations.fetch_add(1, Ordering::SeqCst);
                info!(
                    booking_id = %booking.id,
                    nights = booking.number_of_nights,
                    total_price = booking.total_price,
                    "booking reserved"
                );
                Ok(booking)
            }
            Err(err @ BookingError::ConcurrentBookingConflict { .. }) => {
                let booking = self.record(
                    request,
                    guest,
                    quoted,
                    BookingStatus::Rejected,
                    Some(err.to_string()),
                );
                self.stats.conflicts.fetch_add(1, Ordering::SeqCst);
                warn!(booking_id = %booking.id, reason = %err, "reservation lost a race");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    pub fn confirm(&self, id: &str) -> Result<Booking, BookingError> {
        let booking = self.transition(id, BookingStatus::Confirmed)?;
        self.stats.confirmations.fetch_add(1, Ordering::SeqCst);
        info!(booking_id = %id, "booking confirmed");
        Ok(booking)
    }

    /// Rejects a reserved booking and gives its rooms back to the inventory.
    pub fn reject(&self, id: &str, reason: Option<String>) -> Result<Booking, BookingError> {
        let mut entry = self
            .bookings
            .get_mut(id)
            .ok_or_else(|| BookingError::BookingNotFound(id.to_string()))?;

        ensure_transition(&entry, BookingStatus::Rejected)?;
        self.store.release(&entry.stay(), &entry.selections())?;

        entry.status = BookingStatus::Rejected;
        entry.rejection_reason = reason;
        self.stats.rejections.fetch_add(1, Ordering::SeqCst);
        info!(booking_id = %id, "booking rejected, inventory released");
        Ok(entry.value().clone())
    }

    pub fn get_booking(&self, id: &str) -> Option<Booking> {
        self.bookings.get(id).map(|b| b.value().clone())
    }

    /// Bookings newest first, optionally limited to check-ins in `month` (1-12).
    pub fn list_bookings(&self, month: Option<u32>) -> Result<Vec<Booking>, BookingError> {
        if let Some(month) = month {
            if !(1..=12).contains(&month) {
                return Err(BookingError::InvalidMonth(month));
            }
        }

        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| month.map_or(true, |m| b.check_in.month() == m))
            .map(|b| b.value().clone())
            .collect();
        bookings.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(bookings)
    }

    pub fn stats(&self) -> BookingStatsReport {
        BookingStatsReport {
            validations: self.stats.validations.load(Ordering::SeqCst),
            rejected_validations: self.stats.rejected_validations.load(Ordering::SeqCst),
            reservations: self.stats.reservations.load(Ordering::SeqCst),
            conflicts: self.stats.conflicts.load(Ordering::SeqCst),
            confirmations: self.stats.confirmations.load(Ordering::SeqCst),
            rejections: self.stats.rejections.load(Ordering::SeqCst),
        }
    }

    // Input and occupancy checks that do not depend on inventory counts
    fn check_request(&self, request: &BookingRequest) -> Result<(), BookingError> {
        let requested = request.merged_rooms();
        if requested.is_empty() {
            return Err(BookingError::MissingRoomSelection);
        }
        if request.adults == 0 {
            return Err(BookingError::InvalidGuestCount);
        }

        let mut capacity: u32 = 0;
        for selection in &requested {
            let room = self
                .store
                .room_type(&selection.room_type)
                .ok_or_else(|| BookingError::UnknownRoomType(selection.room_type.clone()))?;
            let room_capacity = room.max_occupancy.saturating_mul(selection.quantity);
            capacity = capacity.saturating_add(room_capacity);
        }

        let guests = request.guests();
        if guests > capacity {
            return Err(BookingError::OccupancyExceeded { guests, capacity });
        }
        Ok(())
    }

    fn record(
        &self,
        request: &BookingRequest,
        guest: GuestInfo,
        quote: Quote,
        status: BookingStatus,
        rejection_reason: Option<String>,
    ) -> Booking {
        loop {
            let id = new_booking_id();
            if let Entry::Vacant(slot) = self.bookings.entry(id.clone()) {
                let booking = Booking {
                    id,
                    user: guest,
                    check_in: request.stay.check_in,
                    check_out: request.stay.check_out,
                    rooms: quote.lines,
                    number_of_nights: quote.number_of_nights,
                    number_of_adults: request.adults,
                    number_of_children: request.children,
                    total_price: quote.total_price,
                    status,
                    rejection_reason,
                    created_at: Utc::now(),
                };
                slot.insert(booking.clone());
                return booking;
            }
        }
    }

    fn transition(&self, id: &str, next: BookingStatus) -> Result<Booking, BookingError> {
        let mut entry = self
            .bookings
            .get_mut(id)
            .ok_or_else(|| BookingError::BookingNotFound(id.to_string()))?;

        ensure_transition(&entry, next)?;
        entry.status = next;
        Ok(entry.value().clone())
    }
}

fn ensure_transition(booking: &Booking, next: BookingStatus) -> Result<(), BookingError> {
    if booking.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(BookingError::InvalidTransition {
            id: booking.id.clone(),
            from: booking.status,
            to: next,
        })
    }
}

fn new_booking_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("BK-{}", suffix)
}
