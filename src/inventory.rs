// Room inventory store: room type definitions and per-night remaining counts
use std::collections::BTreeMap;

use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::availability::check_availability;
use crate::error::BookingError;
use crate::models::{merge_selections, RoomSelection, RoomType, StayDates};
use crate::pricing::{self, Quote};

// Store trait so the booking writer can run against other backends
pub trait InventoryStore: Send + Sync + 'static {
    // Add a new room type; fails if the id is already taken
    fn add_room_type(&self, room: RoomType) -> Result<(), BookingError>;

    fn room_type(&self, id: &str) -> Option<RoomType>;

    // All room types ordered by id
    fn room_types(&self) -> Vec<RoomType>;

    // Remaining rooms of a type on one night, None for an unknown type
    fn remaining(&self, id: &str, date: NaiveDate) -> Option<u32>;

    // Availability check plus pricing against the current counters
    fn quote(&self, stay: &StayDates, selections: &[RoomSelection])
        -> Result<Quote, BookingError>;

    // Re-validate and decrement every night of the stay as one step.
    // Losing a race since the last quote is reported as a conflict.
    fn reserve(
        &self,
        stay: &StayDates,
        selections: &[RoomSelection],
    ) -> Result<Quote, BookingError>;

    // Give rooms taken by `reserve` back
    fn release(&self, stay: &StayDates, selections: &[RoomSelection])
        -> Result<(), BookingError>;
}

#[derive(Debug, Default)]
pub struct InMemoryInventory {
    rooms: RwLock<BTreeMap<String, RoomType>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rooms(rooms: impl IntoIterator<Item = RoomType>) -> Result<Self, BookingError> {
        let store = Self::new();
        for room in rooms {
            store.add_room_type(room)?;
        }
        Ok(store)
    }
}

impl InventoryStore for InMemoryInventory {
    fn add_room_type(&self, mut room: RoomType) -> Result<(), BookingError> {
        room.normalize();

        let mut rooms = self.rooms.write();
        if rooms.contains_key(&room.id) {
            return Err(BookingError::DuplicateRoomType(room.id));
        }

        info!(
            room_type = %room.id,
            price = room.price,
            nights = room.availability.len(),
            "room type added"
        );
        rooms.insert(room.id.clone(), room);
        Ok(())
    }

    fn room_type(&self, id: &str) -> Option<RoomType> {
        self.rooms.read().get(id).cloned()
    }

    fn room_types(&self) -> Vec<RoomType> {
        self.rooms.read().values().cloned().collect()
    }

    fn remaining(&self, id: &str, date: NaiveDate) -> Option<u32> {
        self.rooms.read().get(id).map(|room| room.remaining_on(date))
    }

    fn quote(
        &self,
        stay: &StayDates,
        selections: &[RoomSelection],
    ) -> Result<Quote, BookingError> {
        let rooms = self.rooms.read();
        let nights = check_availability(stay, selections, |id| rooms.get(id))?;
        pricing::quote(&merge_selections(selections), nights, |id| rooms.get(id))
    }

    fn reserve(
        &self,
        stay: &StayDates,
        selections: &[RoomSelection],
    ) -> Result<Quote, BookingError> {
        let mut rooms = self.rooms.write();

        let nights = check_availability(stay, selections, |id| rooms.get(id)).map_err(
            |err| match err {
                BookingError::InsufficientInventory { .. } => {
                    BookingError::ConcurrentBookingConflict {
                        reason: err.to_string(),
                    }
                }
                other => other,
            },
        )?;
        let requested = merge_selections(selections);
        let quote = pricing::quote(&requested, nights, |id| rooms.get(id))?;

        // Decrement copies first so a failure leaves the store untouched
        let mut updated = Vec::with_capacity(requested.len());
        for selection in &requested {
            let mut room = rooms
                .get(&selection.room_type)
                .cloned()
                .ok_or_else(|| BookingError::UnknownRoomType(selection.room_type.clone()))?;

            for date in stay.dates() {
                let slot = room.remaining_mut(date);
                let next = slot
                    .as_deref()
                    .and_then(|remaining| remaining.checked_sub(selection.quantity));
                match (slot, next) {
                    (Some(remaining), Some(next)) => *remaining = next,
                    _ => {
                        return Err(BookingError::ConcurrentBookingConflict {
                            reason: format!(
                                "{} sold out on {} while reserving",
                                selection.room_type, date
                            ),
                        })
                    }
                }
            }
            updated.push(room);
        }

        for room in updated {
            debug!(room_type = %room.id, "inventory decremented");
            rooms.insert(room.id.clone(), room);
        }

        Ok(quote)
    }

    fn release(
        &self,
        stay: &StayDates,
        selections: &[RoomSelection],
    ) -> Result<(), BookingError> {
        let mut rooms = self.rooms.write();

        for selection in merge_selections(selections) {
            let room = rooms
                .get_mut(&selection.room_type)
                .ok_or_else(|| BookingError::UnknownRoomType(selection.room_type.clone()))?;

            for date in stay.dates() {
                match room.remaining_mut(date) {
                    Some(remaining) => *remaining = remaining.saturating_add(selection.quantity),
                    None => warn!(
                        room_type = %selection.room_type,
                        %date,
                        "no inventory row to release into"
                    ),
                }
            }
        }

        Ok(())
    }
}
