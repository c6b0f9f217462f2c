// Availability check: every night of the stay must have enough rooms of every requested type
use chrono::NaiveDate;
use tracing::debug;

use crate::error::BookingError;
use crate::models::{merge_selections, RoomSelection, RoomType, StayDates};

/// A night on which a room type cannot cover the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub room_type: String,
    pub date: NaiveDate,
    pub requested: u32,
    pub remaining: u32,
}

impl From<Shortfall> for BookingError {
    fn from(s: Shortfall) -> Self {
        BookingError::InsufficientInventory {
            room_type: s.room_type,
            date: s.date,
            requested: s.requested,
            remaining: s.remaining,
        }
    }
}

/// Returns the first under-supplied (night, room type) pair, walking nights
/// in order and the requested types within each night.
pub fn find_shortfall<'a, F>(
    stay: &StayDates,
    selections: &[RoomSelection],
    lookup: F,
) -> Result<Option<Shortfall>, BookingError>
where
    F: Fn(&str) -> Option<&'a RoomType>,
{
    let requested = merge_selections(selections);
    if requested.is_empty() {
        return Err(BookingError::MissingRoomSelection);
    }

    let rooms = requested
        .iter()
        .map(|selection| {
            lookup(&selection.room_type)
                .map(|room| (room, selection.quantity))
                .ok_or_else(|| BookingError::UnknownRoomType(selection.room_type.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    for date in stay.dates() {
        for (room, quantity) in &rooms {
            let remaining = room.remaining_on(date);
            if remaining < *quantity {
                return Ok(Some(Shortfall {
                    room_type: room.id.clone(),
                    date,
                    requested: *quantity,
                    remaining,
                }));
            }
        }
    }

    Ok(None)
}

/// Checks the whole stay and returns its number of nights.
pub fn check_availability<'a, F>(
    stay: &StayDates,
    selections: &[RoomSelection],
    lookup: F,
) -> Result<u32, BookingError>
where
    F: Fn(&str) -> Option<&'a RoomType>,
{
    if let Some(shortfall) = find_shortfall(stay, selections, lookup)? {
        debug!(
            room_type = %shortfall.room_type,
            date = %shortfall.date,
            requested = shortfall.requested,
            remaining = shortfall.remaining,
            "insufficient inventory"
        );
        return Err(shortfall.into());
    }

    Ok(stay.nights())
}
