// Stay pricing: nightly price x quantity x nights, summed over the selected room types
use serde::{Deserialize, Serialize};

use crate::error::BookingError;
use crate::models::{RoomSelection, RoomType};

// One priced room selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceLine {
    #[serde(rename = "type")]
    pub room_type: String,
    pub category: String,
    #[serde(rename = "isAC")]
    pub is_ac: bool,
    pub quantity: u32,
    pub nightly_price: u64,
    pub subtotal: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub number_of_nights: u32,
    pub lines: Vec<PriceLine>,
    pub total_price: u64,
}

pub fn line_price(room: &RoomType, quantity: u32, nights: u32) -> Result<u64, BookingError> {
    room.price
        .checked_mul(u64::from(quantity))
        .and_then(|per_night| per_night.checked_mul(u64::from(nights)))
        .ok_or_else(|| BookingError::PriceOverflow(room.id.clone()))
}

/// Prices every selection against its room type. `lookup` resolves a room
/// type id; unknown ids are rejected.
pub fn quote<'a, F>(
    selections: &[RoomSelection],
    nights: u32,
    lookup: F,
) -> Result<Quote, BookingError>
where
    F: Fn(&str) -> Option<&'a RoomType>,
{
    let mut lines = Vec::with_capacity(selections.len());
    let mut total: u64 = 0;

    for selection in selections {
        let room = lookup(&selection.room_type)
            .ok_or_else(|| BookingError::UnknownRoomType(selection.room_type.clone()))?;
        let subtotal = line_price(room, selection.quantity, nights)?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| BookingError::PriceOverflow(room.id.clone()))?;

        lines.push(PriceLine {
            room_type: room.id.clone(),
            category: room.category.clone(),
            is_ac: room.is_ac,
            quantity: selection.quantity,
            nightly_price: room.price,
            subtotal,
        });
    }

    Ok(Quote {
        number_of_nights: nights,
        lines,
        total_price: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyAvailability;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use test_case::test_case;

    fn room(id: &str, price: u64) -> RoomType {
        RoomType {
            id: id.to_string(),
            category: id.to_string(),
            is_ac: true,
            max_occupancy: 2,
            price,
            description: String::new(),
            amenities: vec![],
            availability: vec![DailyAvailability {
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                available_rooms: 3,
            }],
        }
    }

    fn catalog() -> BTreeMap<String, RoomType> {
        [room("deluxe", 2000), room("standard", 1200)]
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect()
    }

    #[test_case(2000, 2, 2, 8000)]
    #[test_case(2000, 1, 1, 2000)]
    #[test_case(1500, 3, 0, 0)]
    fn test_line_price(price: u64, quantity: u32, nights: u32, expected: u64) {
        assert_eq!(line_price(&room("r", price), quantity, nights), Ok(expected));
    }

    #[test]
    fn test_quote_sums_all_selections() {
        let rooms = catalog();
        let selections = vec![
            RoomSelection::new("deluxe", 2),
            RoomSelection::new("standard", 1),
        ];

        let quote = quote(&selections, 2, |id| rooms.get(id)).unwrap();

        assert_eq!(quote.number_of_nights, 2);
        assert_eq!(quote.lines[0].subtotal, 8000);
        assert_eq!(quote.lines[1].subtotal, 2400);
        assert_eq!(quote.total_price, 10400);
    }

    #[test]
    fn test_quote_rejects_unknown_room_type() {
        let rooms = catalog();
        let selections = vec![RoomSelection::new("penthouse", 1)];

        assert_eq!(
            quote(&selections, 1, |id| rooms.get(id)),
            Err(BookingError::UnknownRoomType("penthouse".to_string()))
        );
    }

    #[test]
    fn test_quote_reports_overflow() {
        let rooms: BTreeMap<String, RoomType> =
            [("huge".to_string(), room("huge", u64::MAX))].into();
        let selections = vec![RoomSelection::new("huge", 2)];

        assert_eq!(
            quote(&selections, 1, |id| rooms.get(id)),
            Err(BookingError::PriceOverflow("huge".to_string()))
        );
    }
}
