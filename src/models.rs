// Domain types shared by the inventory store, the booking writer and the JSON contract
use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BookingError;
use crate::pricing::PriceLine;

// Remaining rooms of one type on one night
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAvailability {
    pub date: NaiveDate,
    pub available_rooms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomType {
    pub id: String,
    #[serde(rename = "type")]
    pub category: String,
    #[serde(rename = "isAC")]
    pub is_ac: bool,
    pub max_occupancy: u32,
    pub price: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Sorted by date, one entry per night at most.
    pub availability: Vec<DailyAvailability>,
}

impl RoomType {
    /// Builds a room type from admin input, with `total_rooms` free on every
    /// night from `opening` for `horizon_days` nights.
    pub fn from_new(
        new: &NewRoomType,
        opening: NaiveDate,
        horizon_days: u32,
    ) -> Result<Self, BookingError> {
        new.validate()?;

        let availability = opening
            .iter_days()
            .take(horizon_days as usize)
            .map(|date| DailyAvailability {
                date,
                available_rooms: new.total_rooms,
            })
            .collect();

        Ok(Self {
            id: room_type_id(&new.room_type, new.is_ac),
            category: new.room_type.trim().to_string(),
            is_ac: new.is_ac,
            max_occupancy: new.max_occupancy,
            price: new.price,
            description: new.description.trim().to_string(),
            amenities: new.amenity_list(),
            availability,
        })
    }

    /// Remaining count for a night; nights outside the stored sequence have none.
    pub fn remaining_on(&self, date: NaiveDate) -> u32 {
        self.availability
            .binary_search_by_key(&date, |slot| slot.date)
            .map(|idx| self.availability[idx].available_rooms)
            .unwrap_or(0)
    }

    pub(crate) fn remaining_mut(&mut self, date: NaiveDate) -> Option<&mut u32> {
        match self.availability.binary_search_by_key(&date, |slot| slot.date) {
            Ok(idx) => Some(&mut self.availability[idx].available_rooms),
            Err(_) => None,
        }
    }

    /// Smallest remaining count across every night of the stay. A stay that
    /// reaches past the stored nights has a night with no rooms, so only
    /// stays inside that range are walked.
    pub fn min_remaining(&self, stay: &StayDates) -> u32 {
        let (first, last) = match (self.availability.first(), self.availability.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => return 0,
        };
        if stay.check_in < first || stay.last_night() > last {
            return 0;
        }

        stay.dates()
            .map(|date| self.remaining_on(date))
            .min()
            .unwrap_or(0)
    }

    pub(crate) fn normalize(&mut self) {
        self.availability.sort_by_key(|slot| slot.date);
        self.availability.dedup_by_key(|slot| slot.date);
    }
}

/// Identifier derived from the category label and AC flag, e.g. `deluxe-ac`.
pub fn room_type_id(label: &str, is_ac: bool) -> String {
    let mut slug = String::with_capacity(label.len() + 7);
    for ch in label.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    if is_ac {
        format!("{}-ac", slug)
    } else {
        format!("{}-non-ac", slug)
    }
}

// Admin "add room" form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoomType {
    pub room_type: String,
    #[serde(rename = "isAC", default)]
    pub is_ac: bool,
    pub price: u64,
    pub total_rooms: u32,
    #[serde(default)]
    pub description: String,
    // Comma-separated, as typed into the form
    #[serde(default)]
    pub amenities: String,
    pub max_occupancy: u32,
}

impl NewRoomType {
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.room_type.trim().is_empty() {
            return Err(BookingError::InvalidRoom("room type is required".to_string()));
        }
        if self.price == 0 {
            return Err(BookingError::InvalidRoom(
                "price must be greater than zero".to_string(),
            ));
        }
        if self.total_rooms == 0 {
            return Err(BookingError::InvalidRoom(
                "total rooms must be greater than zero".to_string(),
            ));
        }
        if self.max_occupancy == 0 {
            return Err(BookingError::InvalidRoom(
                "maximum occupancy must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn amenity_list(&self) -> Vec<String> {
        self.amenities
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Half-open stay `[check_in, check_out)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StayDates {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayDates {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, BookingError> {
        if check_out <= check_in {
            return Err(BookingError::InvalidDateRange {
                check_in,
                check_out,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn nights(&self) -> u32 {
        let days = (self.check_out - self.check_in).num_days();
        u32::try_from(days.max(0)).unwrap_or(u32::MAX)
    }

    /// Every night of the stay; the check-out date is excluded.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let check_out = self.check_out;
        self.check_in
            .iter_days()
            .take_while(move |date| *date < check_out)
    }

    pub fn last_night(&self) -> NaiveDate {
        self.check_out
            .checked_sub_days(Days::new(1))
            .unwrap_or(self.check_in)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSelection {
    #[serde(rename = "type")]
    pub room_type: String,
    pub quantity: u32,
}

impl RoomSelection {
    pub fn new(room_type: impl Into<String>, quantity: u32) -> Self {
        Self {
            room_type: room_type.into(),
            quantity,
        }
    }
}

/// Validated booking request handed to the availability and pricing calculators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub stay: StayDates,
    pub rooms: Vec<RoomSelection>,
    pub adults: u32,
    pub children: u32,
}

impl BookingRequest {
    pub fn guests(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }

    pub fn merged_rooms(&self) -> Vec<RoomSelection> {
        merge_selections(&self.rooms)
    }
}

/// Requested quantity per room type, duplicates summed and zero quantities
/// dropped. First-seen order is kept.
pub fn merge_selections(selections: &[RoomSelection]) -> Vec<RoomSelection> {
    let mut merged: Vec<RoomSelection> = Vec::with_capacity(selections.len());
    for selection in selections.iter().filter(|s| s.quantity > 0) {
        match merged
            .iter_mut()
            .find(|m| m.room_type == selection.room_type)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(selection.quantity)
            }
            None => merged.push(selection.clone()),
        }
    }
    merged
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl GuestInfo {
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() {
            return Err(BookingError::MissingGuestDetails);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Reserved,
    Confirmed,
    Rejected,
}

impl BookingStatus {
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Reserved, BookingStatus::Confirmed)
                | (BookingStatus::Reserved, BookingStatus::Rejected)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BookingStatus::Reserved => "reserved",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub user: GuestInfo,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub rooms: Vec<PriceLine>,
    pub number_of_nights: u32,
    pub number_of_adults: u32,
    pub number_of_children: u32,
    pub total_price: u64,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn stay(&self) -> StayDates {
        StayDates {
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }

    pub fn selections(&self) -> Vec<RoomSelection> {
        self.rooms
            .iter()
            .map(|line| RoomSelection::new(line.room_type.clone(), line.quantity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn deluxe_form() -> NewRoomType {
        NewRoomType {
            room_type: "Deluxe".to_string(),
            is_ac: true,
            price: 2000,
            total_rooms: 3,
            description: "Corner room".to_string(),
            amenities: "wifi, tv,, minibar ".to_string(),
            max_occupancy: 2,
        }
    }

    #[test_case("Deluxe", true, "deluxe-ac")]
    #[test_case("Deluxe", false, "deluxe-non-ac")]
    #[test_case("  Family Suite ", true, "family-suite-ac")]
    #[test_case("King / Twin", false, "king-twin-non-ac")]
    fn test_room_type_id(label: &str, is_ac: bool, expected: &str) {
        assert_eq!(room_type_id(label, is_ac), expected);
    }

    #[test]
    fn test_stay_nights_exclude_checkout() {
        let stay = StayDates::new(date(2024, 5, 1), date(2024, 5, 3)).unwrap();
        assert_eq!(stay.nights(), 2);
        assert_eq!(
            stay.dates().collect::<Vec<_>>(),
            vec![date(2024, 5, 1), date(2024, 5, 2)]
        );
        assert_eq!(stay.last_night(), date(2024, 5, 2));
    }

    #[test]
    fn test_stay_across_month_boundary() {
        let stay = StayDates::new(date(2024, 2, 28), date(2024, 3, 2)).unwrap();
        assert_eq!(stay.nights(), 3);
    }

    #[test_case(date(2024, 5, 3), date(2024, 5, 3) ; "same day")]
    #[test_case(date(2024, 5, 3), date(2024, 5, 1) ; "reversed")]
    fn test_stay_rejects_empty_range(check_in: NaiveDate, check_out: NaiveDate) {
        assert_eq!(
            StayDates::new(check_in, check_out),
            Err(BookingError::InvalidDateRange {
                check_in,
                check_out
            })
        );
    }

    #[test]
    fn test_room_type_from_form_seeds_availability() {
        let room = RoomType::from_new(&deluxe_form(), date(2024, 5, 1), 3).unwrap();

        assert_eq!(room.id, "deluxe-ac");
        assert_eq!(room.amenities, vec!["wifi", "tv", "minibar"]);
        assert_eq!(room.availability.len(), 3);
        assert_eq!(room.remaining_on(date(2024, 5, 3)), 3);
        assert_eq!(room.remaining_on(date(2024, 5, 4)), 0);
    }

    #[test]
    fn test_min_remaining_outside_stored_nights() {
        let mut room = RoomType::from_new(&deluxe_form(), date(2024, 5, 1), 3).unwrap();
        *room.remaining_mut(date(2024, 5, 2)).unwrap() = 1;

        let inside = StayDates::new(date(2024, 5, 1), date(2024, 5, 4)).unwrap();
        assert_eq!(room.min_remaining(&inside), 1);

        let past_end = StayDates::new(date(2024, 5, 3), date(2024, 5, 5)).unwrap();
        assert_eq!(room.min_remaining(&past_end), 0);

        let whole_calendar = StayDates::new(date(1, 1, 1), date(9999, 12, 31)).unwrap();
        assert_eq!(room.min_remaining(&whole_calendar), 0);
    }

    #[test]
    fn test_room_form_validation() {
        let mut form = deluxe_form();
        form.total_rooms = 0;
        assert!(matches!(
            RoomType::from_new(&form, date(2024, 5, 1), 3),
            Err(BookingError::InvalidRoom(_))
        ));

        let mut form = deluxe_form();
        form.room_type = "   ".to_string();
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_merged_rooms_sums_duplicates() {
        let request = BookingRequest {
            stay: StayDates::new(date(2024, 5, 1), date(2024, 5, 2)).unwrap(),
            rooms: vec![
                RoomSelection::new("deluxe-ac", 1),
                RoomSelection::new("standard-non-ac", 0),
                RoomSelection::new("deluxe-ac", 2),
            ],
            adults: 2,
            children: 0,
        };

        assert_eq!(
            request.merged_rooms(),
            vec![RoomSelection::new("deluxe-ac", 3)]
        );
    }

    #[test]
    fn test_status_transitions() {
        assert!(BookingStatus::Reserved.can_transition_to(BookingStatus::Confirmed));
        assert!(BookingStatus::Reserved.can_transition_to(BookingStatus::Rejected));
        assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Rejected));
        assert!(!BookingStatus::Rejected.can_transition_to(BookingStatus::Confirmed));
    }

    #[test]
    fn test_room_type_wire_names() {
        let room = RoomType::from_new(&deluxe_form(), date(2024, 5, 1), 1).unwrap();
        let json = serde_json::to_value(&room).unwrap();

        assert_eq!(json["type"], "Deluxe");
        assert_eq!(json["isAC"], true);
        assert_eq!(json["maxOccupancy"], 2);
        assert_eq!(json["availability"][0]["availableRooms"], 3);
        assert_eq!(json["availability"][0]["date"], "2024-05-01");
    }
}
