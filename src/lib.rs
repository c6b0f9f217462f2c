// Booking core for the hotel website: room inventory, availability, pricing and reservations

pub mod api;
pub mod availability;
pub mod booking;
pub mod config;
pub mod error;
pub mod inventory;
pub mod models;
pub mod pricing;

// Re-export key types for convenience
pub use api::{ApiError, HotelApi, HotelService};
pub use availability::check_availability;
pub use booking::{BookingService, BookingStatsReport};
pub use config::{load_room_forms, HotelConfig};
pub use error::{BookingError, ConfigError, ErrorKind};
pub use inventory::{InMemoryInventory, InventoryStore};
pub use models::{
    Booking, BookingRequest, BookingStatus, DailyAvailability, GuestInfo, NewRoomType,
    RoomSelection, RoomType, StayDates,
};
pub use pricing::{PriceLine, Quote};
