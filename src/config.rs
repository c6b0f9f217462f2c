// Runtime configuration for the booking service and the HTTP server
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::NewRoomType;

#[derive(Debug, Clone)]
pub struct HotelConfig {
    pub bind_addr: SocketAddr,
    /// Nights of inventory seeded when a room type is added.
    pub inventory_horizon_days: u32,
    pub currency: String,
    /// JSON array of room forms loaded at startup.
    pub rooms_file: Option<PathBuf>,
}

impl Default for HotelConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            inventory_horizon_days: 365,
            currency: "INR".to_string(),
            rooms_file: None,
        }
    }
}

impl HotelConfig {
    /// Defaults overridden by `HOTEL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("HOTEL_BIND_ADDR") {
            config.bind_addr = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "HOTEL_BIND_ADDR",
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup("HOTEL_INVENTORY_DAYS") {
            config.inventory_horizon_days = match value.parse::<u32>() {
                Ok(days) if days > 0 => days,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "HOTEL_INVENTORY_DAYS",
                        value,
                    })
                }
            };
        }

        if let Some(value) = lookup("HOTEL_CURRENCY") {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "HOTEL_CURRENCY",
                    value,
                });
            }
            config.currency = value.trim().to_string();
        }

        config.rooms_file = lookup("HOTEL_ROOMS_FILE").map(PathBuf::from);

        Ok(config)
    }
}

/// Reads the startup room list: a JSON array of "add room" forms.
pub fn load_room_forms(path: &Path) -> Result<Vec<NewRoomType>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::RoomFile {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::RoomFileFormat {
        path: path.display().to_string(),
        source,
    })
}
