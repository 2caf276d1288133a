//! Room inventory

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CoreError, Money, RoomId};

/// Housekeeping/occupancy status of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Reserved,
    Occupied,
    Maintenance,
    Cleaning,
    Blocked,
}

impl RoomStatus {
    /// Returns the persisted representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Reserved => "reserved",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Maintenance => "maintenance",
            RoomStatus::Cleaning => "cleaning",
            RoomStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(RoomStatus::Available),
            "reserved" => Ok(RoomStatus::Reserved),
            "occupied" => Ok(RoomStatus::Occupied),
            "maintenance" => Ok(RoomStatus::Maintenance),
            "cleaning" => Ok(RoomStatus::Cleaning),
            "blocked" => Ok(RoomStatus::Blocked),
            other => Err(CoreError::validation(format!("unknown room status '{other}'"))),
        }
    }
}

/// A bookable room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// Door number, unique per property
    pub number: String,
    pub floor: i32,
    pub room_type: String,
    pub price_per_night: Money,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Creates an available room
    pub fn new(
        number: impl Into<String>,
        floor: i32,
        room_type: impl Into<String>,
        price_per_night: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RoomId::new_v7(),
            number: number.into(),
            floor,
            room_type: room_type.into(),
            price_per_night,
            status: RoomStatus::Available,
            created_at,
            updated_at: created_at,
        }
    }

    /// Sets the status (builder style)
    pub fn with_status(mut self, status: RoomStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_occupied(&self) -> bool {
        self.status == RoomStatus::Occupied
    }

    /// Marks the room occupied on guest arrival
    ///
    /// # Errors
    ///
    /// Rooms under maintenance or blocked cannot be occupied.
    pub fn occupy(&mut self, at: DateTime<Utc>) -> Result<(), CoreError> {
        match self.status {
            RoomStatus::Maintenance | RoomStatus::Blocked => Err(CoreError::invalid_state(format!(
                "room {} is {} and cannot be occupied",
                self.number, self.status
            ))),
            _ => {
                self.status = RoomStatus::Occupied;
                self.updated_at = at;
                Ok(())
            }
        }
    }

    /// Sends the room to housekeeping after departure
    pub fn mark_for_cleaning(&mut self, at: DateTime<Utc>) {
        self.status = RoomStatus::Cleaning;
        self.updated_at = at;
    }

    /// Returns a reserved room to the available pool
    ///
    /// Returns true if the status changed. Rooms in any other status are left
    /// alone so that a cancellation never frees an occupied room.
    pub fn release(&mut self, at: DateTime<Utc>) -> bool {
        if self.status != RoomStatus::Reserved {
            return false;
        }
        self.status = RoomStatus::Available;
        self.updated_at = at;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn room(status: RoomStatus) -> Room {
        Room::new("204", 2, "deluxe", Money::new(dec!(45000), Currency::NGN), Utc::now())
            .with_status(status)
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            RoomStatus::Available,
            RoomStatus::Reserved,
            RoomStatus::Occupied,
            RoomStatus::Maintenance,
            RoomStatus::Cleaning,
            RoomStatus::Blocked,
        ] {
            assert_eq!(status.as_str().parse::<RoomStatus>().unwrap(), status);
        }
        assert!("flooded".parse::<RoomStatus>().is_err());
    }

    #[test]
    fn test_occupy_from_reserved() {
        let mut r = room(RoomStatus::Reserved);
        r.occupy(Utc::now()).unwrap();
        assert!(r.is_occupied());
    }

    #[test]
    fn test_cannot_occupy_maintenance_room() {
        let mut r = room(RoomStatus::Maintenance);
        assert!(matches!(
            r.occupy(Utc::now()),
            Err(CoreError::InvalidStateTransition(_))
        ));
        assert_eq!(r.status, RoomStatus::Maintenance);
    }

    #[test]
    fn test_release_only_affects_reserved_rooms() {
        let mut reserved = room(RoomStatus::Reserved);
        assert!(reserved.release(Utc::now()));
        assert_eq!(reserved.status, RoomStatus::Available);

        let mut occupied = room(RoomStatus::Occupied);
        assert!(!occupied.release(Utc::now()));
        assert_eq!(occupied.status, RoomStatus::Occupied);
    }
}
