//! Records the matching engine reads and the projections it scores.
//!
//! Rides, chairs, chair models and locations are owned by other parts of the
//! application; the engine only reads them inside a pass and writes a ride's
//! `chair_id`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::spatial::Coordinate;

macro_rules! text_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

text_id!(
    /// Identifier of a ride request.
    RideId
);
text_id!(
    /// Identifier of a chair.
    ChairId
);
text_id!(ChairLocationId);

/// A transportation request. `chair_id` is `None` until a pass assigns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ride {
    pub id: RideId,
    pub pickup: Coordinate,
    pub destination: Coordinate,
    pub created_at: DateTime<Utc>,
    pub chair_id: Option<ChairId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chair {
    pub id: ChairId,
    pub is_active: bool,
    /// Model name; the model decides the chair's speed.
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChairModel {
    pub name: String,
    pub speed: i32,
}

/// One row of the append-only location log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChairLocation {
    pub id: ChairLocationId,
    pub chair_id: ChairId,
    pub coordinate: Coordinate,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle markers a ride moves through once a chair is bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Matching,
    Enroute,
    Pickup,
    Carrying,
    Arrived,
    Completed,
}

impl RideStatus {
    pub const ALL: [RideStatus; 6] = [
        RideStatus::Matching,
        RideStatus::Enroute,
        RideStatus::Pickup,
        RideStatus::Carrying,
        RideStatus::Arrived,
        RideStatus::Completed,
    ];
}

/// A status marker for a ride. Only markers already delivered to the chair
/// (`chair_sent_at` set) count toward completing the ride.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideStatusEvent {
    pub ride_id: RideId,
    pub status: RideStatus,
    pub chair_sent_at: Option<DateTime<Utc>>,
}

/// How far a ride bound to a chair has progressed, as seen inside one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RideProgress {
    pub ride_id: RideId,
    pub chair_id: ChairId,
    pub delivered_events: u32,
}

/// Pending ride as the scorer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RideCandidate {
    pub id: RideId,
    pub pickup: Coordinate,
    pub destination: Coordinate,
    pub created_at: DateTime<Utc>,
}

impl From<&Ride> for RideCandidate {
    fn from(ride: &Ride) -> Self {
        Self {
            id: ride.id.clone(),
            pickup: ride.pickup,
            destination: ride.destination,
            created_at: ride.created_at,
        }
    }
}

/// Active chair with its latest known location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChairCandidate {
    pub id: ChairId,
    pub location: Coordinate,
    /// Grid units per time unit, from the chair's model.
    pub speed: i32,
}

/// A ride→chair decision produced during one pass. Never persisted as such.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pairing {
    pub ride_id: RideId,
    pub chair_id: ChairId,
    /// Grid distance recorded by the producing strategy: destination→chair for
    /// `flow`, pickup→chair for `nearest` and both greedy variants.
    pub cost: i64,
}
