//! Integer grid geometry shared by the scorer and the store.

use serde::{Deserialize, Serialize};

/// A point on the integer lat/long grid chairs and rides report in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: i32,
    pub longitude: i32,
}

impl Coordinate {
    pub const fn new(latitude: i32, longitude: i32) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Manhattan distance `|Δlat| + |Δlong|`, widened so extreme grid values cannot overflow.
    pub fn manhattan_distance(&self, other: Coordinate) -> i64 {
        (i64::from(self.latitude) - i64::from(other.latitude)).abs()
            + (i64::from(self.longitude) - i64::from(other.longitude)).abs()
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((latitude, longitude): (i32, i32)) -> Self {
        Self::new(latitude, longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_is_symmetric() {
        let a = Coordinate::new(1, 1);
        let b = Coordinate::new(-3, 9);
        assert_eq!(a.manhattan_distance(b), 12);
        assert_eq!(b.manhattan_distance(a), 12);
        assert_eq!(a.manhattan_distance(a), 0);
    }

    #[test]
    fn manhattan_distance_does_not_overflow_at_grid_edges() {
        let a = Coordinate::new(i32::MIN, i32::MIN);
        let b = Coordinate::new(i32::MAX, i32::MAX);
        assert_eq!(a.manhattan_distance(b), 2 * (u32::MAX as i64));
    }
}
