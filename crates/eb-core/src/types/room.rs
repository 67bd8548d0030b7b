//! Plain rooms and exam venues.
//!
//! A [`Venue`] is built from one or more [`Room`]s, but the two are stored
//! in separate registry tables. Code that needs "any room" goes through
//! [`RoomKind`](crate::RoomKind).

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RegistryError;
use crate::identity::{Describe, Entity, EntityKind};
use crate::registry::{Registry, Table};

/// A physical room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    id: String,
}

impl Room {
    /// Creates a room.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_owned(),
        }
    }

    /// Returns the room id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Room {
    const KIND: EntityKind = EntityKind::Room;

    fn identity(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), RegistryError> {
        validate_id(Self::KIND, &self.id)
    }

    fn table(registry: &Registry) -> &Table<Self> {
        &registry.rooms
    }

    fn table_mut(registry: &mut Registry) -> &mut Table<Self> {
        &mut registry.rooms
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl Describe for Room {
    fn full_detail(&self, _registry: &Registry) -> String {
        format!("{}\n", self.id)
    }
}

/// One or more rooms set up with a desk grid for exams.
///
/// Construction never fails. Inconsistent arguments are corrected and
/// logged instead:
///
/// - `room_count` is replaced by the number of rooms actually supplied
/// - a venue without rooms has no rows, columns or desks
/// - a grid of more than [`Venue::MAX_GRID_DESKS`] desks is reset to zero
/// - `total_desks` is capped at `rows * columns`
///
/// # Examples
///
/// ```
/// use eb_core::Venue;
///
/// let venue = Venue::new("W1+W2", 2, vec!["W1".into(), "W2".into()], 5, 6, 40, false);
/// assert_eq!(venue.desk_count(), 30);
/// assert!(venue.will_fit(30));
/// assert!(!venue.will_fit(31));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Venue {
    id: String,
    room_count: usize,
    rooms: Vec<String>,
    rows: usize,
    columns: usize,
    total_desks: usize,
    aara: bool,
}

impl Venue {
    /// The largest desk grid a venue may declare.
    pub const MAX_GRID_DESKS: usize = 10_000;

    /// Returns `rows * columns` if it is at most [`Venue::MAX_GRID_DESKS`].
    #[must_use]
    pub const fn grid_size(rows: usize, columns: usize) -> Option<usize> {
        match rows.checked_mul(columns) {
            Some(size) if size <= Self::MAX_GRID_DESKS => Some(size),
            _ => None,
        }
    }

    /// Creates a venue, correcting inconsistent counts.
    pub fn new(
        id: impl Into<String>,
        room_count: usize,
        rooms: Vec<String>,
        rows: usize,
        columns: usize,
        total_desks: usize,
        aara: bool,
    ) -> Self {
        let id = id.into().trim().to_owned();
        let mut venue = Self {
            room_count,
            rooms,
            rows,
            columns,
            total_desks,
            aara,
            id,
        };

        if venue.rooms.is_empty() {
            warn!(venue = %venue.id, "Venue has no rooms, resetting desk grid to zero");
            venue.rows = 0;
            venue.columns = 0;
            venue.total_desks = 0;
        }
        if venue.rooms.len() != venue.room_count {
            warn!(
                venue = %venue.id,
                declared = venue.room_count,
                actual = venue.rooms.len(),
                "Venue room count does not match its rooms, correcting"
            );
            venue.room_count = venue.rooms.len();
        }
        let capacity = Self::grid_size(venue.rows, venue.columns).unwrap_or_else(|| {
            warn!(
                venue = %venue.id,
                rows = venue.rows,
                columns = venue.columns,
                "Venue desk grid is too large, resetting to zero"
            );
            venue.rows = 0;
            venue.columns = 0;
            0
        });
        if venue.total_desks > capacity {
            warn!(
                venue = %venue.id,
                declared = venue.total_desks,
                capacity,
                "Venue declares more desks than its grid holds, clamping"
            );
            venue.total_desks = capacity;
        }
        venue
    }

    /// Returns the venue id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the number of rooms the venue spans.
    #[must_use]
    pub const fn room_count(&self) -> usize {
        self.room_count
    }

    /// Returns the ids of the rooms the venue spans.
    #[must_use]
    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    /// Returns the number of desk rows, counted front to back.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of desk columns, counted left to right.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Returns the number of usable desks.
    #[must_use]
    pub const fn desk_count(&self) -> usize {
        self.total_desks
    }

    /// Returns `true` if the venue is set up for AARA sessions.
    #[must_use]
    pub const fn is_aara(&self) -> bool {
        self.aara
    }

    /// Returns `true` if `students` fit at the venue's desks.
    pub fn will_fit(&self, students: usize) -> bool {
        if students > self.total_desks {
            warn!(
                venue = %self.id,
                desks = self.total_desks,
                students,
                "Students will not fit in this venue"
            );
            return false;
        }
        true
    }

    /// Returns `true` if the venue's AARA flag equals `aara`.
    pub fn check_venue_type(&self, aara: bool) -> bool {
        if self.aara != aara {
            if self.aara {
                warn!(venue = %self.id, "This is an AARA venue");
            } else {
                warn!(venue = %self.id, "This is not an AARA venue");
            }
            return false;
        }
        true
    }

    /// Returns the persisted metadata line, without a line terminator.
    #[must_use]
    pub fn metadata(&self) -> String {
        format!(
            "Room Count: {}, Rooms: {}, Rows: {}, Columns: {}, Desks: {}, AARA: {}",
            self.room_count,
            self.rooms.join(" "),
            self.rows,
            self.columns,
            self.total_desks,
            self.aara
        )
    }
}

impl Entity for Venue {
    const KIND: EntityKind = EntityKind::Venue;

    fn identity(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), RegistryError> {
        validate_id(Self::KIND, &self.id)
    }

    fn table(registry: &Registry) -> &Table<Self> {
        &registry.venues
    }

    fn table_mut(registry: &mut Registry) -> &mut Table<Self> {
        &mut registry.venues
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} desks)", self.id, self.total_desks)
    }
}

impl Describe for Venue {
    fn full_detail(&self, _registry: &Registry) -> String {
        format!("{self}\n{}\n", self.metadata())
    }
}

fn validate_id(kind: EntityKind, id: &str) -> Result<(), RegistryError> {
    if id.is_empty() || id.contains(char::is_whitespace) {
        return Err(RegistryError::invalid(
            kind,
            format!("id '{id}' must be a single non-empty word"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rooms(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|&id| id.to_owned()).collect()
    }

    #[test]
    fn test_venue_clamps_desk_count() {
        let venue = Venue::new("V1", 1, rooms(&["R1"]), 5, 6, 40, false);
        assert_eq!(venue.desk_count(), 30);
    }

    #[test]
    fn test_venue_keeps_smaller_desk_count() {
        let venue = Venue::new("V1", 1, rooms(&["R1"]), 5, 6, 28, false);
        assert_eq!(venue.desk_count(), 28);
    }

    #[test]
    fn test_venue_corrects_room_count() {
        let venue = Venue::new("V1+V2", 3, rooms(&["V1", "V2"]), 5, 6, 30, false);
        assert_eq!(venue.room_count(), 2);
    }

    #[test]
    fn test_venue_without_rooms_has_no_desks() {
        let venue = Venue::new("V0", 1, Vec::new(), 5, 6, 30, true);
        assert_eq!(venue.room_count(), 0);
        assert_eq!(venue.rows(), 0);
        assert_eq!(venue.columns(), 0);
        assert_eq!(venue.desk_count(), 0);
    }

    #[test]
    fn test_oversized_grid_is_reset() {
        let venue = Venue::new("V1", 1, rooms(&["R1"]), usize::MAX, 2, 30, false);
        assert_eq!(venue.rows(), 0);
        assert_eq!(venue.columns(), 0);
        assert_eq!(venue.desk_count(), 0);

        assert_eq!(Venue::grid_size(100, 100), Some(10_000));
        assert_eq!(Venue::grid_size(100_000, 100_000), None);
    }

    #[test]
    fn test_check_venue_type() {
        let venue = Venue::new("V1", 1, rooms(&["R1"]), 2, 2, 4, true);
        assert!(venue.check_venue_type(true));
        assert!(!venue.check_venue_type(false));
    }

    #[test]
    fn test_metadata_and_display() {
        let venue = Venue::new("S101+S102", 2, rooms(&["S101", "S102"]), 3, 5, 15, true);
        assert_eq!(venue.to_string(), "S101+S102 (15 desks)");
        assert_eq!(
            venue.metadata(),
            "Room Count: 2, Rooms: S101 S102, Rows: 3, Columns: 5, Desks: 15, AARA: true"
        );
    }

    #[test]
    fn test_room_id_with_space_rejected() {
        let mut registry = Registry::new();
        let err = registry.add(Room::new("Room 1")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidEntity { .. }));
    }
}
