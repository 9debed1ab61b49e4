use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Sequential entity identifier, starting at 1 per entity kind.
pub type Id = u64;

/// Wall-clock interval `[start, end)` within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    /// `None` unless `start < end`. Reservation validation builds every
    /// stored slot through here.
    pub fn try_new(start: NaiveTime, end: NaiveTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Unchecked constructor for already validated times, such as fixtures.
    /// Replayed slots are trusted because they were validated when logged.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        debug_assert!(start < end, "Slot start must be before end");
        Self { start, end }
    }

    /// `start <= t < end`. Used for "available from" probes.
    pub fn contains_from(&self, t: NaiveTime) -> bool {
        self.start <= t && t < self.end
    }

    /// `start < t <= end`. Used for "available until" probes.
    pub fn contains_until(&self, t: NaiveTime) -> bool {
        self.start < t && t <= self.end
    }

    /// True if the window `[start, end]` lies clear of this slot: it begins
    /// and ends strictly after it, or begins and ends strictly before it.
    ///
    /// Only the two starts and the two ends are compared, never a start
    /// against an end. A window that nests inside this slot, contains it or
    /// shares a boundary with it is not clear. A window that begins before
    /// and ends inside it (or begins inside and ends after) is.
    pub fn cleared_by(&self, start: NaiveTime, end: NaiveTime) -> bool {
        (start > self.start && end > self.end) || (start < self.start && end < self.end)
    }

    /// Reservation conflict rule: `self` is the candidate, `existing` a slot
    /// already booked on the same room and date.
    pub fn conflicts_with(&self, existing: &Slot) -> bool {
        !existing.cleared_by(self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campus {
    pub id: Id,
    pub name: String,
    pub address: String,
    pub parking_spaces: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: Id,
    pub campus_id: Id,
    pub number: String,
    /// Free-form type label ("lecture", "lab", ...).
    pub kind: String,
    /// Seating capacity.
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
}

/// A user's booking for one date. Rooms are linked separately, see
/// `Event::RoomAttached`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Id,
    pub user_id: Id,
    pub date: NaiveDate,
    pub slot: Slot,
    pub comment: Option<String>,
    pub people_count: Option<u32>,
}

// ── Creation inputs ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCampus {
    pub name: String,
    pub address: String,
    pub parking_spaces: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub number: String,
    pub kind: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
}

/// Unvalidated reservation request. Every field may be missing; see
/// `engine::validate_reservation` for the checks and their order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationDraft {
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub comment: Option<String>,
    pub people_count: Option<u32>,
}

/// WAL record format, one variant per store mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    CampusCreated(Campus),
    /// Cascades to the campus's rooms and their reservation links.
    CampusDeleted {
        id: Id,
    },
    RoomCreated(Room),
    UserCreated(User),
    /// Cascades to the user's reservations and their room links.
    UserDeleted {
        id: Id,
    },
    ReservationCreated(Reservation),
    RoomAttached {
        reservation_id: Id,
        room_id: Id,
    },
    /// Highest id issued so far per kind. Written at the head of a compacted
    /// log so ids of deleted entities are never handed out again.
    IdsIssued {
        campus: Id,
        room: Id,
        user: Id,
        reservation: Id,
    },
}
