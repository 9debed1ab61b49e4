use chrono::{NaiveDate, NaiveTime};

use crate::model::*;

/// Optional room-search filters. All present filters must pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomSearch {
    pub reservation_date: Option<NaiveDate>,
    pub available_from: Option<NaiveTime>,
    pub available_until: Option<NaiveTime>,
    pub min_seats: Option<u32>,
}

impl RoomSearch {
    /// No filter set: the caller should fall back to plain store paging.
    pub fn is_empty(&self) -> bool {
        self.reservation_date.is_none()
            && self.available_from.is_none()
            && self.available_until.is_none()
            && self.min_seats.is_none()
    }

    /// A booking counts for the instant filters when it falls on the
    /// searched date, or on any date if none was given.
    fn on_date(&self, booking: &Reservation) -> bool {
        self.reservation_date.is_none_or(|d| booking.date == d)
    }

    pub fn has_min_seats(&self, room: &Room) -> bool {
        self.min_seats.is_none_or(|min| room.capacity >= min)
    }

    /// No date-matched booking holds the `available_from` instant.
    pub fn free_from(&self, bookings: &[Reservation]) -> bool {
        let Some(from) = self.available_from else { return true };
        !bookings
            .iter()
            .any(|b| self.on_date(b) && b.slot.contains_from(from))
    }

    /// No date-matched booking holds the `available_until` instant.
    pub fn free_until(&self, bookings: &[Reservation]) -> bool {
        let Some(until) = self.available_until else { return true };
        !bookings
            .iter()
            .any(|b| self.on_date(b) && b.slot.contains_until(until))
    }

    /// With both bounds given, every booking on the searched date must be
    /// cleared by `[from, until]` under the reservation overlap rule. Without
    /// a searched date no booking is checked here.
    pub fn window_clear(&self, bookings: &[Reservation]) -> bool {
        let (Some(from), Some(until)) = (self.available_from, self.available_until) else {
            return true;
        };
        bookings.iter().all(|b| {
            self.reservation_date.is_none_or(|d| b.date != d) || b.slot.cleared_by(from, until)
        })
    }

    /// `bookings` are the reservations linked to `room`.
    pub fn admits(&self, room: &Room, bookings: &[Reservation]) -> bool {
        self.has_min_seats(room)
            && self.free_from(bookings)
            && self.free_until(bookings)
            && self.window_clear(bookings)
    }
}

/// Keep the rooms that pass every filter, preserving input order.
pub fn filter_rooms(search: &RoomSearch, rooms: Vec<(Room, Vec<Reservation>)>) -> Vec<Room> {
    rooms
        .into_iter()
        .filter(|(room, bookings)| search.admits(room, bookings))
        .map(|(room, _)| room)
        .collect()
}
