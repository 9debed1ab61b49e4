//! Request and response bodies for the REST API.
//!
//! Create requests deserialize every field as optional so that all missing
//! fields can be reported together; `validate` turns them into engine inputs.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::engine::RoomSearch;
use crate::limits::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::model::*;
use crate::page::PageRequest;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// =============================================================================
// Query parameters
// =============================================================================

/// `page` and `count` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub count: Option<usize>,
}

impl PageQuery {
    pub fn request(&self) -> Result<PageRequest, String> {
        let size = self.count.unwrap_or(DEFAULT_PAGE_SIZE);
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(format!("count must be between 1 and {MAX_PAGE_SIZE}"));
        }
        Ok(PageRequest::new(self.page.unwrap_or(DEFAULT_PAGE), size))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampusListQuery {
    pub page: Option<usize>,
    pub count: Option<usize>,
    /// Exact campus name; switches the endpoint to a single lookup.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListQuery {
    pub page: Option<usize>,
    pub count: Option<usize>,
    pub reservation_date: Option<NaiveDate>,
    pub available_from: Option<NaiveTime>,
    pub available_until: Option<NaiveTime>,
    pub min_number_of_seats: Option<u32>,
}

impl RoomListQuery {
    pub fn paging(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            count: self.count,
        }
    }

    pub fn search(&self) -> RoomSearch {
        RoomSearch {
            reservation_date: self.reservation_date,
            available_from: self.available_from,
            available_until: self.available_until,
            min_seats: self.min_number_of_seats,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub page: Option<usize>,
    pub count: Option<usize>,
    /// Substring of the user's full name.
    pub name_matches: Option<String>,
}

// =============================================================================
// Campuses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CampusDto {
    pub id: Id,
    pub name: String,
    pub address: String,
    pub parking_spaces: u32,
}

impl From<Campus> for CampusDto {
    fn from(c: Campus) -> Self {
        Self {
            id: c.id,
            name: c.name,
            address: c.address,
            parking_spaces: c.parking_spaces,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampusRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub parking_spaces: Option<u32>,
}

/// A present, non-blank string, or the error message.
fn required_text(value: Option<String>, message: &str, errors: &mut Vec<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            errors.push(message.to_string());
            String::new()
        }
    }
}

fn required<T: Default>(value: Option<T>, message: &str, errors: &mut Vec<String>) -> T {
    value.unwrap_or_else(|| {
        errors.push(message.to_string());
        T::default()
    })
}

fn finish<T>(value: T, errors: Vec<String>) -> Result<T, Vec<String>> {
    if errors.is_empty() { Ok(value) } else { Err(errors) }
}

impl CampusRequest {
    pub fn validate(self) -> Result<NewCampus, Vec<String>> {
        let mut errors = Vec::new();
        let campus = NewCampus {
            name: required_text(self.name, "Campus name is required", &mut errors),
            address: required_text(self.address, "Campus address is required", &mut errors),
            parking_spaces: required(self.parking_spaces, "Campus parkingSpaces is required", &mut errors),
        };
        finish(campus, errors)
    }
}

// =============================================================================
// Rooms
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomDto {
    pub id: Id,
    pub number: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub capacity: u32,
}

impl From<Room> for RoomDto {
    fn from(r: Room) -> Self {
        Self {
            id: r.id,
            number: r.number,
            kind: r.kind,
            capacity: r.capacity,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomRequest {
    pub number: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub capacity: Option<u32>,
}

impl RoomRequest {
    pub fn validate(self) -> Result<NewRoom, Vec<String>> {
        let mut errors = Vec::new();
        let room = NewRoom {
            number: required_text(self.number, "Room number is required", &mut errors),
            kind: required_text(self.kind, "Room type is required", &mut errors),
            capacity: required(self.capacity, "Room capacity is required", &mut errors),
        };
        finish(room, errors)
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Id,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            full_name: u.full_name,
            date_of_birth: u.date_of_birth,
            email: u.email,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
}

impl UserRequest {
    pub fn validate(self) -> Result<NewUser, Vec<String>> {
        let mut errors = Vec::new();
        let full_name = required_text(self.full_name, "User fullName is required", &mut errors);
        let date_of_birth = match self.date_of_birth {
            Some(d) => d,
            None => {
                errors.push("User dateOfBirth is required".to_string());
                NaiveDate::MIN
            }
        };
        let email = required_text(self.email, "User email is required", &mut errors);
        finish(NewUser { full_name, date_of_birth, email }, errors)
    }
}

// =============================================================================
// Reservations
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDto {
    pub id: Id,
    pub date_of_reserv: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub comment: Option<String>,
    pub people_count: Option<u32>,
    /// Attached rooms in attach order.
    pub room_ids: Vec<Id>,
}

impl ReservationDto {
    pub fn new(r: Reservation, room_ids: Vec<Id>) -> Self {
        Self {
            id: r.id,
            date_of_reserv: r.date,
            start_time: r.slot.start,
            end_time: r.slot.end,
            comment: r.comment,
            people_count: r.people_count,
            room_ids,
        }
    }
}

/// Reservation body. Only `peopleCount` is checked here; date and time
/// checks run afterwards in the engine, in their fixed order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub date_of_reserv: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub comment: Option<String>,
    pub people_count: Option<u32>,
}

impl ReservationRequest {
    pub fn validate(self) -> Result<ReservationDraft, Vec<String>> {
        let mut errors = Vec::new();
        if self.people_count.is_none() {
            errors.push("Reservation peopleCount is required".to_string());
        }
        finish(self.into(), errors)
    }
}

impl From<ReservationRequest> for ReservationDraft {
    fn from(r: ReservationRequest) -> Self {
        Self {
            date: r.date_of_reserv,
            start_time: r.start_time,
            end_time: r.end_time,
            comment: r.comment,
            people_count: r.people_count,
        }
    }
}
