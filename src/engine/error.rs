use chrono::{NaiveDate, NaiveTime};

use crate::model::Id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    MissingDate,
    MissingStartTime,
    MissingEndTime,
    /// Comment length in characters.
    CommentTooLong(usize),
    InvalidTimeRange {
        start: NaiveTime,
        end: NaiveTime,
    },
    PastDate(NaiveDate),
    ReservationNotFound {
        reservation_id: Id,
        user_id: Id,
    },
    RoomNotFound(Id),
    RoomAlreadyInReservation {
        room_id: Id,
        reservation_id: Id,
    },
    RoomAlreadyBooked {
        room_id: Id,
        /// The existing reservation the candidate collides with.
        conflicting: Id,
    },
    LimitExceeded(&'static str),
    WalError(String),
}

impl EngineError {
    /// Stable machine-readable label, used in API error bodies and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::MissingDate => "MISSING_DATE",
            EngineError::MissingStartTime => "MISSING_START_TIME",
            EngineError::MissingEndTime => "MISSING_END_TIME",
            EngineError::CommentTooLong(_) => "COMMENT_TOO_LONG",
            EngineError::InvalidTimeRange { .. } => "INVALID_TIME_RANGE",
            EngineError::PastDate(_) => "PAST_DATE",
            EngineError::ReservationNotFound { .. } => "RESERVATION_NOT_FOUND",
            EngineError::RoomNotFound(_) => "ROOM_NOT_FOUND",
            EngineError::RoomAlreadyInReservation { .. } => "ROOM_ALREADY_IN_RESERVATION",
            EngineError::RoomAlreadyBooked { .. } => "ROOM_ALREADY_BOOKED",
            EngineError::LimitExceeded(_) => "LIMIT_EXCEEDED",
            EngineError::WalError(_) => "WAL_ERROR",
        }
    }

    /// True for every error caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, EngineError::WalError(_))
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::MissingDate => write!(f, "reservation date is required"),
            EngineError::MissingStartTime => write!(f, "reservation start time is required"),
            EngineError::MissingEndTime => write!(f, "reservation end time is required"),
            EngineError::CommentTooLong(len) => write!(
                f,
                "comment is {len} characters, limit is {}",
                crate::limits::MAX_COMMENT_LEN
            ),
            EngineError::InvalidTimeRange { start, end } => {
                write!(f, "start time {start} must be before end time {end}")
            }
            EngineError::PastDate(date) => write!(f, "reservation date {date} is in the past"),
            EngineError::ReservationNotFound {
                reservation_id,
                user_id,
            } => write!(f, "reservation {reservation_id} not found for user {user_id}"),
            EngineError::RoomNotFound(id) => write!(f, "room {id} not found"),
            EngineError::RoomAlreadyInReservation {
                room_id,
                reservation_id,
            } => write!(f, "room {room_id} is already part of reservation {reservation_id}"),
            EngineError::RoomAlreadyBooked {
                room_id,
                conflicting,
            } => write!(
                f,
                "room {room_id} is already booked at this time by reservation {conflicting}"
            ),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
