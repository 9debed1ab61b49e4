use chrono::NaiveDate;

use crate::limits::*;
use crate::model::*;

use super::EngineError;

/// Local calendar date, the reference for past-date checks.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn validate_text(value: &str) -> Result<(), EngineError> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(EngineError::LimitExceeded("text field too long"));
    }
    Ok(())
}

/// Check a reservation request field by field and return its date and slot.
///
/// Order: date present, start present, end present, comment length, start
/// before end, date not before `today`. The first failure wins.
pub fn validate_reservation(
    draft: &ReservationDraft,
    today: NaiveDate,
) -> Result<(NaiveDate, Slot), EngineError> {
    let date = draft.date.ok_or(EngineError::MissingDate)?;
    let start = draft.start_time.ok_or(EngineError::MissingStartTime)?;
    let end = draft.end_time.ok_or(EngineError::MissingEndTime)?;
    if let Some(comment) = &draft.comment {
        let len = comment.chars().count();
        if len > MAX_COMMENT_LEN {
            return Err(EngineError::CommentTooLong(len));
        }
    }
    let slot = Slot::try_new(start, end).ok_or(EngineError::InvalidTimeRange { start, end })?;
    if date < today {
        return Err(EngineError::PastDate(date));
    }
    Ok((date, slot))
}

/// Decide whether `room_id` may join `reservation`.
///
/// `attached` is the reservation's current room list, `booked` the
/// reservations already linked to the room.
pub fn check_room_attachment(
    reservation: &Reservation,
    attached: &[Id],
    room_id: Id,
    booked: &[Reservation],
) -> Result<(), EngineError> {
    if attached.contains(&room_id) {
        return Err(EngineError::RoomAlreadyInReservation {
            room_id,
            reservation_id: reservation.id,
        });
    }
    let clash = booked
        .iter()
        .filter(|existing| existing.date == reservation.date)
        .find(|existing| reservation.slot.conflicts_with(&existing.slot));
    if let Some(existing) = clash {
        return Err(EngineError::RoomAlreadyBooked {
            room_id,
            conflicting: existing.id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 3, day).unwrap()
    }

    fn draft(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> ReservationDraft {
        ReservationDraft {
            date: Some(date),
            start_time: Some(start),
            end_time: Some(end),
            comment: None,
            people_count: Some(4),
        }
    }

    fn reservation(id: Id, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Reservation {
        Reservation {
            id,
            user_id: 1,
            date,
            slot: Slot::new(start, end),
            comment: None,
            people_count: None,
        }
    }

    // ── validate_reservation ─────────────────────────────

    #[test]
    fn valid_draft_passes() {
        let (date, slot) = validate_reservation(&draft(d(2), t(9, 0), t(10, 0)), d(1)).unwrap();
        assert_eq!(date, d(2));
        assert_eq!(slot, Slot::new(t(9, 0), t(10, 0)));
    }

    #[test]
    fn today_is_not_past() {
        assert!(validate_reservation(&draft(d(1), t(9, 0), t(10, 0)), d(1)).is_ok());
    }

    #[test]
    fn missing_fields_reported_in_order() {
        let empty = ReservationDraft::default();
        assert_eq!(validate_reservation(&empty, d(1)), Err(EngineError::MissingDate));

        let no_start = ReservationDraft { start_time: None, ..draft(d(2), t(9, 0), t(10, 0)) };
        assert_eq!(validate_reservation(&no_start, d(1)), Err(EngineError::MissingStartTime));

        let no_end = ReservationDraft { end_time: None, ..draft(d(2), t(9, 0), t(10, 0)) };
        assert_eq!(validate_reservation(&no_end, d(1)), Err(EngineError::MissingEndTime));
    }

    #[test]
    fn comment_limit_is_inclusive() {
        let mut ok = draft(d(2), t(9, 0), t(10, 0));
        ok.comment = Some("x".repeat(MAX_COMMENT_LEN));
        assert!(validate_reservation(&ok, d(1)).is_ok());

        let mut long = ok.clone();
        long.comment = Some("x".repeat(MAX_COMMENT_LEN + 1));
        assert_eq!(
            validate_reservation(&long, d(1)),
            Err(EngineError::CommentTooLong(MAX_COMMENT_LEN + 1))
        );
    }

    #[test]
    fn comment_counts_characters_not_bytes() {
        let mut multibyte = draft(d(2), t(9, 0), t(10, 0));
        multibyte.comment = Some("ж".repeat(MAX_COMMENT_LEN));
        assert!(validate_reservation(&multibyte, d(1)).is_ok());
    }

    #[test]
    fn start_must_precede_end() {
        let equal = draft(d(2), t(10, 0), t(10, 0));
        assert!(matches!(
            validate_reservation(&equal, d(1)),
            Err(EngineError::InvalidTimeRange { .. })
        ));
        let reversed = draft(d(2), t(11, 0), t(10, 0));
        assert!(matches!(
            validate_reservation(&reversed, d(1)),
            Err(EngineError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn past_date_rejected() {
        assert_eq!(
            validate_reservation(&draft(d(1), t(9, 0), t(10, 0)), d(2)),
            Err(EngineError::PastDate(d(1)))
        );
    }

    #[test]
    fn comment_checked_before_time_range_and_date() {
        let mut bad = draft(d(1), t(11, 0), t(10, 0));
        bad.comment = Some("x".repeat(MAX_COMMENT_LEN + 5));
        assert!(matches!(
            validate_reservation(&bad, d(5)),
            Err(EngineError::CommentTooLong(_))
        ));
    }

    #[test]
    fn time_range_checked_before_date() {
        let bad = draft(d(1), t(11, 0), t(10, 0));
        assert!(matches!(
            validate_reservation(&bad, d(5)),
            Err(EngineError::InvalidTimeRange { .. })
        ));
    }

    // ── check_room_attachment ───────────────────────────

    #[test]
    fn free_room_attaches() {
        let res = reservation(1, d(2), t(10, 0), t(11, 0));
        let booked = vec![reservation(2, d(2), t(13, 0), t(14, 0))];
        assert!(check_room_attachment(&res, &[], 9, &booked).is_ok());
    }

    #[test]
    fn room_already_listed() {
        let res = reservation(1, d(2), t(10, 0), t(11, 0));
        assert_eq!(
            check_room_attachment(&res, &[4, 9], 9, &[]),
            Err(EngineError::RoomAlreadyInReservation { room_id: 9, reservation_id: 1 })
        );
    }

    #[test]
    fn identical_slot_is_booked() {
        let res = reservation(1, d(2), t(10, 0), t(11, 0));
        let booked = vec![reservation(2, d(2), t(10, 0), t(11, 0))];
        assert_eq!(
            check_room_attachment(&res, &[], 9, &booked),
            Err(EngineError::RoomAlreadyBooked { room_id: 9, conflicting: 2 })
        );
    }

    #[test]
    fn adjacent_slot_passes() {
        let res = reservation(1, d(2), t(11, 0), t(12, 0));
        let booked = vec![reservation(2, d(2), t(10, 0), t(11, 0))];
        assert!(check_room_attachment(&res, &[], 9, &booked).is_ok());
    }

    #[test]
    fn other_dates_ignored() {
        let res = reservation(1, d(2), t(10, 0), t(11, 0));
        let booked = vec![reservation(2, d(3), t(10, 0), t(11, 0))];
        assert!(check_room_attachment(&res, &[], 9, &booked).is_ok());
    }

    #[test]
    fn reports_first_conflict() {
        let res = reservation(1, d(2), t(10, 0), t(12, 0));
        let booked = vec![
            reservation(2, d(2), t(8, 0), t(9, 0)),
            reservation(3, d(2), t(10, 30), t(11, 0)),
            reservation(4, d(2), t(10, 0), t(12, 0)),
        ];
        assert_eq!(
            check_room_attachment(&res, &[], 9, &booked),
            Err(EngineError::RoomAlreadyBooked { room_id: 9, conflicting: 3 })
        );
    }

    #[test]
    fn membership_checked_before_overlap() {
        let res = reservation(1, d(2), t(10, 0), t(11, 0));
        let booked = vec![reservation(2, d(2), t(10, 0), t(11, 0))];
        assert!(matches!(
            check_room_attachment(&res, &[9], 9, &booked),
            Err(EngineError::RoomAlreadyInReservation { .. })
        ));
    }
}
