use tokio::sync::oneshot;

use crate::model::*;

use super::conflict::{check_room_attachment, today, validate_reservation, validate_text};
use super::store::RoomGuards;
use super::{Engine, EngineError, WalCommand};

impl Engine {
    pub async fn create_campus(&self, new: NewCampus) -> Result<Campus, EngineError> {
        validate_text(&new.name)?;
        validate_text(&new.address)?;
        let _commit = self.commit_lock.read().await;
        let campus = Campus {
            id: self.next_campus_id(),
            name: new.name,
            address: new.address,
            parking_spaces: new.parking_spaces,
        };
        let event = Event::CampusCreated(campus.clone());
        self.persist_and_apply(&event, &mut RoomGuards::new()).await?;
        Ok(campus)
    }

    /// Delete a campus with its rooms. `Ok(false)` if it does not exist.
    pub async fn delete_campus(&self, id: Id) -> Result<bool, EngineError> {
        let _commit = self.commit_lock.write().await;
        if !self.store.contains_campus(id) {
            return Ok(false);
        }
        let event = Event::CampusDeleted { id };
        let mut guards = self.lock_rooms(self.store.rooms_touched(&event)).await;
        self.persist_and_apply(&event, &mut guards).await?;
        Ok(true)
    }

    /// Add a room to a campus. `Ok(None)` if the campus does not exist.
    pub async fn add_room(&self, campus_id: Id, new: NewRoom) -> Result<Option<Room>, EngineError> {
        validate_text(&new.number)?;
        validate_text(&new.kind)?;
        let _commit = self.commit_lock.read().await;
        if !self.store.contains_campus(campus_id) {
            return Ok(None);
        }
        let room = Room {
            id: self.next_room_id(),
            campus_id,
            number: new.number,
            kind: new.kind,
            capacity: new.capacity,
        };
        let event = Event::RoomCreated(room.clone());
        self.persist_and_apply(&event, &mut RoomGuards::new()).await?;
        Ok(Some(room))
    }

    pub async fn create_user(&self, new: NewUser) -> Result<User, EngineError> {
        validate_text(&new.full_name)?;
        validate_text(&new.email)?;
        let _commit = self.commit_lock.read().await;
        let user = User {
            id: self.next_user_id(),
            full_name: new.full_name,
            date_of_birth: new.date_of_birth,
            email: new.email,
        };
        let event = Event::UserCreated(user.clone());
        self.persist_and_apply(&event, &mut RoomGuards::new()).await?;
        Ok(user)
    }

    /// Delete a user with their reservations. `Ok(false)` if the user does
    /// not exist.
    pub async fn delete_user(&self, id: Id) -> Result<bool, EngineError> {
        let _commit = self.commit_lock.write().await;
        if !self.store.contains_user(id) {
            return Ok(false);
        }
        let event = Event::UserDeleted { id };
        let mut guards = self.lock_rooms(self.store.rooms_touched(&event)).await;
        self.persist_and_apply(&event, &mut guards).await?;
        Ok(true)
    }

    /// Validate a reservation request and store it without rooms.
    ///
    /// Field errors come first, so an invalid draft for a missing user is an
    /// error rather than `Ok(None)`.
    pub async fn add_reservation(
        &self,
        user_id: Id,
        draft: ReservationDraft,
    ) -> Result<Option<Reservation>, EngineError> {
        let (date, slot) = validate_reservation(&draft, today())?;
        let _commit = self.commit_lock.read().await;
        if !self.store.contains_user(user_id) {
            return Ok(None);
        }
        let reservation = Reservation {
            id: self.next_reservation_id(),
            user_id,
            date,
            slot,
            comment: draft.comment,
            people_count: draft.people_count,
        };
        let event = Event::ReservationCreated(reservation.clone());
        self.persist_and_apply(&event, &mut RoomGuards::new()).await?;
        Ok(Some(reservation))
    }

    fn reservation_for(&self, user_id: Id, reservation_id: Id) -> Result<Reservation, EngineError> {
        self.store
            .reservation_of_user(reservation_id, user_id)
            .ok_or(EngineError::ReservationNotFound { reservation_id, user_id })
    }

    /// Check whether `room_id` may be attached to the user's reservation.
    /// Read-only; nothing stops another request from taking the slot before
    /// a later `attach_room`. `reserve_room` does both under one lock.
    pub async fn validate_room_attachment(
        &self,
        user_id: Id,
        reservation_id: Id,
        room_id: Id,
    ) -> Result<(), EngineError> {
        let reservation = self.reservation_for(user_id, reservation_id)?;
        let shared = self.store.room(room_id).ok_or(EngineError::RoomNotFound(room_id))?;
        let state = shared.read().await;
        check_room_attachment(
            &reservation,
            &self.store.rooms_of_reservation(reservation_id),
            room_id,
            &self.store.reservations_by_ids(&state.reservations),
        )
    }

    /// Link a room to a reservation without checking for conflicts or
    /// duplicates. Callers run `validate_room_attachment` first.
    pub async fn attach_room(&self, user_id: Id, reservation_id: Id, room_id: Id) -> Result<(), EngineError> {
        let _commit = self.commit_lock.read().await;
        self.reservation_for(user_id, reservation_id)?;
        let shared = self.store.room(room_id).ok_or(EngineError::RoomNotFound(room_id))?;
        let mut guards = RoomGuards::new();
        guards.insert(room_id, shared.write_owned().await);
        let event = Event::RoomAttached { reservation_id, room_id };
        self.persist_and_apply(&event, &mut guards).await
    }

    /// Validate and attach under the room's write lock, so two requests for
    /// the same room and slot cannot both succeed.
    pub async fn reserve_room(&self, user_id: Id, reservation_id: Id, room_id: Id) -> Result<(), EngineError> {
        let _commit = self.commit_lock.read().await;
        let reservation = self.reservation_for(user_id, reservation_id)?;
        let shared = self.store.room(room_id).ok_or(EngineError::RoomNotFound(room_id))?;
        let guard = shared.write_owned().await;
        check_room_attachment(
            &reservation,
            &self.store.rooms_of_reservation(reservation_id),
            room_id,
            &self.store.reservations_by_ids(&guard.reservations),
        )?;
        let mut guards = RoomGuards::new();
        guards.insert(room_id, guard);
        let event = Event::RoomAttached { reservation_id, room_id };
        self.persist_and_apply(&event, &mut guards).await
    }

    /// Minimal event list that rebuilds the current store: the id counters,
    /// entities in id order, then each reservation's room links in attach
    /// order. Replay re-links rooms in reservation id order.
    async fn snapshot_events(&self) -> Vec<Event> {
        let mut events = vec![self.ids.issued()];
        for id in self.store.campus_ids() {
            if let Some(campus) = self.store.campus(id) {
                events.push(Event::CampusCreated(campus));
            }
            for room_id in self.store.rooms_of_campus(id) {
                if let Some(shared) = self.store.room(room_id) {
                    events.push(Event::RoomCreated(shared.read().await.room.clone()));
                }
            }
        }
        for id in self.store.user_ids() {
            if let Some(user) = self.store.user(id) {
                events.push(Event::UserCreated(user));
            }
        }
        let reservation_ids = self.store.reservation_ids();
        for id in &reservation_ids {
            if let Some(reservation) = self.store.reservation(*id) {
                events.push(Event::ReservationCreated(reservation));
            }
        }
        for reservation_id in reservation_ids {
            for room_id in self.store.rooms_of_reservation(reservation_id) {
                events.push(Event::RoomAttached { reservation_id, room_id });
            }
        }
        events
    }

    /// Rewrite the WAL as a snapshot of the current store. Blocks every
    /// commit until the new log is in place.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let _commit = self.commit_lock.write().await;
        let events = self.snapshot_events().await;
        self.wal_compact(events).await
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
