use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::model::*;

/// A room plus the reservations linked to it, guarded as one unit so a
/// conflict check and the link it approves happen under the same lock.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub room: Room,
    /// Linked reservation ids in link order, no duplicates.
    pub reservations: Vec<Id>,
}

impl RoomState {
    pub fn new(room: Room) -> Self {
        Self {
            room,
            reservations: Vec::new(),
        }
    }

    pub fn link(&mut self, reservation_id: Id) {
        if !self.reservations.contains(&reservation_id) {
            self.reservations.push(reservation_id);
        }
    }

    pub fn unlink(&mut self, reservation_id: Id) {
        self.reservations.retain(|r| *r != reservation_id);
    }
}

pub type SharedRoomState = Arc<RwLock<RoomState>>;

/// Write guards for the rooms an event touches, keyed by room id.
pub type RoomGuards = HashMap<Id, OwnedRwLockWriteGuard<RoomState>>;

/// Entities by id plus the association indexes between them.
///
/// Campus → rooms, user → reservations and reservation → rooms live in
/// separate index maps; room → reservations lives in `RoomState`.
pub struct Store {
    campuses: DashMap<Id, Campus>,
    rooms: DashMap<Id, SharedRoomState>,
    users: DashMap<Id, User>,
    reservations: DashMap<Id, Reservation>,
    campus_rooms: DashMap<Id, Vec<Id>>,
    user_reservations: DashMap<Id, Vec<Id>>,
    reservation_rooms: DashMap<Id, Vec<Id>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Ids of a map in ascending order, which is creation order.
fn sorted_ids<V>(map: &DashMap<Id, V>) -> Vec<Id> {
    let mut ids: Vec<Id> = map.iter().map(|e| *e.key()).collect();
    ids.sort_unstable();
    ids
}

impl Store {
    pub fn new() -> Self {
        Self {
            campuses: DashMap::new(),
            rooms: DashMap::new(),
            users: DashMap::new(),
            reservations: DashMap::new(),
            campus_rooms: DashMap::new(),
            user_reservations: DashMap::new(),
            reservation_rooms: DashMap::new(),
        }
    }

    // ── Campuses ─────────────────────────────────────────────

    pub fn campus(&self, id: Id) -> Option<Campus> {
        self.campuses.get(&id).map(|e| e.value().clone())
    }

    pub fn contains_campus(&self, id: Id) -> bool {
        self.campuses.contains_key(&id)
    }

    pub fn campus_ids(&self) -> Vec<Id> {
        sorted_ids(&self.campuses)
    }

    pub fn campus_count(&self) -> usize {
        self.campuses.len()
    }

    // ── Rooms ────────────────────────────────────────────────

    pub fn room(&self, id: Id) -> Option<SharedRoomState> {
        self.rooms.get(&id).map(|e| e.value().clone())
    }

    /// Rooms of a campus in the order they were added.
    pub fn rooms_of_campus(&self, campus_id: Id) -> Vec<Id> {
        self.campus_rooms
            .get(&campus_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    // ── Users ────────────────────────────────────────────────

    pub fn user(&self, id: Id) -> Option<User> {
        self.users.get(&id).map(|e| e.value().clone())
    }

    pub fn contains_user(&self, id: Id) -> bool {
        self.users.contains_key(&id)
    }

    pub fn user_ids(&self) -> Vec<Id> {
        sorted_ids(&self.users)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    // ── Reservations ─────────────────────────────────────────

    pub fn reservation(&self, id: Id) -> Option<Reservation> {
        self.reservations.get(&id).map(|e| e.value().clone())
    }

    /// Look up a reservation only if it belongs to `user_id`.
    pub fn reservation_of_user(&self, id: Id, user_id: Id) -> Option<Reservation> {
        self.reservation(id).filter(|r| r.user_id == user_id)
    }

    /// Resolve ids to reservations, skipping any that no longer exist.
    pub fn reservations_by_ids(&self, ids: &[Id]) -> Vec<Reservation> {
        ids.iter().filter_map(|id| self.reservation(*id)).collect()
    }

    pub fn reservations_of_user(&self, user_id: Id) -> Vec<Id> {
        self.user_reservations
            .get(&user_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    /// A reservation's room list in attach order.
    pub fn rooms_of_reservation(&self, reservation_id: Id) -> Vec<Id> {
        self.reservation_rooms
            .get(&reservation_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    pub fn reservation_ids(&self) -> Vec<Id> {
        sorted_ids(&self.reservations)
    }

    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    // ── Event application ────────────────────────────────────

    /// Rooms whose reservation sets `event` will change. The caller write-locks
    /// them before applying.
    pub fn rooms_touched(&self, event: &Event) -> Vec<Id> {
        let mut ids = match event {
            Event::CampusDeleted { id } => self.rooms_of_campus(*id),
            Event::UserDeleted { id } => self
                .reservations_of_user(*id)
                .into_iter()
                .flat_map(|r| self.rooms_of_reservation(r))
                .collect(),
            Event::RoomAttached { room_id, .. } => vec![*room_id],
            Event::CampusCreated(_)
            | Event::RoomCreated(_)
            | Event::UserCreated(_)
            | Event::ReservationCreated(_)
            | Event::IdsIssued { .. } => Vec::new(),
        };
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Run `f` on a room's state: through the caller's guard when it holds
    /// one, otherwise by locking in place (uncontended during replay).
    fn with_room(&self, room_id: Id, guards: &mut RoomGuards, f: impl FnOnce(&mut RoomState)) {
        if let Some(guard) = guards.get_mut(&room_id) {
            f(guard);
            return;
        }
        if let Some(shared) = self.room(room_id)
            && let Ok(mut guard) = shared.try_write()
        {
            f(&mut guard);
        }
    }

    /// Apply an event to the maps and indexes. Events that reference a parent
    /// which no longer exists are ignored, both live and on replay.
    pub fn apply(&self, event: &Event, guards: &mut RoomGuards) {
        match event {
            Event::CampusCreated(campus) => {
                self.campus_rooms.entry(campus.id).or_default();
                self.campuses.insert(campus.id, campus.clone());
            }
            Event::CampusDeleted { id } => {
                self.campuses.remove(id);
                let room_ids = self.campus_rooms.remove(id).map(|(_, v)| v).unwrap_or_default();
                for room_id in room_ids {
                    let Some((_, shared)) = self.rooms.remove(&room_id) else { continue };
                    let linked = match guards.get(&room_id) {
                        Some(guard) => guard.reservations.clone(),
                        None => shared
                            .try_read()
                            .map(|g| g.reservations.clone())
                            .unwrap_or_default(),
                    };
                    for reservation_id in linked {
                        if let Some(mut rooms) = self.reservation_rooms.get_mut(&reservation_id) {
                            rooms.retain(|r| *r != room_id);
                        }
                    }
                }
            }
            Event::RoomCreated(room) => {
                if !self.contains_campus(room.campus_id) {
                    return;
                }
                self.rooms
                    .insert(room.id, Arc::new(RwLock::new(RoomState::new(room.clone()))));
                self.campus_rooms.entry(room.campus_id).or_default().push(room.id);
            }
            Event::UserCreated(user) => {
                self.user_reservations.entry(user.id).or_default();
                self.users.insert(user.id, user.clone());
            }
            Event::UserDeleted { id } => {
                self.users.remove(id);
                let owned = self.user_reservations.remove(id).map(|(_, v)| v).unwrap_or_default();
                for reservation_id in owned {
                    self.reservations.remove(&reservation_id);
                    let rooms = self
                        .reservation_rooms
                        .remove(&reservation_id)
                        .map(|(_, v)| v)
                        .unwrap_or_default();
                    for room_id in rooms {
                        self.with_room(room_id, guards, |rs| rs.unlink(reservation_id));
                    }
                }
            }
            Event::ReservationCreated(reservation) => {
                if !self.contains_user(reservation.user_id) {
                    return;
                }
                self.reservation_rooms.entry(reservation.id).or_default();
                self.reservations.insert(reservation.id, reservation.clone());
                self.user_reservations
                    .entry(reservation.user_id)
                    .or_default()
                    .push(reservation.id);
            }
            Event::RoomAttached {
                reservation_id,
                room_id,
            } => {
                if !self.reservations.contains_key(reservation_id) || !self.rooms.contains_key(room_id) {
                    return;
                }
                self.with_room(*room_id, guards, |rs| rs.link(*reservation_id));
                self.reservation_rooms
                    .entry(*reservation_id)
                    .or_default()
                    .push(*room_id);
            }
            Event::IdsIssued { .. } => {}
        }
    }
}
