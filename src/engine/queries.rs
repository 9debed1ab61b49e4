use crate::model::*;
use crate::page::{Page, PageRequest};

use super::availability::{filter_rooms, RoomSearch};
use super::Engine;

/// Store pagination over an id list already in listing order.
fn page_of<T>(ids: &[Id], request: PageRequest, fetch: impl Fn(Id) -> Option<T>) -> Page<T> {
    let content = ids[request.window(ids.len())]
        .iter()
        .filter_map(|id| fetch(*id))
        .collect();
    Page::from_store(content, request, ids.len())
}

impl Engine {
    // ── Campuses ─────────────────────────────────────────────

    pub fn list_campuses(&self, request: PageRequest) -> Page<Campus> {
        page_of(&self.store.campus_ids(), request, |id| self.store.campus(id))
    }

    pub fn find_campus(&self, id: Id) -> Option<Campus> {
        self.store.campus(id)
    }

    /// First campus, by id, whose name equals `name` exactly.
    pub fn find_campus_by_name(&self, name: &str) -> Option<Campus> {
        self.store
            .campus_ids()
            .into_iter()
            .filter_map(|id| self.store.campus(id))
            .find(|c| c.name == name)
    }

    // ── Rooms ────────────────────────────────────────────────

    /// Rooms of a campus in creation order.
    ///
    /// With an empty search this is plain store pagination. Otherwise every
    /// room of the campus is loaded, filtered, then sliced in memory, and an
    /// empty result still reports one page.
    pub async fn list_rooms(&self, campus_id: Id, request: PageRequest, search: &RoomSearch) -> Page<Room> {
        let room_ids = self.store.rooms_of_campus(campus_id);
        if search.is_empty() {
            let mut content = Vec::new();
            for id in &room_ids[request.window(room_ids.len())] {
                if let Some(shared) = self.store.room(*id) {
                    content.push(shared.read().await.room.clone());
                }
            }
            return Page::from_store(content, request, room_ids.len());
        }

        let mut candidates = Vec::with_capacity(room_ids.len());
        for id in room_ids {
            let Some(shared) = self.store.room(id) else { continue };
            let state = shared.read().await;
            candidates.push((state.room.clone(), self.store.reservations_by_ids(&state.reservations)));
        }
        Page::slice(filter_rooms(search, candidates), request)
    }

    pub async fn find_room(&self, room_id: Id) -> Option<Room> {
        let shared = self.store.room(room_id)?;
        let room = shared.read().await.room.clone();
        Some(room)
    }

    /// The room, only if it belongs to `campus_id`.
    pub async fn find_room_in_campus(&self, campus_id: Id, room_id: Id) -> Option<Room> {
        self.find_room(room_id).await.filter(|r| r.campus_id == campus_id)
    }

    /// Reservations linked to a room, in link order, as a single page.
    ///
    /// The page holds the requested window but reports itself as page 0 of
    /// 1 with `size` equal to the window length and `total_elements` equal
    /// to the full link count. An unknown room, or one in another campus,
    /// yields an empty page.
    pub async fn room_reservations(&self, campus_id: Id, room_id: Id, request: PageRequest) -> Page<Reservation> {
        let Some(shared) = self.store.room(room_id) else {
            return Page::empty_unpaged();
        };
        let state = shared.read().await;
        if state.room.campus_id != campus_id {
            return Page::empty_unpaged();
        }
        let linked = &state.reservations;
        let content = self.store.reservations_by_ids(&linked[request.window(linked.len())]);
        Page::unpaged(content, linked.len())
    }

    // ── Users ────────────────────────────────────────────────

    pub fn list_users(&self, request: PageRequest) -> Page<User> {
        page_of(&self.store.user_ids(), request, |id| self.store.user(id))
    }

    /// Users whose full name contains `fragment` (case-sensitive).
    pub fn users_matching(&self, fragment: &str, request: PageRequest) -> Page<User> {
        let matching: Vec<Id> = self
            .store
            .user_ids()
            .into_iter()
            .filter(|id| {
                self.store
                    .user(*id)
                    .is_some_and(|u| u.full_name.contains(fragment))
            })
            .collect();
        page_of(&matching, request, |id| self.store.user(id))
    }

    pub fn find_user(&self, id: Id) -> Option<User> {
        self.store.user(id)
    }

    // ── Reservations ─────────────────────────────────────────

    /// A user's reservations in creation order. Unknown users have none.
    pub fn user_reservations(&self, user_id: Id, request: PageRequest) -> Page<Reservation> {
        page_of(&self.store.reservations_of_user(user_id), request, |id| {
            self.store.reservation(id)
        })
    }

    pub fn find_reservation(&self, user_id: Id, reservation_id: Id) -> Option<Reservation> {
        self.store.reservation_of_user(reservation_id, user_id)
    }

    /// Room ids attached to a reservation, in attach order.
    pub fn reservation_rooms(&self, reservation_id: Id) -> Vec<Id> {
        self.store.rooms_of_reservation(reservation_id)
    }
}
