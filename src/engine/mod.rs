mod availability;
mod conflict;
mod error;
mod mutations;
mod queries;
mod store;

pub use availability::{filter_rooms, RoomSearch};
pub use conflict::{check_room_attachment, validate_reservation};
pub use error::EngineError;
pub use store::{RoomState, SharedRoomState, Store};

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, oneshot, RwLock};

use crate::model::*;
use crate::wal::Wal;

use store::RoomGuards;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];
                let mut pending = None;
                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { event, response }) => batch.push((event, response)),
                        Ok(other) => {
                            pending = Some(other);
                            break;
                        }
                        Err(_) => break,
                    }
                }
                commit_batch(&mut wal, &mut batch);
                // A non-append command seen mid-drain runs after the batch it followed.
                if let Some(other) = pending {
                    handle_non_append(&mut wal, other);
                }
            }
            other => handle_non_append(&mut wal, other),
        }
    }
}

fn commit_batch(wal: &mut Wal, batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>) {
    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let flush_start = std::time::Instant::now();
    let result = flush_batch(wal, batch);
    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
        .record(flush_start.elapsed().as_secs_f64());
    if let Err(e) = &result {
        tracing::error!(error = %e, batch = batch.len(), "WAL flush failed");
    }
    respond_batch(batch, &result);
}

fn flush_batch(wal: &mut Wal, batch: &[(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Flush even after an append error so partial bytes don't ride along
    // with the next batch.
    let flush_err = wal.flush_sync().err();
    match (append_err, flush_err) {
        (Some(e), _) | (None, Some(e)) => Err(e),
        (None, None) => Ok(()),
    }
}

fn respond_batch(batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>, result: &io::Result<()>) {
    for (_, tx) in batch.drain(..) {
        let r = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { event, response } => {
            let mut batch = vec![(event, response)];
            commit_batch(wal, &mut batch);
        }
    }
}

// ── Id allocation ────────────────────────────────────────

/// Last issued id per entity kind. Ids start at 1.
#[derive(Default)]
struct IdCounters {
    campus: AtomicU64,
    room: AtomicU64,
    user: AtomicU64,
    reservation: AtomicU64,
}

impl IdCounters {
    fn next(counter: &AtomicU64) -> Id {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Advance past an id seen during replay.
    fn observe(&self, event: &Event) {
        let (counter, id) = match event {
            Event::CampusCreated(c) => (&self.campus, c.id),
            Event::RoomCreated(r) => (&self.room, r.id),
            Event::UserCreated(u) => (&self.user, u.id),
            Event::ReservationCreated(r) => (&self.reservation, r.id),
            Event::IdsIssued {
                campus,
                room,
                user,
                reservation,
            } => {
                self.campus.fetch_max(*campus, Ordering::Relaxed);
                self.room.fetch_max(*room, Ordering::Relaxed);
                self.user.fetch_max(*user, Ordering::Relaxed);
                self.reservation.fetch_max(*reservation, Ordering::Relaxed);
                return;
            }
            Event::CampusDeleted { .. } | Event::UserDeleted { .. } | Event::RoomAttached { .. } => return,
        };
        counter.fetch_max(id, Ordering::Relaxed);
    }

    fn issued(&self) -> Event {
        Event::IdsIssued {
            campus: self.campus.load(Ordering::Relaxed),
            room: self.room.load(Ordering::Relaxed),
            user: self.user.load(Ordering::Relaxed),
            reservation: self.reservation.load(Ordering::Relaxed),
        }
    }
}

pub struct Engine {
    pub store: Store,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    /// Shared by every commit, taken exclusively by cascading deletes and
    /// by compaction while it snapshots the store.
    pub(super) commit_lock: RwLock<()>,
    ids: IdCounters,
}

impl Engine {
    /// Replay the WAL at `wal_path` and start its writer task. Must be called
    /// inside a tokio runtime.
    pub fn new(wal_path: PathBuf) -> io::Result<Self> {
        let events = Wal::recover(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            store: Store::new(),
            wal_tx,
            commit_lock: RwLock::new(()),
            ids: IdCounters::default(),
        };

        // Nothing else holds the room locks yet, so `apply` locks in place.
        let mut guards = RoomGuards::new();
        for event in &events {
            engine.ids.observe(event);
            engine.store.apply(event, &mut guards);
        }
        Ok(engine)
    }

    pub(super) fn next_campus_id(&self) -> Id {
        IdCounters::next(&self.ids.campus)
    }

    pub(super) fn next_room_id(&self) -> Id {
        IdCounters::next(&self.ids.room)
    }

    pub(super) fn next_user_id(&self) -> Id {
        IdCounters::next(&self.ids.user)
    }

    pub(super) fn next_reservation_id(&self) -> Id {
        IdCounters::next(&self.ids.reservation)
    }

    async fn send_wal(&self, cmd: WalCommand) -> Result<(), EngineError> {
        self.wal_tx
            .send(cmd)
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))
    }

    /// Write event to WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send_wal(WalCommand::Append {
            event: event.clone(),
            response: tx,
        })
        .await?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub(super) async fn wal_compact(&self, events: Vec<Event>) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send_wal(WalCommand::Compact { events, response: tx }).await?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    /// Write-lock the given rooms in ascending id order. Rooms that no longer
    /// exist are skipped.
    pub(super) async fn lock_rooms(&self, mut room_ids: Vec<Id>) -> RoomGuards {
        room_ids.sort_unstable();
        room_ids.dedup();
        let mut guards = RoomGuards::new();
        for id in room_ids {
            if let Some(shared) = self.store.room(id) {
                guards.insert(id, shared.write_owned().await);
            }
        }
        guards
    }

    /// WAL-append then apply. The caller holds `commit_lock` and the write
    /// guards of every room the event touches.
    pub(super) async fn persist_and_apply(
        &self,
        event: &Event,
        guards: &mut RoomGuards,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        self.store.apply(event, guards);
        Ok(())
    }
}
