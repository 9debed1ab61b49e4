use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Days, Local, NaiveDate, NaiveTime};

use campus_api::engine::{Engine, RoomSearch};
use campus_api::model::*;
use campus_api::page::PageRequest;

fn bench_wal_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("campus_api_bench");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies.last().unwrap().as_secs_f64() * 1000.0,
    );
}

/// The `i`th one-hour slot: eight per day from 08:00, starting tomorrow.
fn slot(i: u64) -> (NaiveDate, NaiveTime, NaiveTime) {
    let date = Local::now()
        .date_naive()
        .checked_add_days(Days::new(1 + i / 8))
        .unwrap();
    let hour = 8 + (i % 8) as u32;
    (
        date,
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
    )
}

fn draft(i: u64) -> ReservationDraft {
    let (date, start, end) = slot(i);
    ReservationDraft {
        date: Some(date),
        start_time: Some(start),
        end_time: Some(end),
        comment: None,
        people_count: Some(10),
    }
}

struct Fixture {
    engine: Arc<Engine>,
    campus_id: Id,
    rooms: Vec<Id>,
    user_id: Id,
}

async fn setup(name: &str, n_rooms: u32) -> Fixture {
    let engine = Arc::new(Engine::new(bench_wal_path(name)).unwrap());
    let campus = engine
        .create_campus(NewCampus {
            name: "Bench".into(),
            address: "Loop Rd".into(),
            parking_spaces: 0,
        })
        .await
        .unwrap();
    let mut rooms = Vec::new();
    for i in 0..n_rooms {
        let room = engine
            .add_room(
                campus.id,
                NewRoom {
                    number: format!("R{i}"),
                    kind: "lecture".into(),
                    capacity: 10 + i * 5,
                },
            )
            .await
            .unwrap()
            .unwrap();
        rooms.push(room.id);
    }
    let user = engine
        .create_user(NewUser {
            full_name: "Bench User".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            email: "bench@example.org".into(),
        })
        .await
        .unwrap();
    Fixture {
        engine,
        campus_id: campus.id,
        rooms,
        user_id: user.id,
    }
}

async fn phase1_sequential() {
    let f = setup("sequential.wal", 1).await;
    let n = 2000;
    let mut latencies = Vec::with_capacity(n as usize);
    let start = Instant::now();

    for i in 0..n {
        let t = Instant::now();
        let r = f.engine.add_reservation(f.user_id, draft(i)).await.unwrap().unwrap();
        f.engine.reserve_room(f.user_id, r.id, f.rooms[0]).await.unwrap();
        latencies.push(t.elapsed());
    }

    let elapsed = start.elapsed();
    let ops = n as f64 / elapsed.as_secs_f64();
    println!("  {n} reservations in {:.2}s = {ops:.0} ops/sec", elapsed.as_secs_f64());
    print_latency("create + attach latency", &mut latencies);
}

/// Many tasks race for the same slots; exactly one attach per slot may win.
async fn phase2_contention() {
    let f = setup("contention.wal", 1).await;
    let n_tasks = 10;
    let n_slots = 200;

    let start = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..n_tasks {
        let engine = f.engine.clone();
        let (user_id, room_id) = (f.user_id, f.rooms[0]);
        handles.push(tokio::spawn(async move {
            let mut wins = 0u64;
            for i in 0..n_slots {
                let r = engine.add_reservation(user_id, draft(i)).await.unwrap().unwrap();
                if engine.reserve_room(user_id, r.id, room_id).await.is_ok() {
                    wins += 1;
                }
            }
            wins
        }));
    }
    let mut wins = 0;
    for h in handles {
        wins += h.await.unwrap();
    }

    let elapsed = start.elapsed();
    let total = n_tasks * n_slots;
    println!(
        "  {n_tasks} tasks x {n_slots} attaches = {total} total in {:.2}s, {wins} won",
        elapsed.as_secs_f64()
    );
    assert_eq!(wins, n_slots, "each slot must be booked exactly once");
}

async fn phase3_search_under_load() {
    let f = setup("search.wal", 50).await;
    for i in 0..400 {
        let r = f.engine.add_reservation(f.user_id, draft(i)).await.unwrap().unwrap();
        let room = f.rooms[(i as usize) % f.rooms.len()];
        f.engine.reserve_room(f.user_id, r.id, room).await.unwrap();
    }

    let writer = {
        let engine = f.engine.clone();
        let (user_id, rooms) = (f.user_id, f.rooms.clone());
        tokio::spawn(async move {
            for i in 400..1400 {
                let r = engine.add_reservation(user_id, draft(i)).await.unwrap().unwrap();
                let _ = engine.reserve_room(user_id, r.id, rooms[(i as usize) % rooms.len()]).await;
            }
        })
    };

    let (date, from, until) = slot(3);
    let search = RoomSearch {
        reservation_date: Some(date),
        available_from: Some(from),
        available_until: Some(until),
        min_seats: Some(50),
    };
    let mut latencies = Vec::new();
    for _ in 0..500 {
        let t = Instant::now();
        let page = f
            .engine
            .list_rooms(f.campus_id, PageRequest::new(0, 20), &search)
            .await;
        latencies.push(t.elapsed());
        assert!(page.number_of_elements <= 20);
    }
    writer.await.unwrap();
    print_latency("filtered room search", &mut latencies);
}

#[tokio::main]
async fn main() {
    println!("=== campus-api stress benchmark ===\n");

    println!("[phase 1] sequential create + attach");
    phase1_sequential().await;

    println!("\n[phase 2] attach contention on shared slots");
    phase2_contention().await;

    println!("\n[phase 3] filtered search under write load");
    phase3_search_under_load().await;

    println!("\n=== benchmark complete ===");
}
