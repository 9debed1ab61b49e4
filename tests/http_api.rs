use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Days, Local};
use serde_json::{json, Value};
use tower::ServiceExt;

use campus_api::engine::Engine;
use campus_api::http::{create_router, AppState};

fn app(name: &str) -> Router {
    let dir = std::env::temp_dir().join("campus_api_test_http");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    let engine = Arc::new(Engine::new(path).unwrap());
    create_router(AppState::new(engine))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn tomorrow() -> String {
    Local::now()
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap()
        .to_string()
}

async fn post_campus(app: &Router, name: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/campuses",
        Some(json!({"name": name, "address": "1 University Ave", "parkingSpaces": 120})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn post_room(app: &Router, campus_id: u64, number: &str, capacity: u32) -> Value {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/v1/campuses/{campus_id}/rooms"),
        Some(json!({"number": number, "type": "lecture", "capacity": capacity})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn post_user(app: &Router, name: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/users",
        Some(json!({"fullName": name, "dateOfBirth": "2000-02-29", "email": "someone@example.org"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn post_reservation(app: &Router, user_id: u64, start: &str, end: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/v1/users/{user_id}/reservations"),
        Some(json!({
            "dateOfReserv": tomorrow(),
            "startTime": start,
            "endTime": end,
            "comment": "study group",
            "peopleCount": 5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

fn id(v: &Value) -> u64 {
    v["id"].as_u64().unwrap()
}

#[tokio::test]
async fn health() {
    let app = app("health.wal");
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn campus_pagination() {
    let app = app("campus_pagination.wal");
    post_campus(&app, "North").await;
    post_campus(&app, "South").await;

    let (status, page) = send(&app, "GET", "/api/v1/campuses?page=1&count=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["content"].as_array().unwrap().len(), 1);
    assert_eq!(page["content"][0]["name"], "South");
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["totalElements"], 2);
    assert_eq!(page["number"], 1);
    assert_eq!(page["last"], true);
}

#[tokio::test]
async fn huge_page_number_is_empty_last_page() {
    let app = app("huge_page.wal");
    post_campus(&app, "North").await;
    let campus = post_campus(&app, "South").await;

    let uri = format!("/api/v1/campuses?page={}&count=5", usize::MAX);
    let (status, page) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["content"], json!([]));
    assert_eq!(page["totalElements"], 2);
    assert_eq!(page["last"], true);

    let uri = format!("/api/v1/campuses/{}/rooms?page={}&minNumberOfSeats=1", id(&campus), usize::MAX);
    let (status, page) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["empty"], true);
    assert_eq!(page["last"], true);
}

#[tokio::test]
async fn zero_count_rejected() {
    let app = app("zero_count.wal");
    let (status, _) = send(&app, "GET", "/api/v1/campuses?count=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn campus_by_name_and_delete() {
    let app = app("campus_by_name.wal");
    let campus = post_campus(&app, "East").await;

    let (status, found) = send(&app, "GET", "/api/v1/campuses?name=East", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found, campus);
    let (status, _) = send(&app, "GET", "/api/v1/campuses?name=West", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/api/v1/campuses/{}", id(&campus));
    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_fields_listed() {
    let app = app("missing_fields.wal");
    let (status, body) = send(&app, "POST", "/api/v1/campuses", Some(json!({"name": "Only name"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"],
        json!(["Campus address is required", "Campus parkingSpaces is required"])
    );

    let campus = post_campus(&app, "North").await;
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/campuses/{}/rooms", id(&campus)),
        Some(json!({"number": "12"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["Room type is required", "Room capacity is required"]));

    let user = post_user(&app, "Alan Turing").await;
    let uri = format!("/api/v1/users/{}/reservations", id(&user));
    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({"dateOfReserv": tomorrow(), "startTime": "09:00", "endTime": "10:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["Reservation peopleCount is required"]));
    let (_, page) = send(&app, "GET", &uri, None).await;
    assert_eq!(page["totalElements"], 0);
}

#[tokio::test]
async fn room_in_missing_campus_is_not_found() {
    let app = app("room_missing_campus.wal");
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/campuses/77/rooms",
        Some(json!({"number": "1", "type": "lab", "capacity": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn room_scoped_to_campus() {
    let app = app("room_scoped.wal");
    let north = post_campus(&app, "North").await;
    let south = post_campus(&app, "South").await;
    let room = post_room(&app, id(&north), "101", 30).await;
    assert_eq!(room["type"], "lecture");

    let (status, _) = send(&app, "GET", &format!("/api/v1/campuses/{}/rooms/{}", id(&north), id(&room)), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/v1/campuses/{}/rooms/{}", id(&south), id(&room)), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reservation_flow() {
    let app = app("reservation_flow.wal");
    let campus = post_campus(&app, "Main").await;
    let room = post_room(&app, id(&campus), "A-1", 40).await;
    let user = post_user(&app, "Ada Lovelace").await;
    let first = post_reservation(&app, id(&user), "10:00", "11:00").await;
    let second = post_reservation(&app, id(&user), "10:00", "11:00").await;

    let attach = |reservation: &Value| {
        format!(
            "/api/v1/users/{}/reservations/{}/rooms/{}",
            id(&user),
            id(reservation),
            id(&room)
        )
    };

    let (status, body) = send(&app, "PUT", &attach(&first), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, "PUT", &attach(&first), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ROOM_ALREADY_IN_RESERVATION");

    let (status, body) = send(&app, "PUT", &attach(&second), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ROOM_ALREADY_BOOKED");

    let (status, fetched) = send(
        &app,
        "GET",
        &format!("/api/v1/users/{}/reservations/{}", id(&user), id(&first)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["roomIds"], json!([id(&room)]));
    assert_eq!(fetched["peopleCount"], 5);

    let (status, page) = send(
        &app,
        "GET",
        &format!("/api/v1/campuses/{}/rooms/{}/reservations", id(&campus), id(&room)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalElements"], 1);
    assert_eq!(page["content"][0]["id"], id(&first));
}

#[tokio::test]
async fn reservation_field_errors() {
    let app = app("reservation_errors.wal");
    let user = post_user(&app, "Grace Hopper").await;
    let uri = format!("/api/v1/users/{}/reservations", id(&user));

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({"dateOfReserv": tomorrow(), "startTime": "12:00", "endTime": "11:00", "peopleCount": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TIME_RANGE");

    let (status, body) = send(&app, "POST", &uri, Some(json!({"startTime": "09:00", "peopleCount": 2}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_DATE");

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({"dateOfReserv": "2001-01-01", "startTime": "09:00", "endTime": "10:00", "peopleCount": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PAST_DATE");
}

#[tokio::test]
async fn reservation_for_missing_user_is_not_found() {
    let app = app("reservation_missing_user.wal");
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/users/5/reservations",
        Some(json!({"dateOfReserv": tomorrow(), "startTime": "09:00", "endTime": "10:00", "peopleCount": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/api/v1/users/5/reservations/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn room_search_by_availability() {
    let app = app("room_search.wal");
    let campus = post_campus(&app, "Main").await;
    let busy = post_room(&app, id(&campus), "B-1", 20).await;
    let free = post_room(&app, id(&campus), "B-2", 8).await;
    let user = post_user(&app, "Alan Turing").await;
    let r = post_reservation(&app, id(&user), "12:00", "13:00").await;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/users/{}/reservations/{}/rooms/{}", id(&user), id(&r), id(&busy)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let rooms = |query: String| {
        let app = app.clone();
        let uri = format!("/api/v1/campuses/{}/rooms?{query}", id(&campus));
        async move {
            let (status, page) = send(&app, "GET", &uri, None).await;
            assert_eq!(status, StatusCode::OK);
            page["content"]
                .as_array()
                .unwrap()
                .iter()
                .map(id)
                .collect::<Vec<u64>>()
        }
    };

    let date = tomorrow();
    assert_eq!(
        rooms(format!("reservationDate={date}&availableFrom=11:30:00")).await,
        vec![id(&busy), id(&free)]
    );
    assert_eq!(
        rooms(format!("reservationDate={date}&availableFrom=12:30:00")).await,
        vec![id(&free)]
    );
    assert_eq!(rooms("minNumberOfSeats=10".to_string()).await, vec![id(&busy)]);
}

#[tokio::test]
async fn user_listing_and_cascade() {
    let app = app("user_listing.wal");
    let ada = post_user(&app, "Ada Lovelace").await;
    post_user(&app, "Alan Turing").await;

    let (_, page) = send(&app, "GET", "/api/v1/users?nameMatches=Lovelace", None).await;
    assert_eq!(page["totalElements"], 1);
    assert_eq!(page["content"][0]["fullName"], "Ada Lovelace");

    post_reservation(&app, id(&ada), "08:00", "09:00").await;
    let (_, page) = send(&app, "GET", &format!("/api/v1/users/{}/reservations", id(&ada)), None).await;
    assert_eq!(page["totalElements"], 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/users/{}", id(&ada)), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/api/v1/users/{}", id(&ada)), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, page) = send(&app, "GET", &format!("/api/v1/users/{}/reservations", id(&ada)), None).await;
    assert_eq!(page["totalElements"], 0);
}
