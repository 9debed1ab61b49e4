//! Router configuration for the HTTP API.
//!
//! Sets up all routes and middleware (CORS, tracing, request metrics).

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;
use crate::observability::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Record request count and latency per matched route.
async fn track_metrics(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| req.uri().path().to_owned(), |p| p.as_str().to_owned());
    let method = req.method().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    metrics::histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status.clone()
    )
    .record(start.elapsed().as_secs_f64());
    metrics::counter!(HTTP_REQUESTS_TOTAL, "method" => method, "route" => route, "status" => status)
        .increment(1);
    response
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Campuses and rooms
        .route("/campuses", get(handlers::list_campuses).post(handlers::create_campus))
        .route(
            "/campuses/{campus_id}",
            get(handlers::get_campus).delete(handlers::delete_campus),
        )
        .route(
            "/campuses/{campus_id}/rooms",
            get(handlers::list_rooms).post(handlers::create_room),
        )
        .route("/campuses/{campus_id}/rooms/{room_id}", get(handlers::get_room))
        .route(
            "/campuses/{campus_id}/rooms/{room_id}/reservations",
            get(handlers::room_reservations),
        )
        // Users and reservations
        .route("/users", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/users/{user_id}",
            get(handlers::get_user).delete(handlers::delete_user),
        )
        .route(
            "/users/{user_id}/reservations",
            get(handlers::user_reservations).post(handlers::create_reservation),
        )
        .route(
            "/users/{user_id}/reservations/{reservation_id}",
            get(handlers::get_reservation),
        )
        .route(
            "/users/{user_id}/reservations/{reservation_id}/rooms/{room_id}",
            put(handlers::reserve_room),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_v1)
        .route_layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::engine::Engine;

    #[tokio::test]
    async fn test_router_creation() {
        let dir = std::env::temp_dir().join("campus_api_test_router");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("router.wal");
        let _ = std::fs::remove_file(&path);
        let engine = Arc::new(Engine::new(path).unwrap());
        let _router = create_router(AppState::new(engine));
    }
}
