//! HTTP handlers for the REST API.
//!
//! Each handler maps one endpoint onto an `Engine` call. Lookups that find
//! nothing become 404; engine errors go through `AppError`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::dto::*;
use super::error::AppError;
use super::state::AppState;
use crate::engine::Engine;
use crate::model::*;
use crate::page::Page;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

type Created<T> = Result<(StatusCode, Json<T>), AppError>;

fn paging(query: PageQuery) -> Result<crate::page::PageRequest, AppError> {
    query.request().map_err(AppError::BadRequest)
}

fn reservation_dto(engine: &Engine, reservation: Reservation) -> ReservationDto {
    let rooms = engine.reservation_rooms(reservation.id);
    ReservationDto::new(reservation, rooms)
}

fn reservation_page(engine: &Engine, page: Page<Reservation>) -> Page<ReservationDto> {
    page.map(|r| reservation_dto(engine, r))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check() -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

// =============================================================================
// Campuses
// =============================================================================

/// GET /api/v1/campuses
///
/// A page of campuses, or the single campus named by `?name=`.
pub async fn list_campuses(
    State(state): State<AppState>,
    Query(query): Query<CampusListQuery>,
) -> Result<Response, AppError> {
    if let Some(name) = query.name {
        let campus = state
            .engine
            .find_campus_by_name(&name)
            .ok_or_else(|| AppError::NotFound(format!("campus '{name}' not found")))?;
        return Ok(Json(CampusDto::from(campus)).into_response());
    }
    let request = paging(PageQuery { page: query.page, count: query.count })?;
    let page = state.engine.list_campuses(request).map(CampusDto::from);
    Ok(Json(page).into_response())
}

/// POST /api/v1/campuses
pub async fn create_campus(
    State(state): State<AppState>,
    Json(body): Json<CampusRequest>,
) -> Created<CampusDto> {
    let new = body.validate().map_err(AppError::Invalid)?;
    let campus = state.engine.create_campus(new).await?;
    Ok((StatusCode::CREATED, Json(campus.into())))
}

/// GET /api/v1/campuses/{campus_id}
pub async fn get_campus(
    State(state): State<AppState>,
    Path(campus_id): Path<Id>,
) -> HandlerResult<CampusDto> {
    state
        .engine
        .find_campus(campus_id)
        .map(|c| Json(c.into()))
        .ok_or_else(|| AppError::NotFound(format!("campus {campus_id} not found")))
}

/// DELETE /api/v1/campuses/{campus_id}
pub async fn delete_campus(
    State(state): State<AppState>,
    Path(campus_id): Path<Id>,
) -> Result<StatusCode, AppError> {
    if state.engine.delete_campus(campus_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("campus {campus_id} not found")))
    }
}

// =============================================================================
// Rooms
// =============================================================================

/// GET /api/v1/campuses/{campus_id}/rooms
pub async fn list_rooms(
    State(state): State<AppState>,
    Path(campus_id): Path<Id>,
    Query(query): Query<RoomListQuery>,
) -> HandlerResult<Page<RoomDto>> {
    let request = paging(query.paging())?;
    let page = state
        .engine
        .list_rooms(campus_id, request, &query.search())
        .await;
    Ok(Json(page.map(RoomDto::from)))
}

/// POST /api/v1/campuses/{campus_id}/rooms
pub async fn create_room(
    State(state): State<AppState>,
    Path(campus_id): Path<Id>,
    Json(body): Json<RoomRequest>,
) -> Created<RoomDto> {
    let new = body.validate().map_err(AppError::Invalid)?;
    let room = state
        .engine
        .add_room(campus_id, new)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("campus {campus_id} not found")))?;
    Ok((StatusCode::CREATED, Json(room.into())))
}

/// GET /api/v1/campuses/{campus_id}/rooms/{room_id}
pub async fn get_room(
    State(state): State<AppState>,
    Path((campus_id, room_id)): Path<(Id, Id)>,
) -> HandlerResult<RoomDto> {
    state
        .engine
        .find_room_in_campus(campus_id, room_id)
        .await
        .map(|r| Json(r.into()))
        .ok_or_else(|| AppError::NotFound(format!("room {room_id} not found in campus {campus_id}")))
}

/// GET /api/v1/campuses/{campus_id}/rooms/{room_id}/reservations
pub async fn room_reservations(
    State(state): State<AppState>,
    Path((campus_id, room_id)): Path<(Id, Id)>,
    Query(query): Query<PageQuery>,
) -> HandlerResult<Page<ReservationDto>> {
    let request = paging(query)?;
    let page = state
        .engine
        .room_reservations(campus_id, room_id, request)
        .await;
    Ok(Json(reservation_page(&state.engine, page)))
}

// =============================================================================
// Users
// =============================================================================

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> HandlerResult<Page<UserDto>> {
    let request = paging(PageQuery { page: query.page, count: query.count })?;
    let page = match &query.name_matches {
        Some(fragment) => state.engine.users_matching(fragment, request),
        None => state.engine.list_users(request),
    };
    Ok(Json(page.map(UserDto::from)))
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<UserRequest>,
) -> Created<UserDto> {
    let new = body.validate().map_err(AppError::Invalid)?;
    let user = state.engine.create_user(new).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/v1/users/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Id>,
) -> HandlerResult<UserDto> {
    state
        .engine
        .find_user(user_id)
        .map(|u| Json(u.into()))
        .ok_or_else(|| AppError::NotFound(format!("user {user_id} not found")))
}

/// DELETE /api/v1/users/{user_id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Id>,
) -> Result<StatusCode, AppError> {
    if state.engine.delete_user(user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("user {user_id} not found")))
    }
}

// =============================================================================
// Reservations
// =============================================================================

/// GET /api/v1/users/{user_id}/reservations
pub async fn user_reservations(
    State(state): State<AppState>,
    Path(user_id): Path<Id>,
    Query(query): Query<PageQuery>,
) -> HandlerResult<Page<ReservationDto>> {
    let request = paging(query)?;
    let page = state.engine.user_reservations(user_id, request);
    Ok(Json(reservation_page(&state.engine, page)))
}

/// POST /api/v1/users/{user_id}/reservations
pub async fn create_reservation(
    State(state): State<AppState>,
    Path(user_id): Path<Id>,
    Json(body): Json<ReservationRequest>,
) -> Created<ReservationDto> {
    let draft = body.validate().map_err(AppError::Invalid)?;
    let reservation = state
        .engine
        .add_reservation(user_id, draft)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id} not found")))?;
    Ok((StatusCode::CREATED, Json(reservation_dto(&state.engine, reservation))))
}

/// GET /api/v1/users/{user_id}/reservations/{reservation_id}
pub async fn get_reservation(
    State(state): State<AppState>,
    Path((user_id, reservation_id)): Path<(Id, Id)>,
) -> HandlerResult<ReservationDto> {
    state
        .engine
        .find_reservation(user_id, reservation_id)
        .map(|r| Json(reservation_dto(&state.engine, r)))
        .ok_or_else(|| {
            AppError::NotFound(format!("reservation {reservation_id} not found for user {user_id}"))
        })
}

/// PUT /api/v1/users/{user_id}/reservations/{reservation_id}/rooms/{room_id}
///
/// Attach a room to a reservation. 201 with an empty body on success.
pub async fn reserve_room(
    State(state): State<AppState>,
    Path((user_id, reservation_id, room_id)): Path<(Id, Id, Id)>,
) -> Result<StatusCode, AppError> {
    state
        .engine
        .reserve_room(user_id, reservation_id, room_id)
        .await
        .inspect_err(crate::observability::record_attach_rejection)?;
    Ok(StatusCode::CREATED)
}
