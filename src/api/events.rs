//! Events API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::event::{Event, EventPage, EventPayload, EventQuery},
};

use super::AuthenticatedUser;

/// Join confirmation
#[derive(Serialize, Deserialize, ToSchema)]
pub struct JoinResponse {
    pub message: String,
    pub event: Event,
}

/// Plain confirmation message
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Create an event
#[utoipa::path(
    post,
    path = "/events",
    tag = "events",
    security(("bearer_auth" = [])),
    request_body = EventPayload,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Missing or malformed fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_event(
    State(state): State<crate::AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    WithRejection(Json(data), _): WithRejection<Json<EventPayload>, AppError>,
) -> AppResult<(StatusCode, Json<Event>)> {
    let event = state.services.events.create(user_id, data).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// List events with search, date filter and pagination
#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    security(("bearer_auth" = [])),
    params(EventQuery),
    responses(
        (status = 200, description = "Events page", body = EventPage)
    )
)]
pub async fn list_events(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    WithRejection(Query(query), _): WithRejection<Query<EventQuery>, AppError>,
) -> AppResult<Json<EventPage>> {
    let page = state.services.events.list(&query, Utc::now()).await?;
    Ok(Json(page))
}

/// List events created by the authenticated user
#[utoipa::path(
    get,
    path = "/events/my-events",
    tag = "events",
    security(("bearer_auth" = [])),
    params(EventQuery),
    responses(
        (status = 200, description = "Events page", body = EventPage)
    )
)]
pub async fn my_events(
    State(state): State<crate::AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    WithRejection(Query(query), _): WithRejection<Query<EventQuery>, AppError>,
) -> AppResult<Json<EventPage>> {
    let page = state
        .services
        .events
        .list_for_user(user_id, &query, Utc::now())
        .await?;
    Ok(Json(page))
}

/// Most recent events (public)
#[utoipa::path(
    get,
    path = "/events/latest",
    tag = "events",
    responses(
        (status = 200, description = "Latest events", body = [Event])
    )
)]
pub async fn latest_events(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Event>>> {
    let events = state.services.events.latest().await?;
    Ok(Json(events))
}

/// Get event by ID
#[utoipa::path(
    get,
    path = "/events/get/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = Event),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_event(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Event>> {
    let event = state.services.events.get_by_id(parse_id(&id)?).await?;
    Ok(Json(event))
}

/// Join an event as the authenticated user
#[utoipa::path(
    put,
    path = "/events/join/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Joined", body = JoinResponse),
        (status = 400, description = "Already joined", body = crate::error::ErrorResponse),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn join_event(
    State(state): State<crate::AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<JoinResponse>> {
    let event = state.services.events.join(parse_id(&id)?, user_id).await?;
    Ok(Json(JoinResponse {
        message: "Successfully joined the event".to_string(),
        event,
    }))
}

/// Update an event (owner only)
#[utoipa::path(
    put,
    path = "/events/update/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = EventPayload,
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 400, description = "Missing fields", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the owner", body = crate::error::ErrorResponse),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_event(
    State(state): State<crate::AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<String>,
    WithRejection(Json(data), _): WithRejection<Json<EventPayload>, AppError>,
) -> AppResult<Json<Event>> {
    let event = state
        .services
        .events
        .update(parse_id(&id)?, user_id, data)
        .await?;
    Ok(Json(event))
}

/// Delete an event (owner only)
#[utoipa::path(
    delete,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 403, description = "Not the owner", body = crate::error::ErrorResponse),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_event(
    State(state): State<crate::AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.events.delete(parse_id(&id)?, user_id).await?;
    Ok(Json(MessageResponse {
        message: "Event deleted successfully".to_string(),
    }))
}

/// Ids that do not parse cannot name an existing event
fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("Event {} not found", raw)))
}
