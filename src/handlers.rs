use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::{
    AppState,
    auth::verify_token,
    error::ApiError,
    filter,
    models::{BookingResult, Class, Notification, User},
    validation::parse_filter,
};

#[derive(Debug, Deserialize)]
pub struct ClassQuery {
    pub levels: Option<String>,
    pub instructor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookQuery {
    #[serde(default)]
    pub wait: bool,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    #[schema(example = "Asha Patel")]
    pub name: String,
}

#[utoipa::path(get, path = "/", tag = "classes")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Class Booking API",
        "endpoints": {
            "/classes": "List classes, filter with ?levels=Beginner,Advanced&instructor=Name",
            "/classes/{id}/book": "Book a class",
            "/instructors": "List instructors",
            "/notifications": "Recent booking and profile notifications",
            "/profile": "Read or update the user profile"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "health")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "health")]
pub async fn healthz_ready() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(
    get,
    path = "/classes",
    params(
        ("levels" = Option<String>, Query, description = "Comma-separated levels: Beginner, Intermediate, Advanced"),
        ("instructor" = Option<String>, Query, description = "Exact instructor name")
    ),
    responses(
        (status = 200, description = "Filtered classes in catalog order", body = [Class]),
        (status = 400, description = "Unknown level")
    ),
    tag = "classes"
)]
pub async fn list_classes(
    State(state): State<AppState>,
    Query(query): Query<ClassQuery>,
) -> Result<Json<Vec<Class>>, ApiError> {
    let filter = parse_filter(query.levels.as_deref(), query.instructor.as_deref())?;
    let catalog = state.catalog.read().await;
    Ok(Json(filter::apply(catalog.classes(), &filter)))
}

#[utoipa::path(
    get,
    path = "/classes/{id}",
    params(("id" = String, Path, description = "Class id")),
    responses(
        (status = 200, description = "The class", body = Class),
        (status = 404, description = "Class not found")
    ),
    tag = "classes"
)]
pub async fn get_class(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Class>, ApiError> {
    state
        .catalog
        .read()
        .await
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Class '{id}' not found")))
}

#[utoipa::path(
    get,
    path = "/instructors",
    responses((status = 200, description = "Sorted instructor names", body = [String])),
    tag = "classes"
)]
pub async fn list_instructors(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog.read().await.instructors().to_vec())
}

#[utoipa::path(
    post,
    path = "/classes/{id}/book",
    params(
        ("id" = String, Path, description = "Class id"),
        ("wait" = Option<bool>, Query, description = "Wait for the booking to settle"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Settled booking (wait=true)", body = BookingResult),
        (status = 202, description = "Booking accepted, class optimistically booked", body = Class),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Class already booked or booking in progress")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "booking"
)]
pub async fn book_class(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(id): Path<String>,
    Query(query): Query<BookQuery>,
) -> Result<Response, ApiError> {
    let auth_header = auth.map(|TypedHeader(a)| a);
    verify_token(&state.settings, auth_header, query.token.as_deref())?;

    let already_booked = state
        .catalog
        .read()
        .await
        .get(&id)
        .map(|class| class.is_booked)
        .ok_or_else(|| ApiError::NotFound(format!("Class '{id}' not found")))?;
    if already_booked {
        return Err(ApiError::Conflict(format!("Class '{id}' is already booked")));
    }

    let pending = state.booking.begin(&id).await?;
    info!(class_id = %id, wait = query.wait, "booking started");

    // The attempt runs to completion even if this request is dropped.
    let class = pending.class().clone();
    let booking = state.booking.clone();
    let settled = tokio::spawn(async move { booking.complete(pending).await });

    if query.wait {
        let result = settled.await.map_err(|err| {
            error!(class_id = %id, error = %err, "booking task failed");
            ApiError::Internal("Booking task failed".into())
        })?;
        return Ok(Json(result).into_response());
    }

    Ok((StatusCode::ACCEPTED, Json(class)).into_response())
}

#[utoipa::path(
    get,
    path = "/notifications",
    responses((status = 200, description = "Recent notifications, oldest first", body = [Notification])),
    tag = "booking"
)]
pub async fn list_notifications(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.notifications.recent())
}

#[utoipa::path(
    get,
    path = "/profile",
    responses((status = 200, description = "Current user", body = User)),
    tag = "profile"
)]
pub async fn get_profile(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.profile.current().await)
}

#[utoipa::path(
    put,
    path = "/profile",
    params(
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Name is empty or too long"),
        (status = 401, description = "Invalid authentication token"),
        (status = 500, description = "Failed to save changes")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(query): Query<TokenQuery>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
    let auth_header = auth.map(|TypedHeader(a)| a);
    verify_token(&state.settings, auth_header, query.token.as_deref())?;

    let user = state.profile.rename(&update.name).await?;
    Ok(Json(user))
}
