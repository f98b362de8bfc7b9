use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    application::{
        content::{ContentService, NewPost},
        error::HttpError,
        timeline::{TimelineService, parse_max_created_at},
        users::UserLookup,
    },
    domain::{entities::User, users::is_valid_account_name},
};

use super::{
    DatabaseHealth, db_health_response,
    middleware::{log_responses, set_request_context},
};

/// Session user id forwarded by the session layer.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Per-render CSRF token forwarded by the session layer.
pub const CSRF_HEADER: &str = "x-csrf-token";

const SOURCE: &str = "infra::http::public";

#[derive(Clone)]
pub struct HttpState {
    pub users: UserLookup,
    pub timeline: Arc<TimelineService>,
    pub content: Arc<ContentService>,
    pub db: Arc<dyn DatabaseHealth>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/posts", get(posts_before).post(create_post))
        .route("/posts/{id}", get(post_detail))
        .route("/users/{account_name}", get(profile))
        .route("/comments", post(create_comment))
        .route("/admin/banned", get(ban_candidates).post(ban_users))
        .route("/_health/db", get(public_health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Deserialize)]
struct PostsQuery {
    max_created_at: String,
}

#[derive(Debug, Deserialize)]
struct CreatePostRequest {
    mime: String,
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct CreateCommentRequest {
    post_id: i64,
    comment: String,
}

#[derive(Debug, Deserialize)]
struct BanRequest {
    #[serde(default)]
    user_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct Created {
    id: i64,
}

async fn index(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    match state.timeline.home_feed(csrf_token(&headers)).await {
        Ok(posts) => Json(posts).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn posts_before(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(query): Query<PostsQuery>,
) -> Response {
    let max_created_at = match parse_max_created_at(&query.max_created_at) {
        Ok(value) => value,
        Err(err) => return HttpError::from(err).into_response(),
    };

    match state
        .timeline
        .posts_before(max_created_at, csrf_token(&headers))
        .await
    {
        Ok(posts) => Json(posts).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn post_detail(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    match state.timeline.post_detail(id, csrf_token(&headers)).await {
        Ok(Some(post)) => Json(post).into_response(),
        Ok(None) => HttpError::not_found(SOURCE, format!("Post {id} is not visible")).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn profile(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path(account_name): Path<String>,
) -> Response {
    if !is_valid_account_name(&account_name) {
        return HttpError::not_found(SOURCE, format!("Account `{account_name}` is malformed"))
            .into_response();
    }

    match state
        .timeline
        .profile(&account_name, csrf_token(&headers))
        .await
    {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => HttpError::not_found(SOURCE, format!("Account `{account_name}` is not active"))
            .into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn create_post(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Json(request): Json<CreatePostRequest>,
) -> Response {
    let actor = match resolve_actor(&state, &headers).await {
        Ok(actor) => actor,
        Err(err) => return err.into_response(),
    };

    let post = NewPost {
        mime: request.mime,
        body: request.body,
    };
    match state.content.create_post(&actor, post).await {
        Ok(record) => (StatusCode::CREATED, Json(Created { id: record.id })).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn create_comment(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Json(request): Json<CreateCommentRequest>,
) -> Response {
    let actor = match resolve_actor(&state, &headers).await {
        Ok(actor) => actor,
        Err(err) => return err.into_response(),
    };

    match state
        .content
        .create_comment(&actor, request.post_id, request.comment)
        .await
    {
        Ok(record) => (StatusCode::CREATED, Json(Created { id: record.id })).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn ban_candidates(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    let actor = match resolve_actor(&state, &headers).await {
        Ok(actor) => actor,
        Err(err) => return err.into_response(),
    };

    match state.content.ban_candidates(&actor).await {
        Ok(users) => Json(users).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn ban_users(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Json(request): Json<BanRequest>,
) -> Response {
    let actor = match resolve_actor(&state, &headers).await {
        Ok(actor) => actor,
        Err(err) => return err.into_response(),
    };

    match state.content.ban_users(&actor, &request.user_ids).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.ping().await)
}

fn csrf_token(headers: &HeaderMap) -> &str {
    headers
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Resolves the forwarded session user; a missing header yields the absent user.
async fn resolve_actor(state: &HttpState, headers: &HeaderMap) -> Result<User, HttpError> {
    let Some(raw) = headers.get(USER_ID_HEADER) else {
        return Ok(User::default());
    };
    let id = raw
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .ok_or_else(|| HttpError::bad_request(SOURCE, "x-user-id is not a numeric id"))?;

    Ok(state.users.get_user(id).await?.unwrap_or_default())
}
