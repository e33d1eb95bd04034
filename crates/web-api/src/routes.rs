use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use application::{AttachmentPayload, SendMessageRequest};
use domain::MessageEvent;

use crate::{error::ApiError, state::AppState, ws};

#[derive(Debug, Deserialize)]
struct JoinRoomPayload {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    /// 房间标识：存储主键或slug
    room: String,
    sender_id: Uuid,
    text: Option<String>,
    /// base64编码的附件内容
    attachment_data: Option<String>,
    attachment_content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    page: Option<i64>,
}

#[derive(Debug, Serialize)]
struct RoomResponse {
    id: Uuid,
    slug: String,
    title: String,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct MemberResponse {
    id: Uuid,
    name: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .route("/ws", get(ws::websocket_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/rooms/{slug}/join", post(join_room))
        .route("/rooms/{identifier}/messages", get(get_history))
        .route("/rooms/{identifier}/members", get(get_members))
        .route("/messages", post(send_message))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn join_room(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<JoinRoomPayload>,
) -> Result<Json<RoomResponse>, ApiError> {
    let room = state
        .directory
        .join(&slug, payload.user_id.into())
        .await?;

    Ok(Json(RoomResponse {
        id: Uuid::from(room.id),
        slug: room.slug.as_str().to_owned(),
        title: room.title,
        description: room.description,
    }))
}

async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<(StatusCode, Json<MessageEvent>), ApiError> {
    let attachment = decode_attachment(
        payload.attachment_data.as_deref(),
        payload.attachment_content_type,
    )?;

    let event = state
        .send_service
        .send(SendMessageRequest {
            room_identifier: payload.room,
            sender_id: payload.sender_id,
            text: payload.text,
            attachment,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

async fn get_history(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MessageEvent>>, ApiError> {
    let room = state.directory.resolve(&identifier).await?;
    let items = state
        .history_service
        .history(&room, query.page.unwrap_or(1))
        .await?;

    Ok(Json(items))
}

async fn get_members(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let room = state.directory.resolve(&identifier).await?;
    let members = state.directory.list_members(&room).await?;

    // 推送令牌是私密信息，不在API上暴露
    Ok(Json(
        members
            .into_iter()
            .map(|member| MemberResponse {
                id: Uuid::from(member.user_id),
                name: member.name,
            })
            .collect(),
    ))
}

fn decode_attachment(
    data: Option<&str>,
    content_type: Option<String>,
) -> Result<Option<AttachmentPayload>, ApiError> {
    let Some(data) = data else {
        return Ok(None);
    };

    let content_type = content_type
        .ok_or_else(|| ApiError::bad_request("attachment_content_type is required"))?;
    let bytes = data_encoding::BASE64
        .decode(data.as_bytes())
        .map_err(|_| ApiError::bad_request("attachment_data is not valid base64"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("attachment_data is empty"));
    }

    Ok(Some(AttachmentPayload {
        bytes,
        content_type,
    }))
}
