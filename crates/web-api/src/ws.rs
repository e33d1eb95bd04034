//! WebSocket 会话
//!
//! 每条连接注册为广播中心的一个会话。连接断开（无论客户端是否配合）
//! 都会走到 `drop_session` 清理，在线集合不会残留死连接。

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use application::SessionId;
use domain::UserId;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    user_id: Uuid,
    /// 可选：连接时直接订阅的房间（主键或slug）
    room: Option<String>,
}

/// 客户端通过文本帧下发的订阅指令
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ClientCommand {
    Subscribe { room: String },
    Unsubscribe { room: String },
}

/// WebSocket 写操作命令：统一经由一个 mpsc 通道串行化对 sender 的访问
#[derive(Debug)]
enum WsCommand {
    SendText(String),
    SendPong(Vec<u8>),
}

pub async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query))
}

async fn handle_socket(socket: WebSocket, state: AppState, query: WsQuery) {
    let user_id = UserId::from(query.user_id);
    let (session_id, mut events) = state.hub.register(user_id);

    tracing::info!(user_id = %user_id, session_id = %session_id, "WebSocket连接已建立");

    if let Some(room) = query.room {
        subscribe_room(&state, session_id, &room).await;
    }

    let (mut sender, mut incoming) = socket.split();
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<WsCommand>(32);

    // 发送任务：广播事件和协议回包都经过同一个命令通道
    let send_task = {
        let cmd_tx_for_events = cmd_tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(cmd) = cmd_rx.recv() => {
                        let result = match cmd {
                            WsCommand::SendText(text) => {
                                sender.send(WsMessage::Text(text.into())).await
                            }
                            WsCommand::SendPong(data) => {
                                sender.send(WsMessage::Pong(data.into())).await
                            }
                        };
                        if result.is_err() {
                            break;
                        }
                    }
                    event = events.recv() => {
                        let Some(event) = event else { break };
                        let payload = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(err) => {
                                tracing::warn!(error = %err, "failed to serialize websocket payload");
                                continue;
                            }
                        };
                        if cmd_tx_for_events.send(WsCommand::SendText(payload)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        })
    };

    // 接收任务：处理客户端的订阅指令和心跳
    let recv_task = {
        let state = state.clone();
        tokio::spawn(async move {
            while let Some(Ok(message)) = incoming.next().await {
                match message {
                    WsMessage::Close(_) => break,
                    WsMessage::Ping(data) => {
                        if cmd_tx.send(WsCommand::SendPong(data.to_vec())).await.is_err() {
                            break;
                        }
                    }
                    WsMessage::Pong(_) => {}
                    WsMessage::Text(text) => {
                        handle_command(&state, session_id, text.as_str()).await;
                    }
                    WsMessage::Binary(_) => {
                        tracing::debug!("ignoring binary frame");
                    }
                }
            }
        })
    };

    // 任一任务结束即视为连接断开
    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    // 无条件清理：把会话从所有房间移除
    state.hub.drop_session(session_id);
    tracing::info!(user_id = %user_id, session_id = %session_id, "WebSocket连接已断开，会话已清理");
}

async fn handle_command(state: &AppState, session_id: SessionId, raw: &str) {
    let command = match serde_json::from_str::<ClientCommand>(raw) {
        Ok(command) => command,
        Err(err) => {
            tracing::debug!(error = %err, "unrecognized websocket command");
            return;
        }
    };

    match command {
        ClientCommand::Subscribe { room } => {
            subscribe_room(state, session_id, &room).await;
        }
        ClientCommand::Unsubscribe { room } => {
            if let Ok(room) = state.directory.resolve(&room).await {
                state.hub.unsubscribe(session_id, room.id);
            }
        }
    }
}

async fn subscribe_room(state: &AppState, session_id: SessionId, identifier: &str) {
    match state.directory.resolve(identifier).await {
        Ok(room) => {
            state.hub.subscribe(session_id, room.id);
            tracing::debug!(session_id = %session_id, room_id = %room.id, "会话订阅房间");
        }
        Err(err) => {
            tracing::warn!(identifier, error = %err, "订阅失败：房间无法解析");
        }
    }
}
