use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tabsync_core::error::CoreError;
use tabsync_db::models::session::SessionSnapshot;

use crate::engine::SessionService;
use crate::error::{AppError, AppResult};
use crate::extract::{PathParams, WsUpgrade};
use crate::state::AppState;
use crate::ws::heartbeat::heartbeat_interval;

/// GET /api/v1/ws/sessions/{code}
///
/// Rejects unknown codes with 404 before upgrading, then a request that is
/// not a WebSocket handshake with 400. After the upgrade the connection
/// joins the session's subscriber set and receives the current snapshot
/// followed by every later one.
pub async fn session_ws_handler(
    State(state): State<AppState>,
    PathParams(code): PathParams<String>,
    upgrade: Result<WsUpgrade, AppError>,
) -> AppResult<Response> {
    if !state.sessions.exists(&code).await? {
        return Err(CoreError::session_not_found(code).into());
    }
    let WsUpgrade(ws) = upgrade?;

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, code, state.sessions))
        .into_response())
}

/// Manage a single WebSocket connection after upgrade.
///
///   1. Joins the hub and takes the current snapshot under the session lock.
///   2. Spawns a sender task: initial snapshot, then hub publishes and
///      heartbeat pings.
///   3. Spawns a receiver task that only watches for Close or errors.
///   4. When either task ends, aborts the other and leaves the hub once.
async fn handle_socket(mut socket: WebSocket, code: String, sessions: Arc<SessionService>) {
    let conn_id = uuid::Uuid::new_v4().to_string();

    let (snapshot, mut rx) = match sessions.subscribe(&code, &conn_id).await {
        Ok(subscription) => subscription,
        Err(e) => {
            tracing::warn!(code = %code, conn_id = %conn_id, error = %e, "WebSocket subscribe failed");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    tracing::info!(code = %code, conn_id = %conn_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    // Sender task: snapshots from the hub queue, plus heartbeat pings.
    let sender_conn_id = conn_id.clone();
    let mut send_task = tokio::spawn(async move {
        if send_snapshot(&mut sink, &snapshot).await.is_err() {
            return;
        }

        let mut heartbeat = heartbeat_interval();
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(snapshot) => {
                        if send_snapshot(&mut sink, &snapshot).await.is_err() {
                            tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                            break;
                        }
                    }
                    None => {
                        // Hub dropped our queue (shutdown).
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                },
                _ = heartbeat.tick() => {
                    if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                        tracing::debug!(conn_id = %sender_conn_id, "Heartbeat ping failed");
                        break;
                    }
                }
            }
        }
    });

    // Receiver task: inbound frames are ignored apart from Close.
    let receiver_conn_id = conn_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = stream.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Ok(Message::Pong(_)) => {
                    tracing::trace!(conn_id = %receiver_conn_id, "Pong received");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(conn_id = %receiver_conn_id, error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    sessions.unsubscribe(&code, &conn_id).await;
    tracing::info!(code = %code, conn_id = %conn_id, "WebSocket disconnected");
}

/// Serialize a snapshot and send it as one text frame.
async fn send_snapshot(
    sink: &mut SplitSink<WebSocket, Message>,
    snapshot: &SessionSnapshot,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(snapshot) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(code = %snapshot.code(), error = %e, "Snapshot serialization failed");
            return Err(axum::Error::new(e));
        }
    };
    sink.send(Message::Text(text.into())).await
}
