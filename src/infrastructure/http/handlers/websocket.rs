//! WebSocket Handler - 书籍事件推送

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::infrastructure::events::BookEvent;
use crate::infrastructure::http::state::AppState;

/// 全局 WebSocket（所有书籍的事件）
pub async fn global_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let event_rx = state.event_publisher.subscribe_global();
        tracing::info!("Global WebSocket connected");
        forward_events(socket, event_rx).await;
        tracing::info!("Global WebSocket disconnected");
    })
}

/// 单本书的 WebSocket
pub async fn book_websocket_handler(
    ws: WebSocketUpgrade,
    Path(book_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let event_rx = state.event_publisher.subscribe_book(book_id);
        tracing::info!(book_id = %book_id, "Book WebSocket connected");

        forward_events(socket, event_rx).await;

        state.event_publisher.release_book(book_id);
        tracing::info!(book_id = %book_id, "Book WebSocket disconnected");
    })
}

/// 把广播事件转发给客户端，直到任一方向结束
async fn forward_events(socket: WebSocket, mut event_rx: broadcast::Receiver<BookEvent>) {
    let (mut sender, mut receiver) = socket.split();

    let mut forward_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "WebSocket subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    // 接收客户端消息（心跳）
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::debug!("WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }
}
