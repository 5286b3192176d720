use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};

use crate::error::AppError;
use crate::state::AppState;
use crate::tracking::view::{SessionPhase, TrackingView};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    let updates = state
        .sessions
        .get(&order_id)
        .map(|session| session.watch())
        .ok_or_else(|| AppError::NotFound(format!("no tracking session for order {order_id}")))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, order_id, updates)))
}

async fn handle_socket(socket: WebSocket, order_id: u64, updates: watch::Receiver<TrackingView>) {
    let (mut sender, mut receiver) = socket.split();

    info!(order_id, "tracking viewer connected");

    let mut send_task = tokio::spawn(async move {
        let mut views = WatchStream::new(updates);

        while let Some(view) = views.next().await {
            let json = match serde_json::to_string(&view) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize tracking view for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                return;
            }
            if view.phase == SessionPhase::Cancelled {
                break;
            }
        }

        let _ = sender.close().await;
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!(order_id, "tracking viewer disconnected");
}
