//! `GET /matches/{match_id}/live` — WebSocket live delivery stream.
//!
//! Upgrades the HTTP connection and pushes [`BroadcastEnvelope`] JSON
//! frames for one match until the client disconnects or misses its
//! heartbeat deadline. No frames are replayed on connect; clients that
//! need history reconcile through the replay endpoint first.

use std::time::Duration;

use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tokio::time::Instant;
use tracing::{debug, error};

use omr_sdk::objects::WsCloseCode;

use crate::state::AppState;

/// Upgrade handler. The match is checked against reference data before
/// the upgrade so a bad identifier fails as a plain HTTP 404.
pub(super) async fn live_stream(
    State(state): State<AppState>,
    Path(match_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Response {
    match state.store.match_exists(match_id).await {
        Ok(true) => {}
        Ok(false) => return (StatusCode::NOT_FOUND, "match not found").into_response(),
        Err(e) => {
            error!(error = %e, match_id, "WS: failed to check match");
            return (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response();
        }
    }
    ws.on_upgrade(move |socket| handle_live(socket, state, match_id))
        .into_response()
}

/// Background task that drives a single live connection.
///
/// Connection lifecycle: registered with the hub on entry; any exit path
/// — peer close, send failure, socket error, heartbeat timeout — funnels
/// through the same unsubscribe at the bottom, so the membership set
/// never retains a dead connection.
async fn handle_live(mut socket: WebSocket, state: AppState, match_id: i64) {
    let mut conn = state.hub.subscribe(match_id).await;
    debug!(conn_id = conn.conn_id, match_id, "live connection registered");

    let idle_timeout = Duration::from_secs(state.delivery.idle_timeout_secs);
    let mut heartbeat =
        tokio::time::interval(Duration::from_secs(state.delivery.heartbeat_secs.max(1)));
    let mut last_seen = Instant::now();
    let mut close_frame: Option<CloseFrame> = None;

    loop {
        tokio::select! {
            maybe = conn.outbox.recv() => {
                match maybe {
                    Some(envelope) => {
                        if send_json(&mut socket, &envelope).await.is_err() {
                            break;
                        }
                    }
                    // Hub side went away; nothing more will arrive.
                    None => break,
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Pongs and any stray client frames count as liveness.
                        last_seen = Instant::now();
                    }
                    Some(Err(_)) => break,
                }
            }

            _ = heartbeat.tick() => {
                if last_seen.elapsed() > idle_timeout {
                    close_frame = Some(CloseFrame {
                        code: WsCloseCode::IDLE_TIMEOUT,
                        reason: "idle timeout".into(),
                    });
                    break;
                }
                if socket.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    // Unregister before the close handshake: broadcasts stop targeting
    // this connection the moment it leaves the membership set.
    state.hub.unsubscribe(conn.match_id, conn.conn_id).await;
    debug!(conn_id = conn.conn_id, match_id, "live connection closed");

    let _ = socket.send(Message::Close(close_frame)).await;
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
