use std::borrow::Cow;

use axum::extract::rejection::QueryRejection;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use backend_application::ops::{FeedEvent, LiveFeed};
use backend_application::queries::feed_queries;
use backend_application::AppState;
use backend_domain::FeedQuery;

use crate::error::HttpError;

/// `GET /chat/subscribe?room_id=N`, upgraded to a WebSocket.
///
/// The feed is registered before the upgrade is answered, so anything sent
/// after the client sees `101 Switching Protocols` is delivered. Unknown
/// rooms are refused with `404` instead of an upgrade.
pub async fn subscribe(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    query: Result<Query<FeedQuery>, QueryRejection>,
) -> Result<Response, HttpError> {
    let Query(query) = query?;
    let feed = feed_queries::open_live_feed(&state, query.room_id).await?;
    let metrics = state.metrics.clone();
    Ok(ws
        .on_failed_upgrade(move |err| {
            warn!("live feed upgrade failed: {}", err);
            metrics.record_feed_closed();
        })
        .on_upgrade(move |socket| stream_feed(socket, feed, state))
        .into_response())
}

enum FeedOutcome {
    ClientGone,
    RoomClosed,
    Lagged(u64),
}

async fn stream_feed(mut socket: WebSocket, mut feed: LiveFeed, state: AppState) {
    let room_id = feed.room_id();
    let feed_id = feed.id();
    debug!(room_id = %room_id, feed_id = %feed_id, "live feed connected");

    let outcome = pump(&mut socket, &mut feed).await;
    feed.close();
    state.metrics.record_feed_closed();

    let close = match outcome {
        FeedOutcome::ClientGone => None,
        FeedOutcome::RoomClosed => Some(CloseFrame {
            code: close_code::NORMAL,
            reason: Cow::from("room closed"),
        }),
        FeedOutcome::Lagged(skipped) => {
            warn!(room_id = %room_id, feed_id = %feed_id, skipped, "live feed lagged, closing");
            state.metrics.record_feed_lagged();
            Some(CloseFrame {
                code: close_code::AGAIN,
                reason: Cow::from("feed lagged, resubscribe"),
            })
        }
    };
    if let Some(frame) = close {
        let _ = socket.send(Message::Close(Some(frame))).await;
    }
    debug!(room_id = %room_id, feed_id = %feed_id, "live feed disconnected");
}

async fn pump(socket: &mut WebSocket, feed: &mut LiveFeed) -> FeedOutcome {
    loop {
        tokio::select! {
            event = feed.recv() => {
                match event {
                    Some(FeedEvent::Message(message)) => {
                        let json = match serde_json::to_string(&message) {
                            Ok(json) => json,
                            Err(err) => {
                                warn!("failed to serialize chat message: {}", err);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json)).await.is_err() {
                            return FeedOutcome::ClientGone;
                        }
                    }
                    // lagged feeds are closed so the client reconciles from history
                    Some(FeedEvent::Lagged(skipped)) => return FeedOutcome::Lagged(skipped),
                    None => return FeedOutcome::RoomClosed,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => return FeedOutcome::ClientGone,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            return FeedOutcome::ClientGone;
                        }
                    }
                    Some(Err(err)) => {
                        debug!("live feed socket error: {}", err);
                        return FeedOutcome::ClientGone;
                    }
                    // the feed is push-only
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
