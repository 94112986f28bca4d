use axum::routing::{get, post};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{chat_handlers, feed_handlers, ops_handlers, room_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/room",
            get(room_handlers::list_rooms)
                .post(room_handlers::create_room)
                .put(room_handlers::join_room)
                .delete(room_handlers::delete_room),
        )
        .route("/chat", get(chat_handlers::get_history))
        .route("/chat/send", post(chat_handlers::send_message))
        .route("/chat/subscribe", get(feed_handlers::subscribe))
        .route("/ops/health/live", get(ops_handlers::health_live))
        .route("/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
