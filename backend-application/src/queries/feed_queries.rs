use tracing::debug;

use crate::ops::LiveFeed;
use crate::{AppError, AppState};
use backend_domain::RoomId;

pub async fn open_live_feed(state: &AppState, room_id: RoomId) -> Result<LiveFeed, AppError> {
    let feed = state.hub.subscribe(room_id).await?;
    state.metrics.record_feed_opened();
    debug!(room_id = %room_id, feed_id = %feed.id(), "live feed opened");
    Ok(feed)
}
