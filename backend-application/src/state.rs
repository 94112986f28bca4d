use std::sync::Arc;

use backend_domain::ports::{MessageRepository, RoomRepository};
use backend_domain::RuntimeConfig;

use crate::{BroadcastHub, Metrics};

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub rooms: Arc<dyn RoomRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub hub: Arc<BroadcastHub>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: RuntimeConfig,
        rooms: Arc<dyn RoomRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        let hub = Arc::new(BroadcastHub::new(config.feed_capacity));
        Self {
            config,
            rooms,
            messages,
            hub,
            metrics: Arc::new(Metrics::default()),
        }
    }
}
