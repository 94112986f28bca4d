use std::sync::Arc;

use anyhow::Result;

use backend_application::AppState;
use backend_infrastructure::{AppConfig, InMemoryMessageStore, InMemoryRoomRegistry};

pub struct AppContext {
    pub config: AppConfig,
    pub state: AppState,
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        Ok(Self::from_config(config))
    }

    /// Wires the in-memory registry and message store into a fresh state.
    pub fn from_config(config: AppConfig) -> Self {
        let runtime_config = config.to_runtime_config();
        let rooms = Arc::new(InMemoryRoomRegistry::new());
        let messages = Arc::new(InMemoryMessageStore::new(runtime_config.history_limit));
        let state = AppState::new(runtime_config, rooms, messages);
        Self { config, state }
    }
}
