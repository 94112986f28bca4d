use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use backend_domain::{ChatMessage, NewMessage, Room, RoomId};

use crate::error::ClientError;

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Thin typed wrapper over the chat server's HTTP routes.
#[derive(Clone)]
pub struct ChatApi {
    base_url: String,
    client: Client,
}

impl ChatApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidInput(format!(
                "server url must start with http:// or https://, got {}",
                base_url
            )));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// WebSocket url of a room's live feed.
    pub fn feed_url(&self, room_id: RoomId) -> String {
        let ws_base = match self.base_url.strip_prefix("https://") {
            Some(rest) => format!("wss://{}", rest),
            None => format!("ws://{}", self.base_url.trim_start_matches("http://")),
        };
        format!("{}/chat/subscribe?room_id={}", ws_base, room_id)
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>, ClientError> {
        let response = self
            .client
            .get(format!("{}/room", self.base_url))
            .send()
            .await?;
        Ok(check(response, None).await?.json().await?)
    }

    pub async fn create_room(&self, participants: &[String]) -> Result<Room, ClientError> {
        let response = self
            .client
            .post(format!("{}/room", self.base_url))
            .json(&json!({ "participants": participants }))
            .send()
            .await?;
        let room: Room = check(response, None).await?.json().await?;
        debug!(room_id = %room.id, "room created");
        Ok(room)
    }

    pub async fn join_room(&self, room_id: RoomId, name: &str) -> Result<Room, ClientError> {
        let response = self
            .client
            .put(format!("{}/room", self.base_url))
            .json(&json!({ "id": room_id, "participants": [name] }))
            .send()
            .await?;
        Ok(check(response, Some(room_id)).await?.json().await?)
    }

    pub async fn delete_room(&self, room_id: RoomId) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(format!("{}/room", self.base_url))
            .query(&[("id", room_id.get())])
            .send()
            .await?;
        check(response, Some(room_id)).await?;
        Ok(())
    }

    /// Ordered history of a room; `limit` keeps only the newest entries.
    pub async fn history(
        &self,
        room_id: RoomId,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        let mut request = self
            .client
            .get(format!("{}/chat", self.base_url))
            .query(&[("room_id", room_id.get())]);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        let response = request.send().await?;
        Ok(check(response, Some(room_id)).await?.json().await?)
    }

    pub async fn send(
        &self,
        room_id: RoomId,
        sender: &str,
        message: &str,
    ) -> Result<ChatMessage, ClientError> {
        let payload = NewMessage {
            sender: sender.to_string(),
            message: message.to_string(),
            room_id,
        };
        let response = self
            .client
            .post(format!("{}/chat/send", self.base_url))
            .json(&payload)
            .send()
            .await?;
        Ok(check(response, Some(room_id)).await?.json().await?)
    }
}

async fn check(response: Response, room_id: Option<RoomId>) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };
    Err(match (status, room_id) {
        (StatusCode::NOT_FOUND, Some(room_id)) => ClientError::RoomNotFound(room_id),
        (StatusCode::BAD_REQUEST, _) => ClientError::InvalidInput(detail),
        _ => ClientError::Transport(format!("server responded {}: {}", status, detail)),
    })
}
