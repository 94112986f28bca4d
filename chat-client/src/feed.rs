use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use backend_domain::{ChatMessage, RoomId};

use crate::error::ClientError;

const FRAME_BUFFER: usize = 64;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedFrame {
    Message(ChatMessage),
    /// The server closed the feed. `resubscribe` is set when it dropped
    /// messages for this feed and expects the client to reconnect.
    Ended { resubscribe: bool, reason: String },
    Failed(String),
}

/// One open live feed. A spawned reader task forwards frames until the
/// socket ends or the connection is closed.
pub struct FeedConnection {
    room_id: RoomId,
    frames: mpsc::Receiver<FeedFrame>,
    reader: JoinHandle<()>,
}

impl FeedConnection {
    pub async fn connect(url: &str, room_id: RoomId) -> Result<Self, ClientError> {
        let request = url.into_client_request()?;
        let socket = match tokio_tungstenite::connect_async(request).await {
            Ok((socket, _)) => socket,
            Err(WsError::Http(response)) if response.status().as_u16() == 404 => {
                return Err(ClientError::RoomNotFound(room_id));
            }
            Err(err) => return Err(err.into()),
        };
        debug!(room_id = %room_id, "live feed connected");

        let (tx, frames) = mpsc::channel(FRAME_BUFFER);
        let reader = tokio::spawn(read_frames(socket, tx, room_id));
        Ok(Self {
            room_id,
            frames,
            reader,
        })
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub async fn next(&mut self) -> FeedFrame {
        match self.frames.recv().await {
            Some(frame) => frame,
            None => FeedFrame::Failed("feed reader stopped".to_string()),
        }
    }

    pub fn close(&mut self) {
        self.reader.abort();
        self.frames.close();
    }
}

impl Drop for FeedConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_frames(mut socket: Socket, tx: mpsc::Sender<FeedFrame>, room_id: RoomId) {
    let last = loop {
        let frame = match socket.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ChatMessage>(&text) {
                Ok(message) if message.room_id == room_id => FeedFrame::Message(message),
                Ok(message) => {
                    warn!(room_id = %room_id, other = %message.room_id, "dropping message for another room");
                    continue;
                }
                Err(err) => {
                    warn!("unreadable feed frame: {}", err);
                    continue;
                }
            },
            Some(Ok(Message::Ping(bytes))) => {
                if let Err(err) = socket.send(Message::Pong(bytes)).await {
                    break FeedFrame::Failed(err.to_string());
                }
                continue;
            }
            Some(Ok(Message::Close(frame))) => {
                let (resubscribe, reason) = match frame {
                    Some(frame) => (frame.code == CloseCode::Again, frame.reason.to_string()),
                    None => (false, String::new()),
                };
                break FeedFrame::Ended {
                    resubscribe,
                    reason,
                };
            }
            Some(Ok(_)) => continue,
            Some(Err(err)) => break FeedFrame::Failed(err.to_string()),
            None => break FeedFrame::Failed("feed stream ended".to_string()),
        };
        if tx.send(frame).await.is_err() {
            return;
        }
    };
    let _ = tx.send(last).await;
}
