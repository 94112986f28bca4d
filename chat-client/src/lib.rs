// Chat client: HTTP API, live feed transport and the per-room sync agent

pub mod agent;
pub mod api;
pub mod backoff;
pub mod error;
pub mod feed;
pub mod timeline;

pub use agent::{ClientSyncAgent, SyncEvent, SyncState};
pub use api::ChatApi;
pub use backoff::ReconnectPolicy;
pub use error::ClientError;
pub use feed::{FeedConnection, FeedFrame};
pub use timeline::{Accepted, Timeline};
