pub mod feed_queries;
pub mod message_queries;
pub mod room_queries;
