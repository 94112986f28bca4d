pub mod chat_handlers;
pub mod feed_handlers;
pub mod ops_handlers;
pub mod room_handlers;

pub use chat_handlers::*;
pub use feed_handlers::*;
pub use ops_handlers::*;
pub use room_handlers::*;
