pub mod message_store;
pub mod room_registry;

pub use message_store::*;
pub use room_registry::*;
