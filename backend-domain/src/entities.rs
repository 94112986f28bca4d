// Domain entities and the fixed-field records exchanged at the boundary

pub mod config;
pub mod message;
pub mod room;

pub use config::*;
pub use message::*;
pub use room::*;
