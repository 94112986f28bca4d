pub mod message_commands;
pub mod room_commands;
