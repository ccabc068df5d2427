//! Domain model: scenes, game state, stories, notifications and the session
//! state machine.

pub mod events;
pub mod scenes;
pub mod session;
pub mod state;
pub mod stories;
