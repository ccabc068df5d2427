//! Treasure Game — scenes, stories and the save-backed game controller.
//!
//! The domain layer holds the scene registry, the story library and the
//! synchronous session state machine. The application layer wires them to a
//! clock, an RNG, a pacer, a save slot and an observer.

pub mod application;
pub mod config;
pub mod domain;
