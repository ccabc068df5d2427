//! Treasure Core — shared abstractions for the treasure hunt engine.
//!
//! This crate defines the seams every other crate depends on: time, pacing,
//! randomness, cancellation, key-value persistence and the error taxonomy.
//! It contains no game rules and no storage backends.

pub mod cancel;
pub mod error;
pub mod rng;
pub mod store;
pub mod time;
