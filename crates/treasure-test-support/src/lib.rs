//! Shared test doubles for the treasure hunt engine.

mod clock;
mod pacer;
mod rng;
mod store;

pub use clock::{FixedClock, SteppingClock};
pub use pacer::InstantPacer;
pub use rng::{FixedRng, SequenceRng};
pub use store::{FailingStore, RecordingStore, SlowStore};
