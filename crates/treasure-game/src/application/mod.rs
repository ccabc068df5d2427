//! Application layer: persistence adapter, controller and read-only views.

pub mod controller;
pub mod query_handlers;
pub mod save_slot;
