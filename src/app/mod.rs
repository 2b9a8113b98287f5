// NetSleuth - app/mod.rs
//
// Application layer: collection, refresh orchestration, scheduling, state.
// Dependencies: core layer.
// Must NOT depend on: platform specifics.

pub mod collector;
pub mod refresh;
pub mod scheduler;
pub mod state;
