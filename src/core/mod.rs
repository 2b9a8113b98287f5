// NetSleuth - core/mod.rs
//
// Core business logic layer: the event pipeline and its rendering.
// Dependencies: standard library, regex, serde, chrono, csv.
// Must NOT depend on: app or platform.

pub mod classifier;
pub mod dedup;
pub mod export;
pub mod filter;
pub mod model;
pub mod paginate;
pub mod parser;
pub mod pipeline;
pub mod sort;
pub mod splitter;
