//! CLI command implementations.

mod display;

pub mod blast;
pub mod ingest;
pub mod risks;
pub mod stats;
pub mod topo;
