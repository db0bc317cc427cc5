//! # Trellis: Multi-Tenant Code Knowledge Graph Engine
//!
//! Trellis turns raw entity/edge records produced by an upstream extraction
//! step into a content-addressed knowledge graph, then runs structural
//! analyses over it: dependency leveling, change-impact ("blast radius")
//! tracing, and risk detection.
//!
//! ## Design Philosophy
//!
//! - **Content-addressed** - ids derive from entity content, so re-writes are idempotent by construction
//! - **Store-agnostic** - all persistence goes through the async [`GraphStore`] port
//! - **Pure analyses** - topo sort and risk detection run over plain in-memory snapshots
//! - **Copy-on-write branches** - non-default branches shadow the canonical graph, never mutate it
//! - **Facts, not judgments** - reports degrees and cycles; turning findings into prose is the consumer's job
//!
//! ## Quick Start
//!
//! ```no_run
//! use trellis::{GraphSnapshot, MemoryGraphStore, write_entities_to_graph};
//!
//! # async fn run() -> trellis::Result<()> {
//! let store = MemoryGraphStore::new();
//! let snapshot = GraphSnapshot::load("snapshot.json").await?;
//! let (org, repo) = snapshot.scope();
//!
//! let summary = write_entities_to_graph(
//!     &store,
//!     &org,
//!     &repo,
//!     snapshot.entities,
//!     snapshot.edges,
//!     None,
//! )
//! .await?;
//! println!(
//!     "wrote {} entities, {} edges",
//!     summary.entities_written, summary.edges_written
//! );
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod hash;
pub mod impact;
pub mod overlay;
pub mod pipeline;
pub mod risk;
pub mod snapshot;
pub mod store;
pub mod topo;
pub mod types;

pub use error::{Error, Result};
pub use hash::{edge_hash, entity_hash, file_entity_hash};
pub use impact::{MAX_UPSTREAM_BOUNDARIES, build_blast_radius_summary};
pub use overlay::{BranchOverlay, BranchPolicy, cleanup_branch, resolve_entity};
pub use pipeline::{
    materialize_batch, materialize_records, sweep_orphans, write_entities_to_graph,
};
pub use risk::{
    DEFAULT_MAX_CYCLES, RiskConfig, analyze_risks, detect_cycles, detect_dead_code,
    detect_degree_risks,
};
pub use snapshot::GraphSnapshot;
pub use store::{GraphStore, MemoryGraphStore};
pub use topo::topological_sort_entities;
pub use types::{
    BlastRadiusEntry, BoundaryHit, BranchCleanup, CycleFinding, DeadCodeFinding, DegreeDirection,
    DegreeFinding, Edge, EdgeKind, EdgeRecord, Entity, EntityKind, EntityRecord,
    GraphWriteSummary, OrgId, Partition, RepoId, RiskReport, Severity,
};
