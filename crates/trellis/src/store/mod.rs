//! Graph store port: the abstract persistence contract for the knowledge
//! graph.
//!
//! This module defines the [`GraphStore`] trait that all backends implement.
//! The write pipeline, blast-radius analyzer, and branch overlay talk only to
//! this trait; the transport and query language behind it are out of scope
//! for the graph core.
//!
//! # Method Categories
//!
//! - **Writes**: `upsert_entity`, `bulk_upsert_entities`, `upsert_edge`,
//!   `bulk_upsert_edges`
//! - **Reads**: `get_entity`, `get_entities_by_file`, `get_callers_of`,
//!   `get_callees_of`, `list_entity_ids`
//! - **Deletes**: `delete_entity`, `delete_branch_data`, `delete_repo_data`
//! - **Health**: `health_check`
//!
//! # Keying
//!
//! Every operation is scoped by tenant first ([`OrgId`]), then repository
//! ([`RepoId`]). Edge endpoints are partition-qualified strings
//! (`"<partition>/<id>"`); the entity-kind-to-partition mapping is the closed
//! table on [`crate::EntityKind::partition`].
//!
//! # Error Semantics
//!
//! Backend failures propagate uncaught as [`Error::Store`](crate::Error);
//! this core performs no retries. Missing records are `None`/empty results,
//! never errors.

mod memory;

pub use memory::MemoryGraphStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{BranchCleanup, Edge, Entity, OrgId, RepoId};

/// Abstract persistence contract for graph entities and edges.
///
/// Implementations must be safe to share across tasks (`Send + Sync`); all
/// methods take `&self` and synchronize internally. Writers racing on the
/// same id resolve last-write-wins; callers serialize whole-pipeline runs
/// per (org, repo) themselves.
#[async_trait]
pub trait GraphStore: Send + Sync {
    // === Writes ===

    /// Insert or overwrite a single entity under its own (org, repo) scope.
    ///
    /// The storage key is the entity's `id` field, which may be a canonical
    /// content-addressed id or a branch-overlay shadow key.
    async fn upsert_entity(&self, entity: Entity) -> Result<()>;

    /// Insert or overwrite a batch of entities, returning the number written.
    ///
    /// An empty batch performs no store work and returns 0.
    async fn bulk_upsert_entities(&self, entities: Vec<Entity>) -> Result<usize>;

    /// Insert or overwrite a single edge under its own (org, repo) scope.
    async fn upsert_edge(&self, edge: Edge) -> Result<()>;

    /// Insert or overwrite a batch of edges, returning the number written.
    ///
    /// An empty batch performs no store work and returns 0.
    async fn bulk_upsert_edges(&self, edges: Vec<Edge>) -> Result<usize>;

    // === Reads ===

    /// Fetch one entity by storage key.
    ///
    /// Returns `None` when the key does not exist (not an error).
    async fn get_entity(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        entity_id: &str,
    ) -> Result<Option<Entity>>;

    /// Fetch all entities extracted from one source file, ordered by id.
    async fn get_entities_by_file(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        file_path: &str,
    ) -> Result<Vec<Entity>>;

    /// Fetch all edges pointing *at* an entity (inbound, any kind), ordered
    /// deterministically.
    ///
    /// Callers filter by [`EdgeKind`](crate::EdgeKind) themselves; the
    /// blast-radius analyzer counts `calls` edges here.
    async fn get_callers_of(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        entity_id: &str,
    ) -> Result<Vec<Edge>>;

    /// Fetch all edges leaving an entity (outbound, any kind), ordered
    /// deterministically.
    async fn get_callees_of(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        entity_id: &str,
    ) -> Result<Vec<Edge>>;

    /// List every entity storage key in a repository, sorted.
    ///
    /// Includes branch-overlay shadow keys; the orphan sweep filters those
    /// out itself.
    async fn list_entity_ids(&self, org_id: &OrgId, repo_id: &RepoId) -> Result<Vec<String>>;

    // === Deletes ===

    /// Delete one entity by storage key.
    ///
    /// Returns `true` when a record was removed. Edges referencing the
    /// entity are not cascaded; dangling endpoints are tolerated by every
    /// consumer of this contract.
    async fn delete_entity(&self, org_id: &OrgId, repo_id: &RepoId, entity_id: &str)
        -> Result<bool>;

    /// Delete all shadow-keyed entities and edges for one branch, returning
    /// the removal counts.
    async fn delete_branch_data(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        branch: &str,
    ) -> Result<BranchCleanup>;

    /// Delete everything stored for a repository, returning the total number
    /// of records (entities plus edges) removed.
    async fn delete_repo_data(&self, org_id: &OrgId, repo_id: &RepoId) -> Result<u64>;

    // === Health ===

    /// Verify the backend is reachable and serving.
    async fn health_check(&self) -> Result<()>;
}
