//! Branch overlay: copy-on-write shadow graph for non-default branches.
//!
//! Indexing a non-default branch must never corrupt the canonical
//! (default-branch) graph, so branch-scoped writes land under a
//! deterministically prefixed storage key instead of overwriting the
//! canonical record:
//!
//! ```text
//! branch:<branch>:<originalId>
//! ```
//!
//! Reads resolve shadow-first with canonical fallback, which gives each
//! branch a virtual full graph while storing only its deltas. Cleanup (on
//! merge or branch deletion) removes every shadow-tagged record for the
//! branch and restores the canonical graph as sole source of truth.
//!
//! # Key-scheme safety
//!
//! Canonical ids are 16 lowercase hex characters and git ref names cannot
//! contain `:`, so a shadow key can never collide with a canonical id and
//! the `branch:` prefix check is unambiguous.
//!
//! # Pieces
//!
//! - [`shadow_key`] / [`shadow_prefix`] / [`is_shadow_key`]: key scheme.
//! - [`BranchPolicy`]: allow-list gating of which branches may be indexed.
//! - [`BranchOverlay`]: a [`GraphStore`] decorator that rewrites keys on
//!   write and virtualizes point/file/adjacency reads for one branch.
//! - [`resolve_entity`] / [`cleanup_branch`]: policy-aware lookup and bulk
//!   shadow removal.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::GraphStore;
use crate::types::{BranchCleanup, Edge, Entity, OrgId, RepoId};

/// Key prefix marking any branch-overlay record, regardless of branch.
const SHADOW_MARKER: &str = "branch:";

/// The storage-key prefix for one branch's shadow records.
#[must_use]
pub fn shadow_prefix(branch: &str) -> String {
    format!("{SHADOW_MARKER}{branch}:")
}

/// Compose the shadow storage key for an id on a branch.
///
/// Ids that are already shadow-keyed pass through unchanged, so repeated
/// overlay application cannot nest prefixes.
#[must_use]
pub fn shadow_key(branch: &str, id: &str) -> String {
    if is_shadow_key(id) {
        return id.to_string();
    }
    format!("{}{id}", shadow_prefix(branch))
}

/// Whether a storage key belongs to some branch overlay.
#[must_use]
pub fn is_shadow_key(key: &str) -> bool {
    key.starts_with(SHADOW_MARKER)
}

// ============================================================================
// Branch policy
// ============================================================================

/// Allow-list policy gating which branches may be indexed.
///
/// The default branch is always eligible. Any other branch must match one of
/// `allow_patterns`: an exact branch name, or a trailing-`*` prefix glob
/// such as `release/*`.
///
/// Loaded from YAML configuration:
///
/// ```yaml
/// default_branch: main
/// allow_patterns:
///   - release/*
///   - hotfix/*
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchPolicy {
    /// The canonical branch; always eligible, never shadow-keyed
    pub default_branch: String,
    /// Exact names or trailing-`*` prefix globs for additional branches
    pub allow_patterns: Vec<String>,
}

impl Default for BranchPolicy {
    fn default() -> Self {
        Self {
            default_branch: "main".to_string(),
            allow_patterns: Vec::new(),
        }
    }
}

impl BranchPolicy {
    /// Whether `branch` is the canonical default branch.
    #[must_use]
    pub fn is_default(&self, branch: &str) -> bool {
        branch == self.default_branch
    }

    /// Whether `branch` may be indexed at all.
    #[must_use]
    pub fn is_eligible(&self, branch: &str) -> bool {
        self.is_default(branch)
            || self
                .allow_patterns
                .iter()
                .any(|pattern| Self::pattern_matches(pattern, branch))
    }

    fn pattern_matches(pattern: &str, branch: &str) -> bool {
        match pattern.strip_suffix('*') {
            Some(prefix) => branch.starts_with(prefix),
            None => branch == pattern,
        }
    }

    /// Parse a policy from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the YAML does not describe a policy.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::config(format!("invalid branch policy: {e}")))
    }

    /// Load a policy from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::Config`] when its contents do not describe a policy.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

// ============================================================================
// Resolution and cleanup
// ============================================================================

/// Resolve an entity id under a branch: shadow key first, canonical
/// fallback.
///
/// For the default branch this is a plain canonical lookup.
///
/// # Errors
///
/// Propagates store failures unchanged.
pub async fn resolve_entity(
    store: &dyn GraphStore,
    policy: &BranchPolicy,
    org_id: &OrgId,
    repo_id: &RepoId,
    entity_id: &str,
    branch: &str,
) -> Result<Option<Entity>> {
    if !policy.is_default(branch) {
        let key = shadow_key(branch, entity_id);
        if let Some(mut entity) = store.get_entity(org_id, repo_id, &key).await? {
            entity.id = entity_id.to_string();
            return Ok(Some(entity));
        }
    }
    store.get_entity(org_id, repo_id, entity_id).await
}

/// Delete every shadow-tagged entity and edge for a branch.
///
/// Reports how many records were removed; removing an unknown branch is a
/// no-op, not an error.
///
/// # Errors
///
/// Propagates store failures unchanged.
pub async fn cleanup_branch(
    store: &dyn GraphStore,
    org_id: &OrgId,
    repo_id: &RepoId,
    branch: &str,
) -> Result<BranchCleanup> {
    let cleanup = store.delete_branch_data(org_id, repo_id, branch).await?;
    info!(
        org = %org_id,
        repo = %repo_id,
        branch,
        removed = cleanup.total(),
        "branch overlay cleanup"
    );
    Ok(cleanup)
}

// ============================================================================
// Store decorator
// ============================================================================

/// A [`GraphStore`] decorator scoping reads and writes to one non-default
/// branch.
///
/// Writes land under shadow keys (entity and edge ids are prefixed; edge
/// *endpoints* keep canonical ids, since they name logical entities).
/// Point, file, and adjacency reads present the branch's virtual graph:
/// this branch's shadow records override canonical ones, other branches'
/// shadow records are invisible, and returned ids are canonical.
///
/// Maintenance operations (`list_entity_ids`, `delete_branch_data`,
/// `delete_repo_data`) pass through to the raw store unvirtualized; they
/// operate on physical storage keys.
///
/// `delete_entity` removes only this branch's shadow record, never the
/// canonical entity: the overlay is copy-on-write in both directions.
#[derive(Debug, Clone)]
pub struct BranchOverlay<S> {
    inner: S,
    branch: String,
    prefix: String,
}

impl<S: GraphStore> BranchOverlay<S> {
    /// Wrap a store for writes and reads scoped to `branch`.
    pub fn new(inner: S, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        let prefix = shadow_prefix(&branch);
        Self {
            inner,
            branch,
            prefix,
        }
    }

    /// The branch this overlay is scoped to.
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Consume the overlay and return the wrapped store.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Canonical id for a storage key, if the key belongs to this branch.
    fn strip_own_shadow<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(&self.prefix)
    }

    /// Collapse a physical read result into the branch's virtual view:
    /// foreign shadows dropped, own shadows override canonical, ids
    /// canonicalized, order restored by sorting on id.
    fn virtualize_entities(&self, raw: Vec<Entity>) -> Vec<Entity> {
        let mut resolved: BTreeMap<String, Entity> = BTreeMap::new();
        for mut entity in raw {
            if let Some(canonical) = self.strip_own_shadow(&entity.id) {
                let canonical = canonical.to_string();
                entity.id.clone_from(&canonical);
                resolved.insert(canonical, entity);
            } else if is_shadow_key(&entity.id) {
                // Another branch's shadow record.
            } else if !resolved.contains_key(&entity.id) {
                resolved.insert(entity.id.clone(), entity);
            }
        }
        resolved.into_values().collect()
    }

    /// Same collapse for edge reads, keyed by canonical edge id.
    fn virtualize_edges(&self, raw: Vec<Edge>) -> Vec<Edge> {
        let mut resolved: BTreeMap<String, Edge> = BTreeMap::new();
        for mut edge in raw {
            if let Some(canonical) = self.strip_own_shadow(&edge.id) {
                let canonical = canonical.to_string();
                edge.id.clone_from(&canonical);
                resolved.insert(canonical, edge);
            } else if is_shadow_key(&edge.id) {
                // Another branch's shadow record.
            } else if !resolved.contains_key(&edge.id) {
                resolved.insert(edge.id.clone(), edge);
            }
        }
        resolved.into_values().collect()
    }
}

#[async_trait]
impl<S: GraphStore> GraphStore for BranchOverlay<S> {
    async fn upsert_entity(&self, mut entity: Entity) -> Result<()> {
        entity.id = shadow_key(&self.branch, &entity.id);
        self.inner.upsert_entity(entity).await
    }

    async fn bulk_upsert_entities(&self, mut entities: Vec<Entity>) -> Result<usize> {
        for entity in &mut entities {
            entity.id = shadow_key(&self.branch, &entity.id);
        }
        debug!(branch = %self.branch, count = entities.len(), "shadow-keyed entity batch");
        self.inner.bulk_upsert_entities(entities).await
    }

    async fn upsert_edge(&self, mut edge: Edge) -> Result<()> {
        edge.id = shadow_key(&self.branch, &edge.id);
        self.inner.upsert_edge(edge).await
    }

    async fn bulk_upsert_edges(&self, mut edges: Vec<Edge>) -> Result<usize> {
        for edge in &mut edges {
            edge.id = shadow_key(&self.branch, &edge.id);
        }
        debug!(branch = %self.branch, count = edges.len(), "shadow-keyed edge batch");
        self.inner.bulk_upsert_edges(edges).await
    }

    async fn get_entity(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        entity_id: &str,
    ) -> Result<Option<Entity>> {
        let key = shadow_key(&self.branch, entity_id);
        if let Some(mut entity) = self.inner.get_entity(org_id, repo_id, &key).await? {
            entity.id = entity_id.to_string();
            return Ok(Some(entity));
        }
        self.inner.get_entity(org_id, repo_id, entity_id).await
    }

    async fn get_entities_by_file(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        file_path: &str,
    ) -> Result<Vec<Entity>> {
        let raw = self
            .inner
            .get_entities_by_file(org_id, repo_id, file_path)
            .await?;
        Ok(self.virtualize_entities(raw))
    }

    async fn get_callers_of(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        entity_id: &str,
    ) -> Result<Vec<Edge>> {
        let raw = self.inner.get_callers_of(org_id, repo_id, entity_id).await?;
        Ok(self.virtualize_edges(raw))
    }

    async fn get_callees_of(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        entity_id: &str,
    ) -> Result<Vec<Edge>> {
        let raw = self.inner.get_callees_of(org_id, repo_id, entity_id).await?;
        Ok(self.virtualize_edges(raw))
    }

    async fn list_entity_ids(&self, org_id: &OrgId, repo_id: &RepoId) -> Result<Vec<String>> {
        self.inner.list_entity_ids(org_id, repo_id).await
    }

    async fn delete_entity(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        entity_id: &str,
    ) -> Result<bool> {
        let key = shadow_key(&self.branch, entity_id);
        self.inner.delete_entity(org_id, repo_id, &key).await
    }

    async fn delete_branch_data(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        branch: &str,
    ) -> Result<BranchCleanup> {
        self.inner.delete_branch_data(org_id, repo_id, branch).await
    }

    async fn delete_repo_data(&self, org_id: &OrgId, repo_id: &RepoId) -> Result<u64> {
        self.inner.delete_repo_data(org_id, repo_id).await
    }

    async fn health_check(&self) -> Result<()> {
        self.inner.health_check().await
    }
}
