//! In-memory graph store backend.
//!
//! This backend serves three purposes:
//! - **Tests**: contract-level coverage without external infrastructure.
//! - **CLI**: the `trellis` binary ingests snapshots into it for analysis.
//! - **Reference semantics**: the behavior production backends must match,
//!   including last-write-wins upserts and tolerance of dangling endpoints.
//!
//! # Architecture
//!
//! State lives in per-(org, repo) [`RepoGraph`] maps behind
//! `Arc<tokio::sync::Mutex<_>>`, so cloned handles share one graph and the
//! backend is safe to use from concurrent tasks. Entity and edge maps are
//! `BTreeMap`s and the secondary indexes hold `BTreeSet`s, which makes every
//! read deterministic (sorted by storage key) and analyses built on top
//! reproducible.
//!
//! # Indexes
//!
//! Beside the primary maps, each repo keeps a file-path index and
//! inbound/outbound adjacency indexes keyed by bare entity id, so
//! `get_entities_by_file` and the caller/callee reads stay proportional to
//! their result size rather than to the whole graph.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::overlay::shadow_prefix;
use crate::store::GraphStore;
use crate::types::{BranchCleanup, Edge, Entity, OrgId, RepoId};

/// Graph state for one (org, repo) scope.
#[derive(Debug, Default)]
struct RepoGraph {
    /// Entities by storage key (canonical id or shadow key)
    entities: BTreeMap<String, Entity>,
    /// Edges by storage key
    edges: BTreeMap<String, Edge>,
    /// `file_path` → entity storage keys
    by_file: HashMap<String, BTreeSet<String>>,
    /// Bare target entity id → edge storage keys
    inbound: HashMap<String, BTreeSet<String>>,
    /// Bare source entity id → edge storage keys
    outbound: HashMap<String, BTreeSet<String>>,
}

impl RepoGraph {
    fn insert_entity(&mut self, entity: Entity) {
        // Re-index the file path in case an upsert moved it.
        let old_path = self
            .entities
            .get(&entity.id)
            .and_then(|old| old.file_path.clone());
        if let Some(path) = old_path {
            self.unindex_file(&path, &entity.id);
        }
        if let Some(path) = entity.file_path.clone() {
            self.by_file.entry(path).or_default().insert(entity.id.clone());
        }
        self.entities.insert(entity.id.clone(), entity);
    }

    fn insert_edge(&mut self, edge: Edge) {
        if let Some(old) = self.edges.get(&edge.id) {
            let from = old.from_entity_id().to_string();
            let to = old.to_entity_id().to_string();
            self.unindex_edge(&from, &to, &edge.id);
        }
        self.outbound
            .entry(edge.from_entity_id().to_string())
            .or_default()
            .insert(edge.id.clone());
        self.inbound
            .entry(edge.to_entity_id().to_string())
            .or_default()
            .insert(edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
    }

    fn remove_entity(&mut self, key: &str) -> bool {
        match self.entities.remove(key) {
            Some(old) => {
                if let Some(path) = &old.file_path {
                    self.unindex_file(path, key);
                }
                true
            }
            None => false,
        }
    }

    fn remove_edge(&mut self, key: &str) -> bool {
        match self.edges.remove(key) {
            Some(old) => {
                let from = old.from_entity_id().to_string();
                let to = old.to_entity_id().to_string();
                self.unindex_edge(&from, &to, key);
                true
            }
            None => false,
        }
    }

    fn unindex_file(&mut self, path: &str, key: &str) {
        if let Some(keys) = self.by_file.get_mut(path) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_file.remove(path);
            }
        }
    }

    fn unindex_edge(&mut self, from: &str, to: &str, key: &str) {
        if let Some(keys) = self.outbound.get_mut(from) {
            keys.remove(key);
            if keys.is_empty() {
                self.outbound.remove(from);
            }
        }
        if let Some(keys) = self.inbound.get_mut(to) {
            keys.remove(key);
            if keys.is_empty() {
                self.inbound.remove(to);
            }
        }
    }

    fn delete_branch(&mut self, branch: &str) -> BranchCleanup {
        let prefix = shadow_prefix(branch);
        let entity_keys: Vec<String> = self
            .entities
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();
        let edge_keys: Vec<String> = self
            .edges
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();

        for key in &entity_keys {
            self.remove_entity(key);
        }
        for key in &edge_keys {
            self.remove_edge(key);
        }

        BranchCleanup {
            entities_removed: entity_keys.len() as u64,
            edges_removed: edge_keys.len() as u64,
        }
    }

    fn record_count(&self) -> u64 {
        (self.entities.len() + self.edges.len()) as u64
    }
}

#[derive(Debug, Default)]
struct MemoryGraphInner {
    repos: HashMap<OrgId, HashMap<RepoId, RepoGraph>>,
}

impl MemoryGraphInner {
    fn repo(&self, org_id: &OrgId, repo_id: &RepoId) -> Option<&RepoGraph> {
        self.repos.get(org_id).and_then(|org| org.get(repo_id))
    }

    fn repo_mut(&mut self, org_id: &OrgId, repo_id: &RepoId) -> &mut RepoGraph {
        self.repos
            .entry(org_id.clone())
            .or_default()
            .entry(repo_id.clone())
            .or_default()
    }
}

/// In-memory [`GraphStore`] backend.
///
/// Cloning the store clones a handle to the same shared graph. See the
/// module docs for determinism and indexing notes.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraphStore {
    inner: Arc<Mutex<MemoryGraphInner>>,
}

impl MemoryGraphStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn upsert_entity(&self, entity: Entity) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let org_id = entity.org_id.clone();
        let repo_id = entity.repo_id.clone();
        inner.repo_mut(&org_id, &repo_id).insert_entity(entity);
        Ok(())
    }

    async fn bulk_upsert_entities(&self, entities: Vec<Entity>) -> Result<usize> {
        if entities.is_empty() {
            return Ok(0);
        }
        let count = entities.len();
        let mut inner = self.inner.lock().await;
        for entity in entities {
            let org_id = entity.org_id.clone();
            let repo_id = entity.repo_id.clone();
            inner.repo_mut(&org_id, &repo_id).insert_entity(entity);
        }
        debug!(count, "bulk entity upsert");
        Ok(count)
    }

    async fn upsert_edge(&self, edge: Edge) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let org_id = edge.org_id.clone();
        let repo_id = edge.repo_id.clone();
        inner.repo_mut(&org_id, &repo_id).insert_edge(edge);
        Ok(())
    }

    async fn bulk_upsert_edges(&self, edges: Vec<Edge>) -> Result<usize> {
        if edges.is_empty() {
            return Ok(0);
        }
        let count = edges.len();
        let mut inner = self.inner.lock().await;
        for edge in edges {
            let org_id = edge.org_id.clone();
            let repo_id = edge.repo_id.clone();
            inner.repo_mut(&org_id, &repo_id).insert_edge(edge);
        }
        debug!(count, "bulk edge upsert");
        Ok(count)
    }

    async fn get_entity(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        entity_id: &str,
    ) -> Result<Option<Entity>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .repo(org_id, repo_id)
            .and_then(|repo| repo.entities.get(entity_id))
            .cloned())
    }

    async fn get_entities_by_file(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        file_path: &str,
    ) -> Result<Vec<Entity>> {
        let inner = self.inner.lock().await;
        let Some(repo) = inner.repo(org_id, repo_id) else {
            return Ok(Vec::new());
        };
        let Some(keys) = repo.by_file.get(file_path) else {
            return Ok(Vec::new());
        };
        Ok(keys
            .iter()
            .filter_map(|key| repo.entities.get(key))
            .cloned()
            .collect())
    }

    async fn get_callers_of(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        entity_id: &str,
    ) -> Result<Vec<Edge>> {
        let inner = self.inner.lock().await;
        let Some(repo) = inner.repo(org_id, repo_id) else {
            return Ok(Vec::new());
        };
        let Some(keys) = repo.inbound.get(entity_id) else {
            return Ok(Vec::new());
        };
        Ok(keys
            .iter()
            .filter_map(|key| repo.edges.get(key))
            .cloned()
            .collect())
    }

    async fn get_callees_of(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        entity_id: &str,
    ) -> Result<Vec<Edge>> {
        let inner = self.inner.lock().await;
        let Some(repo) = inner.repo(org_id, repo_id) else {
            return Ok(Vec::new());
        };
        let Some(keys) = repo.outbound.get(entity_id) else {
            return Ok(Vec::new());
        };
        Ok(keys
            .iter()
            .filter_map(|key| repo.edges.get(key))
            .cloned()
            .collect())
    }

    async fn list_entity_ids(&self, org_id: &OrgId, repo_id: &RepoId) -> Result<Vec<String>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .repo(org_id, repo_id)
            .map(|repo| repo.entities.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_entity(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        entity_id: &str,
    ) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let Some(org) = inner.repos.get_mut(org_id) else {
            return Ok(false);
        };
        let Some(repo) = org.get_mut(repo_id) else {
            return Ok(false);
        };
        Ok(repo.remove_entity(entity_id))
    }

    async fn delete_branch_data(
        &self,
        org_id: &OrgId,
        repo_id: &RepoId,
        branch: &str,
    ) -> Result<BranchCleanup> {
        let mut inner = self.inner.lock().await;
        let Some(org) = inner.repos.get_mut(org_id) else {
            return Ok(BranchCleanup::default());
        };
        let Some(repo) = org.get_mut(repo_id) else {
            return Ok(BranchCleanup::default());
        };
        let cleanup = repo.delete_branch(branch);
        info!(
            org = %org_id,
            repo = %repo_id,
            branch,
            entities = cleanup.entities_removed,
            edges = cleanup.edges_removed,
            "branch overlay cleared"
        );
        Ok(cleanup)
    }

    async fn delete_repo_data(&self, org_id: &OrgId, repo_id: &RepoId) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let Some(org) = inner.repos.get_mut(org_id) else {
            return Ok(0);
        };
        let removed = org
            .remove(repo_id)
            .map_or(0, |repo| repo.record_count());
        if org.is_empty() {
            inner.repos.remove(org_id);
        }
        info!(org = %org_id, repo = %repo_id, removed, "repository data deleted");
        Ok(removed)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
