//! On-disk snapshot format handed over by the upstream extractor.
//!
//! A snapshot is one extraction run's worth of raw entity/edge records for a
//! single repository, serialized as JSON. Records carry no ids yet; the
//! write pipeline assigns those.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{EdgeRecord, EntityRecord, OrgId, RepoId};

/// One extraction run's records for a single `(org, repo)` scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Tenant the snapshot belongs to
    pub org_id: String,
    /// Repository the snapshot describes
    pub repo_id: String,
    /// Raw entity records, pre-identity
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    /// Raw edge records, pre-identity
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl GraphSnapshot {
    /// Load a snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) when the file cannot be read
    /// and [`Error::Serialize`](crate::Error::Serialize) when it is not
    /// valid snapshot JSON.
    pub async fn load(path: impl AsRef<Path> + Send) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&raw)
    }

    /// Parse a snapshot from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`](crate::Error::Serialize) on malformed
    /// input.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// The tenant/repo scope pair this snapshot targets.
    #[must_use]
    pub fn scope(&self) -> (OrgId, RepoId) {
        (
            OrgId::new(self.org_id.clone()),
            RepoId::new(self.repo_id.clone()),
        )
    }
}
