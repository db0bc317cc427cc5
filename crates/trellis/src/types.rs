//! Domain types for the trellis code knowledge graph.
//!
//! These types represent the core domain model:
//! - **Entities**: [`Entity`], [`Edge`] (stored through the graph store)
//! - **Transient**: [`EntityRecord`], [`EdgeRecord`] (extraction payloads, pre-identity)
//! - **Results**: [`GraphWriteSummary`], [`BlastRadiusEntry`], [`RiskReport`] (operation results)
//!
//! ## Design Decisions
//!
//! | Decision | Choice | Rationale |
//! |----------|--------|-----------|
//! | Entity/Edge kind | Enum not String | Closed sets; partition dispatch is a match, not a lookup miss |
//! | Org/repo scope | Newtypes | Prevents swapped-parameter bugs in store calls |
//! | Entity id | Plain `String` | Derived 16-hex digest; also embedded in endpoint refs and shadow keys |
//! | Edge endpoints | Partition-qualified strings | Matches the store's addressing scheme (`"<partition>/<id>"`) |
//! | Metadata | `BTreeMap<String, Value>` | Free-form but deterministically ordered when serialized |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Strongly-typed scope keys
// ============================================================================

/// A strongly-typed tenant identifier.
///
/// Every store operation is keyed by tenant first; the newtype keeps org and
/// repo arguments from being swapped at call sites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgId(pub String);

impl OrgId {
    /// Create a new org id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrgId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A strongly-typed repository identifier, scoped under an [`OrgId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId(pub String);

impl RepoId {
    /// Create a new repo id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RepoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Entity kinds tracked in the knowledge graph.
///
/// These are normalized across source languages by the upstream extraction
/// step. The set is closed: storage partitioning and analysis dispatch both
/// match exhaustively on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Source file (synthesized by the write pipeline for every distinct path)
    File,
    /// Directory grouping
    Directory,
    /// Free function
    Function,
    /// Method (function associated with a type)
    Method,
    /// Decorator / annotation applied to other entities
    Decorator,
    /// Class definition
    Class,
    /// Struct definition
    Struct,
    /// Interface / trait definition
    Interface,
    /// Variable or constant binding
    Variable,
    /// Type alias
    Type,
    /// Enum type
    Enum,
    /// Module
    Module,
    /// Namespace
    Namespace,
    /// HTTP API route (externally observable surface)
    ApiRoute,
    /// UI component (externally observable surface)
    Component,
}

impl EntityKind {
    /// Canonical string representation, as stored and hashed.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Function => "function",
            Self::Method => "method",
            Self::Decorator => "decorator",
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Interface => "interface",
            Self::Variable => "variable",
            Self::Type => "type",
            Self::Enum => "enum",
            Self::Module => "module",
            Self::Namespace => "namespace",
            Self::ApiRoute => "api_route",
            Self::Component => "component",
        }
    }

    /// Storage partition this kind is addressed under.
    ///
    /// Externally-visible surfaces (`api_route`, `component`) live under
    /// `functions`: they are callable artifacts and appear as call targets.
    #[must_use]
    pub fn partition(&self) -> Partition {
        match self {
            Self::Function | Self::Method | Self::Decorator | Self::ApiRoute | Self::Component => {
                Partition::Functions
            }
            Self::Class | Self::Struct => Partition::Classes,
            Self::Interface => Partition::Interfaces,
            Self::Variable | Self::Type | Self::Enum => Partition::Variables,
            Self::File | Self::Module | Self::Namespace | Self::Directory => Partition::Files,
        }
    }

    /// Whether this kind is an externally observable surface (a blast-radius
    /// exit point and an implicit entry point for dead-code analysis).
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::ApiRoute | Self::Component)
    }

    /// Whether this kind is containment scaffolding rather than code.
    ///
    /// Scaffolding kinds have no inbound edges by construction (`contains`
    /// edges point away from them), so inbound-degree analyses skip them.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::File | Self::Directory | Self::Module | Self::Namespace
        )
    }

    /// Whether this kind is a function-like entity (valid blast-radius input).
    #[must_use]
    pub fn is_function_like(&self) -> bool {
        matches!(self, Self::Function | Self::Method)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage partitions entities are addressed under.
///
/// Edge endpoints embed the partition as a `"<partition>/<id>"` string; the
/// mapping from [`EntityKind`] is the closed table in
/// [`EntityKind::partition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    /// Functions, methods, decorators, and externally-visible surfaces
    Functions,
    /// Classes and structs
    Classes,
    /// Interfaces
    Interfaces,
    /// Variables, type aliases, and enums
    Variables,
    /// Files, directories, modules, and namespaces
    Files,
}

impl Partition {
    /// Canonical string representation (the endpoint prefix).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Functions => "functions",
            Self::Classes => "classes",
            Self::Interfaces => "interfaces",
            Self::Variables => "variables",
            Self::Files => "files",
        }
    }

    /// Compose a partition-qualified endpoint reference for an entity id.
    #[must_use]
    pub fn qualify(&self, id: &str) -> String {
        format!("{}/{id}", self.as_str())
    }

    /// Strip a partition prefix from an endpoint reference.
    ///
    /// Unqualified references pass through unchanged, so lookups never fail on
    /// endpoint format alone.
    #[must_use]
    pub fn strip_ref(endpoint: &str) -> &str {
        endpoint
            .split_once('/')
            .map_or(endpoint, |(_, id)| id)
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge kinds - how two entities relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// File-to-member containment (synthesized by the write pipeline)
    Contains,
    /// Function/method invocation
    Calls,
    /// Import statement
    Imports,
    /// Interface implementation
    Implements,
    /// Class inheritance
    Extends,
    /// Non-call usage of a symbol
    References,
    /// Method override
    Overrides,
    /// Return-type relationship
    Returns,
    /// Parameter-type relationship
    ParameterOf,
    /// Membership in a class/struct
    MemberOf,
}

impl EdgeKind {
    /// Canonical string representation, as stored and hashed.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Calls => "calls",
            Self::Imports => "imports",
            Self::Implements => "implements",
            Self::Extends => "extends",
            Self::References => "references",
            Self::Overrides => "overrides",
            Self::Returns => "returns",
            Self::ParameterOf => "parameter_of",
            Self::MemberOf => "member_of",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Core Entities (stored through the graph store)
// ============================================================================

/// A graph node representing a code artifact.
///
/// The `id` is content-addressed: a pure function of
/// `(repo_id, file_path, kind, name, signature)`. Changing any of those
/// fields yields a new id, so a changed signature orphans the old node
/// rather than mutating it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Content-addressed identifier (16 lowercase hex chars)
    pub id: String,
    /// Owning tenant
    pub org_id: OrgId,
    /// Owning repository
    pub repo_id: RepoId,
    /// What kind of artifact this is
    pub kind: EntityKind,
    /// Simple name (e.g. `"formatDate"`, or the route label for api routes)
    pub name: String,
    /// Path of the containing source file, relative to the repo root
    pub file_path: Option<String>,
    /// Starting line (1-indexed)
    pub start_line: Option<u32>,
    /// Ending line (1-indexed, inclusive)
    pub end_line: Option<u32>,
    /// Declaration signature as written in source
    pub signature: Option<String>,
    /// Source language label (free-form, extractor-defined)
    pub language: Option<String>,
    /// Whether the entity is exported from its module
    pub exported: bool,
    /// Name of the enclosing entity (class for a method, module for a function)
    pub parent: Option<String>,
    /// Truncated body text for display and classification
    pub body: Option<String>,
    /// Whether the entity is an async function/method
    pub is_async: bool,
    /// Number of declared parameters (function-like kinds)
    pub parameter_count: Option<u32>,
    /// Declared return type (function-like kinds)
    pub return_type: Option<String>,
    /// Cyclomatic complexity as measured by the extractor
    pub complexity: Option<u32>,
    /// Blue/green index-version tag stamped by the write pipeline
    pub index_version: Option<String>,
}

impl Entity {
    /// The partition-qualified endpoint reference for this entity.
    #[must_use]
    pub fn partition_ref(&self) -> String {
        self.kind.partition().qualify(&self.id)
    }
}

/// A directed, typed relationship between two entities.
///
/// Endpoints are partition-qualified references; the `id` is a dedup key
/// derived purely from `(from_id, to_id, kind)`, so resubmitting the same
/// triple can never create a duplicate edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Content-addressed dedup key (16 lowercase hex chars)
    pub id: String,
    /// Owning tenant
    pub org_id: OrgId,
    /// Owning repository
    pub repo_id: RepoId,
    /// Source endpoint (`"<partition>/<id>"`)
    pub from_id: String,
    /// Target endpoint (`"<partition>/<id>"`)
    pub to_id: String,
    /// Relationship kind
    pub kind: EdgeKind,
    /// Free-form extractor metadata (call-site line, import alias, ...)
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Blue/green index-version tag stamped by the write pipeline
    pub index_version: Option<String>,
}

impl Edge {
    /// Bare entity id of the source endpoint (partition prefix stripped).
    #[must_use]
    pub fn from_entity_id(&self) -> &str {
        Partition::strip_ref(&self.from_id)
    }

    /// Bare entity id of the target endpoint (partition prefix stripped).
    #[must_use]
    pub fn to_entity_id(&self) -> &str {
        Partition::strip_ref(&self.to_id)
    }
}

// ============================================================================
// Transient Types (extraction payloads)
// ============================================================================

/// A raw entity record handed in by the extraction step, before identity
/// assignment.
///
/// Records may already carry an id (e.g. from a prior partial write); the
/// write pipeline leaves those untouched and hashes the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Pre-assigned id, if the extractor already resolved one
    #[serde(default)]
    pub id: Option<String>,
    /// What kind of artifact this is
    pub kind: EntityKind,
    /// Simple name
    pub name: String,
    /// Path of the containing source file
    #[serde(default)]
    pub file_path: Option<String>,
    /// Starting line (1-indexed)
    #[serde(default)]
    pub start_line: Option<u32>,
    /// Ending line (1-indexed, inclusive)
    #[serde(default)]
    pub end_line: Option<u32>,
    /// Declaration signature as written in source
    #[serde(default)]
    pub signature: Option<String>,
    /// Source language label
    #[serde(default)]
    pub language: Option<String>,
    /// Whether the entity is exported
    #[serde(default)]
    pub exported: bool,
    /// Name of the enclosing entity
    #[serde(default)]
    pub parent: Option<String>,
    /// Truncated body text
    #[serde(default)]
    pub body: Option<String>,
    /// Whether the entity is async
    #[serde(default)]
    pub is_async: bool,
    /// Number of declared parameters
    #[serde(default)]
    pub parameter_count: Option<u32>,
    /// Declared return type
    #[serde(default)]
    pub return_type: Option<String>,
    /// Cyclomatic complexity
    #[serde(default)]
    pub complexity: Option<u32>,
}

impl EntityRecord {
    /// Promote this record to a stored [`Entity`] with a resolved id and
    /// tenant/repo scope.
    #[must_use]
    pub fn into_entity(self, id: String, org_id: &OrgId, repo_id: &RepoId) -> Entity {
        Entity {
            id,
            org_id: org_id.clone(),
            repo_id: repo_id.clone(),
            kind: self.kind,
            name: self.name,
            file_path: self.file_path,
            start_line: self.start_line,
            end_line: self.end_line,
            signature: self.signature,
            language: self.language,
            exported: self.exported,
            parent: self.parent,
            body: self.body,
            is_async: self.is_async,
            parameter_count: self.parameter_count,
            return_type: self.return_type,
            complexity: self.complexity,
            index_version: None,
        }
    }
}

/// A raw edge record handed in by the extraction step, before dedup-key
/// assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Source endpoint (`"<partition>/<id>"`)
    pub from_id: String,
    /// Target endpoint (`"<partition>/<id>"`)
    pub to_id: String,
    /// Relationship kind
    pub kind: EdgeKind,
    /// Free-form extractor metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl EdgeRecord {
    /// Promote this record to a stored [`Edge`] with a resolved dedup key and
    /// tenant/repo scope.
    #[must_use]
    pub fn into_edge(self, id: String, org_id: &OrgId, repo_id: &RepoId) -> Edge {
        Edge {
            id,
            org_id: org_id.clone(),
            repo_id: repo_id.clone(),
            from_id: self.from_id,
            to_id: self.to_id,
            kind: self.kind,
            metadata: self.metadata,
            index_version: None,
        }
    }
}

// ============================================================================
// Operation Results
// ============================================================================

/// Counts reported by one write-pipeline run.
///
/// Feeds repository status and progress display; counts reflect the final
/// deduplicated batch, including synthesized file entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphWriteSummary {
    /// Entities upserted (after dedup, including synthesized files)
    pub entities_written: usize,
    /// Edges upserted (after dedup, including synthesized contains edges)
    pub edges_written: usize,
    /// File-kind entities in the batch
    pub file_count: usize,
    /// Function and method entities in the batch
    pub function_count: usize,
    /// Class and struct entities in the batch
    pub class_count: usize,
}

/// Entities and edges removed by a branch-overlay cleanup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCleanup {
    /// Shadow entities deleted
    pub entities_removed: u64,
    /// Shadow edges deleted
    pub edges_removed: u64,
}

impl BranchCleanup {
    /// Total records removed.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.entities_removed + self.edges_removed
    }
}

// ============================================================================
// Analysis Results
// ============================================================================

/// One row of a blast-radius summary: an affected entity, its direct caller
/// count, and the externally-visible surfaces it can reach.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlastRadiusEntry {
    /// The affected function/method
    pub entity: Entity,
    /// Distinct direct callers (immediate only, not transitive)
    pub caller_count: usize,
    /// Reachable boundary surfaces, capped at
    /// [`MAX_UPSTREAM_BOUNDARIES`](crate::impact::MAX_UPSTREAM_BOUNDARIES)
    pub upstream_boundaries: Vec<BoundaryHit>,
}

/// A boundary surface reached during blast-radius traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundaryHit {
    /// Boundary kind (`api_route` or `component`)
    pub kind: EntityKind,
    /// Boundary name (e.g. `"GET /api/users"`)
    pub name: String,
    /// Human-readable path from the affected entity to this boundary
    pub path: String,
}

/// Severity of a structural risk finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Worth reviewing
    Medium,
    /// Likely needs intervention
    High,
}

impl Severity {
    /// Canonical string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Which degree direction a fan-in/fan-out finding measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreeDirection {
    /// Inbound `calls` edges (who calls this)
    FanIn,
    /// Outbound `calls` edges (what this calls)
    FanOut,
}

/// An entity with no inbound edges, not exported, and not an entry point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadCodeFinding {
    /// Flagged entity id
    pub entity_id: String,
    /// Flagged entity name
    pub name: String,
    /// Flagged entity kind
    pub kind: EntityKind,
    /// File the entity was extracted from
    pub file_path: Option<String>,
}

/// A circular dependency over `calls`/`imports` edges.
///
/// Members are listed in traversal order, rotated so the smallest id comes
/// first; the cycle closes back from the last member to the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleFinding {
    /// Entity ids participating in the cycle
    pub entity_ids: Vec<String>,
}

/// A fan-in or fan-out hotspot over `calls` edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegreeFinding {
    /// Flagged entity id
    pub entity_id: String,
    /// Flagged entity name
    pub name: String,
    /// Measured direction
    pub direction: DegreeDirection,
    /// Edge count in that direction
    pub degree: usize,
    /// Finding severity
    pub severity: Severity,
}

impl DegreeFinding {
    /// The risk label this finding reports under.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self.direction {
            DegreeDirection::FanOut => "god function",
            DegreeDirection::FanIn => "high-risk change surface",
        }
    }
}

/// Combined output of the structural risk detectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskReport {
    /// Unreferenced, unexported, non-entry-point entities
    pub dead_code: Vec<DeadCodeFinding>,
    /// Circular dependencies over `calls`/`imports` edges
    pub cycles: Vec<CycleFinding>,
    /// Fan-in/fan-out hotspots over `calls` edges
    pub degree_risks: Vec<DegreeFinding>,
}

impl RiskReport {
    /// Total finding count across all detectors.
    #[must_use]
    pub fn total_findings(&self) -> usize {
        self.dead_code.len() + self.cycles.len() + self.degree_risks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_table_matches_storage_layout() {
        assert_eq!(EntityKind::Function.partition(), Partition::Functions);
        assert_eq!(EntityKind::Method.partition(), Partition::Functions);
        assert_eq!(EntityKind::Decorator.partition(), Partition::Functions);
        assert_eq!(EntityKind::Class.partition(), Partition::Classes);
        assert_eq!(EntityKind::Struct.partition(), Partition::Classes);
        assert_eq!(EntityKind::Interface.partition(), Partition::Interfaces);
        assert_eq!(EntityKind::Variable.partition(), Partition::Variables);
        assert_eq!(EntityKind::Type.partition(), Partition::Variables);
        assert_eq!(EntityKind::Enum.partition(), Partition::Variables);
        assert_eq!(EntityKind::File.partition(), Partition::Files);
        assert_eq!(EntityKind::Module.partition(), Partition::Files);
        assert_eq!(EntityKind::Namespace.partition(), Partition::Files);
        assert_eq!(EntityKind::Directory.partition(), Partition::Files);
    }

    #[test]
    fn boundary_kinds_partition_as_callable() {
        assert_eq!(EntityKind::ApiRoute.partition(), Partition::Functions);
        assert_eq!(EntityKind::Component.partition(), Partition::Functions);
        assert!(EntityKind::ApiRoute.is_boundary());
        assert!(EntityKind::Component.is_boundary());
        assert!(!EntityKind::Function.is_boundary());
    }

    #[test]
    fn kind_strings_are_snake_case() {
        assert_eq!(EntityKind::ApiRoute.as_str(), "api_route");
        assert_eq!(EdgeKind::ParameterOf.as_str(), "parameter_of");
        assert_eq!(EdgeKind::MemberOf.as_str(), "member_of");
    }

    #[test]
    fn kind_serde_matches_as_str() {
        let json = serde_json::to_string(&EntityKind::ApiRoute).unwrap();
        assert_eq!(json, "\"api_route\"");
        let back: EntityKind = serde_json::from_str("\"api_route\"").unwrap();
        assert_eq!(back, EntityKind::ApiRoute);

        let json = serde_json::to_string(&EdgeKind::ParameterOf).unwrap();
        assert_eq!(json, "\"parameter_of\"");
    }

    #[test]
    fn qualify_and_strip_round_trip() {
        let qualified = Partition::Functions.qualify("abc123");
        assert_eq!(qualified, "functions/abc123");
        assert_eq!(Partition::strip_ref(&qualified), "abc123");
    }

    #[test]
    fn strip_ref_passes_through_unqualified_ids() {
        assert_eq!(Partition::strip_ref("abc123"), "abc123");
        assert_eq!(Partition::strip_ref(""), "");
    }

    #[test]
    fn structural_kinds_exclude_code() {
        assert!(EntityKind::File.is_structural());
        assert!(EntityKind::Directory.is_structural());
        assert!(EntityKind::Module.is_structural());
        assert!(EntityKind::Namespace.is_structural());
        assert!(!EntityKind::Function.is_structural());
        assert!(!EntityKind::Class.is_structural());
    }

    #[test]
    fn function_like_covers_functions_and_methods_only() {
        assert!(EntityKind::Function.is_function_like());
        assert!(EntityKind::Method.is_function_like());
        assert!(!EntityKind::Class.is_function_like());
        assert!(!EntityKind::ApiRoute.is_function_like());
    }

    #[test]
    fn entity_record_deserializes_from_minimal_json() {
        let record: EntityRecord =
            serde_json::from_str(r#"{"kind": "function", "name": "parse"}"#).unwrap();
        assert_eq!(record.kind, EntityKind::Function);
        assert_eq!(record.name, "parse");
        assert_eq!(record.id, None);
        assert_eq!(record.file_path, None);
        assert!(!record.exported);
        assert!(!record.is_async);
    }

    #[test]
    fn entity_record_promotion_carries_scope() {
        let record: EntityRecord = serde_json::from_str(
            r#"{"kind": "method", "name": "save", "file_path": "src/db.ts", "exported": true}"#,
        )
        .unwrap();
        let entity = record.into_entity(
            "deadbeef01234567".to_string(),
            &OrgId::new("acme"),
            &RepoId::new("api"),
        );
        assert_eq!(entity.id, "deadbeef01234567");
        assert_eq!(entity.org_id.as_str(), "acme");
        assert_eq!(entity.repo_id.as_str(), "api");
        assert_eq!(entity.kind, EntityKind::Method);
        assert!(entity.exported);
        assert_eq!(entity.index_version, None);
    }

    #[test]
    fn edge_endpoint_ids_strip_partitions() {
        let edge = Edge {
            id: "0011223344556677".to_string(),
            org_id: OrgId::new("acme"),
            repo_id: RepoId::new("api"),
            from_id: "functions/aaaa111122223333".to_string(),
            to_id: "classes/bbbb444455556666".to_string(),
            kind: EdgeKind::MemberOf,
            metadata: BTreeMap::new(),
            index_version: None,
        };
        assert_eq!(edge.from_entity_id(), "aaaa111122223333");
        assert_eq!(edge.to_entity_id(), "bbbb444455556666");
    }

    #[test]
    fn severity_orders_medium_below_high() {
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn degree_finding_labels_by_direction() {
        let fan_out = DegreeFinding {
            entity_id: "aaaa111122223333".to_string(),
            name: "dispatch".to_string(),
            direction: DegreeDirection::FanOut,
            degree: 17,
            severity: Severity::High,
        };
        assert_eq!(fan_out.label(), "god function");

        let fan_in = DegreeFinding {
            direction: DegreeDirection::FanIn,
            ..fan_out
        };
        assert_eq!(fan_in.label(), "high-risk change surface");
    }

    #[test]
    fn branch_cleanup_totals_both_sides() {
        let cleanup = BranchCleanup {
            entities_removed: 3,
            edges_removed: 5,
        };
        assert_eq!(cleanup.total(), 8);
    }

    #[test]
    fn write_summary_defaults_to_zero() {
        let summary = GraphWriteSummary::default();
        assert_eq!(summary.entities_written, 0);
        assert_eq!(summary.edges_written, 0);
        assert_eq!(summary.file_count, 0);
    }
}
