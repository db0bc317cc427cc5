//! Content-addressed identity hashing for entities and edges.
//!
//! Every graph id is a 64-bit xxh3 digest rendered as 16 lowercase hex
//! characters. Ids are pure functions of an entity's defining attributes, so
//! re-indexing unchanged code always regenerates the same ids and repeated
//! writes collapse into upserts instead of duplicates.
//!
//! # Properties
//!
//! - **Deterministic**: equal inputs always produce equal ids, across runs
//!   and across concurrent workers.
//! - **Field-sensitive**: changing any single input field changes the id;
//!   an old signature's id becomes orphaned rather than mutated in place.
//! - **Unambiguous**: each field is framed with a length prefix before
//!   hashing, so no combination of field values can collide by shifting
//!   bytes across a field boundary.
//! - **Total**: no error path and no I/O; these functions cannot fail.
//!
//! # Example
//!
//! ```
//! use trellis::hash::entity_hash;
//! use trellis::EntityKind;
//!
//! let id = entity_hash(
//!     "billing-api",
//!     Some("src/dates.ts"),
//!     EntityKind::Function,
//!     "formatDate",
//!     Some("(date: Date) => string"),
//! );
//! assert_eq!(id.len(), 16);
//! ```

use xxhash_rust::xxh3::Xxh3;

use crate::types::{EdgeKind, EntityKind};

/// Number of hex characters in a graph id (a 64-bit digest).
pub const ID_HEX_LEN: usize = 16;

/// Hash a fixed sequence of fields into a 16-hex-char id.
///
/// Each field is written as an 8-byte little-endian length followed by its
/// UTF-8 bytes. The framing is what makes the scheme delimiter-safe: `"ab"`
/// + `"c"` and `"a"` + `"bc"` hash differently even though their
/// concatenations are identical.
fn hash_fields(fields: &[&str]) -> String {
    let mut hasher = Xxh3::new();
    for field in fields {
        hasher.update(&(field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    format!("{:016x}", hasher.digest())
}

/// Compute the content-addressed id for an entity.
///
/// The id is a pure function of `(repo_id, file_path, kind, name,
/// signature)`. Absent `file_path`/`signature` hash as the empty string, so
/// `None` and `Some("")` produce the same id.
#[must_use]
pub fn entity_hash(
    repo_id: &str,
    file_path: Option<&str>,
    kind: EntityKind,
    name: &str,
    signature: Option<&str>,
) -> String {
    hash_fields(&[
        repo_id,
        file_path.unwrap_or(""),
        kind.as_str(),
        name,
        signature.unwrap_or(""),
    ])
}

/// Compute the dedup key for an edge.
///
/// The id is a pure function of `(from_id, to_id, kind)` over the
/// partition-qualified endpoint strings, so resubmitting the same triple
/// always yields the same key.
#[must_use]
pub fn edge_hash(from_id: &str, to_id: &str, kind: EdgeKind) -> String {
    hash_fields(&[from_id, to_id, kind.as_str()])
}

/// Compute the id of the synthesized file entity for a source path.
///
/// File entities are named by their path, so the id derives from
/// `(repo, path, "file", path)` with no signature.
#[must_use]
pub fn file_entity_hash(repo_id: &str, file_path: &str) -> String {
    entity_hash(repo_id, Some(file_path), EntityKind::File, file_path, None)
}

/// Check whether a string is a well-formed canonical graph id.
///
/// Canonical ids are exactly [`ID_HEX_LEN`] lowercase hex characters. Shadow
/// keys and partition-qualified references are not canonical ids.
#[must_use]
pub fn is_graph_id(candidate: &str) -> bool {
    candidate.len() == ID_HEX_LEN
        && candidate
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_hash_is_deterministic() {
        let a = entity_hash(
            "repo",
            Some("src/lib.rs"),
            EntityKind::Function,
            "parse",
            Some("fn parse(input: &str) -> Ast"),
        );
        let b = entity_hash(
            "repo",
            Some("src/lib.rs"),
            EntityKind::Function,
            "parse",
            Some("fn parse(input: &str) -> Ast"),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn entity_hash_changes_with_every_field() {
        let base = entity_hash("repo", Some("src/lib.rs"), EntityKind::Function, "parse", None);

        let other_repo =
            entity_hash("repo2", Some("src/lib.rs"), EntityKind::Function, "parse", None);
        let other_path =
            entity_hash("repo", Some("src/main.rs"), EntityKind::Function, "parse", None);
        let other_kind = entity_hash("repo", Some("src/lib.rs"), EntityKind::Method, "parse", None);
        let other_name = entity_hash("repo", Some("src/lib.rs"), EntityKind::Function, "run", None);
        let other_sig = entity_hash(
            "repo",
            Some("src/lib.rs"),
            EntityKind::Function,
            "parse",
            Some("fn parse()"),
        );

        assert_ne!(base, other_repo);
        assert_ne!(base, other_path);
        assert_ne!(base, other_kind);
        assert_ne!(base, other_name);
        assert_ne!(base, other_sig);
    }

    #[test]
    fn missing_signature_equals_empty_signature() {
        let none = entity_hash("repo", Some("a.ts"), EntityKind::Function, "f", None);
        let empty = entity_hash("repo", Some("a.ts"), EntityKind::Function, "f", Some(""));
        assert_eq!(none, empty);
    }

    #[test]
    fn field_framing_prevents_boundary_shifts() {
        // Concatenations agree ("r|xy|z" vs "r|x|yz"); framed hashes must not.
        let shifted_left = entity_hash("r", Some("xy"), EntityKind::Function, "z", None);
        let shifted_right = entity_hash("r", Some("x"), EntityKind::Function, "yz", None);
        assert_ne!(shifted_left, shifted_right);
    }

    #[test]
    fn entity_hash_output_is_lowercase_hex() {
        let id = entity_hash("repo", None, EntityKind::Class, "Widget", None);
        assert_eq!(id.len(), ID_HEX_LEN);
        assert!(is_graph_id(&id));
    }

    #[test]
    fn edge_hash_is_deterministic_and_direction_sensitive() {
        let forward = edge_hash("functions/aaaa", "functions/bbbb", EdgeKind::Calls);
        let again = edge_hash("functions/aaaa", "functions/bbbb", EdgeKind::Calls);
        let reverse = edge_hash("functions/bbbb", "functions/aaaa", EdgeKind::Calls);

        assert_eq!(forward, again);
        assert_ne!(forward, reverse);
    }

    #[test]
    fn edge_hash_distinguishes_kinds() {
        let calls = edge_hash("functions/aaaa", "functions/bbbb", EdgeKind::Calls);
        let imports = edge_hash("functions/aaaa", "functions/bbbb", EdgeKind::Imports);
        assert_ne!(calls, imports);
    }

    #[test]
    fn file_entity_hash_matches_expanded_form() {
        let direct = file_entity_hash("repo", "src/db.ts");
        let expanded = entity_hash("repo", Some("src/db.ts"), EntityKind::File, "src/db.ts", None);
        assert_eq!(direct, expanded);
    }

    #[test]
    fn is_graph_id_rejects_non_canonical_strings() {
        assert!(is_graph_id("0123456789abcdef"));
        assert!(!is_graph_id("0123456789ABCDEF"));
        assert!(!is_graph_id("0123456789abcde"));
        assert!(!is_graph_id("0123456789abcdef0"));
        assert!(!is_graph_id("functions/0123456789abcdef"));
        assert!(!is_graph_id("branch:main:0123456789abcdef"));
        assert!(!is_graph_id(""));
    }
}
