//! Point construction
//!
//! A point is one embedded chunk plus its payload. Its ID is a UUIDv5 over
//! the chunk's stable provenance fields, which makes upserts idempotent: the
//! same chunk always maps to the same point regardless of run.

use crate::corpus::DocumentChunk;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

/// Fixed namespace for chunk point IDs. Changing this would re-key every
/// point in existing collections.
const POINT_NAMESPACE: Uuid = Uuid::from_u128(0x8f2f_41d6_0b1e_4c5a_9d37_6e8a_02b4_c713);

/// One upsert-ready Qdrant point
#[derive(Debug, Clone, Serialize)]
pub struct Point {
    /// Deterministic point ID
    pub id: Uuid,

    /// Embedding vector
    pub vector: Vec<f32>,

    /// Chunk payload plus `text` and `indexed_at`
    pub payload: serde_json::Value,
}

/// Deterministic point ID from the chunk's stable provenance fields.
pub fn stable_point_id(path_rel: &str, scene: Option<&str>, kind: &str, chunk_index: usize) -> Uuid {
    let name = format!(
        "{}|{}|{}|{}",
        path_rel,
        scene.unwrap_or(""),
        kind,
        chunk_index
    );
    Uuid::new_v5(&POINT_NAMESPACE, name.as_bytes())
}

/// Build an upsert-ready point from an embedded chunk.
pub fn point_from_chunk(
    chunk: &DocumentChunk,
    vector: Vec<f32>,
    indexed_at: DateTime<Utc>,
) -> Result<Point> {
    let id = stable_point_id(
        &chunk.payload.path_rel,
        chunk.payload.scene.as_deref(),
        &chunk.payload.kind,
        chunk.chunk_index,
    );

    let mut payload = serde_json::to_value(chunk)?;
    if let Some(map) = payload.as_object_mut() {
        map.insert("indexed_at".to_string(), json!(indexed_at.to_rfc3339()));
    }

    Ok(Point {
        id,
        vector,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{hex_digest, DocumentPayload};

    fn chunk(chunk_index: usize) -> DocumentChunk {
        DocumentChunk {
            text: "and behold the heavens opened".to_string(),
            payload: DocumentPayload {
                chapter: Some(14),
                scene: Some("throne".to_string()),
                kind: "scene".to_string(),
                source: "throne.txt".to_string(),
                path: "/corpus/chapters/14/throne.txt".to_string(),
                path_rel: "chapters/14/throne.txt".to_string(),
                mtime: 1_700_000_000,
                size: 29,
            },
            chunk_index,
            hash: hex_digest("and behold the heavens opened"),
        }
    }

    #[test]
    fn test_stable_point_id_deterministic() {
        let a = stable_point_id("chapters/14/throne.txt", Some("throne"), "scene", 0);
        let b = stable_point_id("chapters/14/throne.txt", Some("throne"), "scene", 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_stable_point_id_distinguishes_fields() {
        let base = stable_point_id("a.txt", Some("s"), "scene", 0);
        assert_ne!(base, stable_point_id("b.txt", Some("s"), "scene", 0));
        assert_ne!(base, stable_point_id("a.txt", Some("t"), "scene", 0));
        assert_ne!(base, stable_point_id("a.txt", Some("s"), "media", 0));
        assert_ne!(base, stable_point_id("a.txt", Some("s"), "scene", 1));
        assert_ne!(base, stable_point_id("a.txt", None, "scene", 0));
    }

    #[test]
    fn test_point_from_chunk_payload() {
        let point = point_from_chunk(&chunk(2), vec![0.1, 0.2], Utc::now()).unwrap();
        assert_eq!(point.id, stable_point_id("chapters/14/throne.txt", Some("throne"), "scene", 2));
        assert_eq!(point.payload["kind"], "scene");
        assert_eq!(point.payload["chunk_index"], 2);
        assert_eq!(point.payload["text"], "and behold the heavens opened");
        assert!(point.payload["indexed_at"].is_string());
    }

    #[test]
    fn test_same_chunk_same_id_across_calls() {
        let p1 = point_from_chunk(&chunk(0), vec![1.0], Utc::now()).unwrap();
        let p2 = point_from_chunk(&chunk(0), vec![2.0], Utc::now()).unwrap();
        // Re-indexing overwrites: identical IDs even with a new vector
        assert_eq!(p1.id, p2.id);
    }
}
