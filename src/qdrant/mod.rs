//! Qdrant REST driver
//!
//! Collection lifecycle, point upserts with `wait=true`, and deterministic
//! point IDs so that re-indexing the same chunk overwrites instead of
//! duplicating.

pub mod client;
pub mod points;

pub use client::QdrantClient;
pub use points::{point_from_chunk, stable_point_id, Point};
