//! # Tabula Vector Index
//!
//! Client abstraction over a backing nearest-neighbor store organized as
//! named collections, each holding one or more independently-addressable
//! named vector spaces (a row may have both a "description" vector and a
//! "notes" vector, searchable independently or together).
//!
//! ## Features
//!
//! - Per-collection, per-named-vector search behind the [`VectorBackend`]
//!   service boundary
//! - Batch fan-out: N sub-searches dispatched together, one round trip of
//!   added latency
//! - Tunable recall/latency trade-off with `balanced`/`fast`/`accurate`
//!   presets and optional adaptive breadth
//! - Absent collections degrade to empty result sets, never errors
//!
//! ## Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use tabula_vector_index::{
//!     CandidateId, InMemoryBackend, Payload, SearchTuning, VectorIndexClient,
//! };
//! # use async_trait::async_trait;
//! # struct MyEmbedder;
//! # #[async_trait]
//! # impl tabula_vector_index::EmbeddingProvider for MyEmbedder {
//! #     async fn embed(&self, _text: &str) -> tabula_vector_index::Result<Vec<f32>> {
//! #         Ok(vec![0.0; 3])
//! #     }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = Arc::new(InMemoryBackend::new());
//!     backend
//!         .upsert_point(
//!             "products",
//!             CandidateId::Int(1),
//!             HashMap::from([("description".to_string(), vec![0.1, 0.2, 0.3])]),
//!             Payload::new(),
//!         )
//!         .await;
//!
//!     let client = VectorIndexClient::new(backend, Arc::new(MyEmbedder));
//!     let hits = client
//!         .search("products", "description", vec![0.1, 0.2, 0.3], 5, None, SearchTuning::balanced())
//!         .await?;
//!     println!("{} hits", hits.len());
//!     Ok(())
//! }
//! ```

mod backend;
mod client;
mod error;
mod memory;
mod point;
mod tuning;

pub use backend::{
    id_filter, FilterClause, FilterCondition, PointFilter, PointSearchRequest, VectorBackend,
};
pub use client::{EmbeddingProvider, FieldSearchResult, VectorIndexClient, VectorQuerySpec};
pub use error::{Result, VectorIndexError};
pub use memory::InMemoryBackend;
pub use point::{CandidateId, Payload, PayloadValue, PointHit};
pub use tuning::{SearchTuning, TuningPolicy};
