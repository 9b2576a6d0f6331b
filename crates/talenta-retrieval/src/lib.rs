//! # talenta-retrieval
//!
//! Rubric vector retrieval for talenta.
//!
//! This crate provides:
//! - A Qdrant REST client implementing the `RubricIndex` trait
//! - `RubricRetriever`: batched embedding + top-k rubric guidance assembly
//!   with static defaults when the index has no relevant match

pub mod qdrant;
pub mod rubrics;

// Re-export core types
pub use talenta_core::*;

pub use qdrant::{QdrantConfig, QdrantIndex};
pub use rubrics::{RubricContext, RubricRetriever};
