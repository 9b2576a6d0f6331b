//! # talenta-inference
//!
//! Generative-language and embedding backend for talenta.
//!
//! This crate provides:
//! - A Gemini backend implementing the core inference traits
//! - Raw-text extraction from provider response shapes (strategy chain)
//! - `ModelInvoker`: bounded retry with linear backoff on transient failures
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use talenta_inference::{GeminiBackend, ModelInvoker};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = Arc::new(GeminiBackend::from_env());
//!     let invoker = ModelInvoker::new(backend);
//!     let text = invoker.invoke("Say hello.").await.unwrap();
//!     println!("{text}");
//! }
//! ```

pub mod config;
pub mod gemini;
pub mod invoker;
pub mod response;

// Re-export core types
pub use talenta_core::*;

pub use config::GeminiConfig;
pub use gemini::GeminiBackend;
pub use invoker::{ModelInvoker, RetryPolicy};
pub use response::extract_text;
