//! Core domain models and logic for masker
//!
//! This crate contains:
//! - The entity taxonomy (`Label`) and detected spans (`EntitySpan`)
//! - Char/byte offset bookkeeping
//! - Sentence-aware chunking for model inference
//! - Span merging and per-label masking

pub mod chunk;
pub mod entity;
pub mod error;
pub mod label;
pub mod mask;
pub mod offsets;

pub use chunk::{Chunk, split_into_chunks};
pub use entity::{EntitySpan, Method};
pub use error::{Error, Result};
pub use label::{Label, MANDATORY_NUMERIC_SCHEMA, OPTIONAL_SEMANTIC_SCHEMA};
pub use mask::apply_masking;
pub use offsets::CharIndex;

/// Default chunk length (in chars) used when a request does not set one
pub const DEFAULT_MAX_CHUNK_LEN: usize = 300;
