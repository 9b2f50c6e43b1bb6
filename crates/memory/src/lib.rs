//! In-memory host implementations for toonctx.
//!
//! Lets the assemblers run without an agent runtime: a record store with
//! rooms, participants and vector search, plus model-free embedders.

pub mod embedder;
pub mod in_memory;
pub mod vector;

pub use embedder::{FixedEmbedder, HashingEmbedder, UnavailableEmbedder};
pub use in_memory::InMemoryStore;
pub use vector::{cosine_similarity, in_scope, search_facts};
