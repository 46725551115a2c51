//! Crate-level tests: ranking through the in-memory store and the answer
//! pipeline with stand-in collaborators.

mod rag_ranking;
