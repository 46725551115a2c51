//! # docchat server
//!
//! HTTP front end for the answer pipeline: a single streaming chat endpoint
//! plus a health probe.

pub mod handlers;
pub mod server;

pub use handlers::ChatRequest;
pub use server::{AppState, Server};
