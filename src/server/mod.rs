//! HTTP server for the discovery endpoint
//!
//! Every gate instance answers `200 OK` on every request; sibling gates
//! running the HTTP probe strategy hit this endpoint to decide whether
//! this pod counts toward the quorum.

mod discovery;

pub use discovery::{bind_discovery, serve_discovery};

#[cfg(test)]
#[path = "discovery_test.rs"]
mod discovery_tests;
