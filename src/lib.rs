//! portti - a readiness gate for clustered workloads
//!
//! Blocks until a quorum of sibling pods reaches a readiness condition,
//! then exits so a dependent container can proceed. Run as an
//! init container (or a helper next to one) in each member pod.

pub mod config;
pub mod gate;
pub mod server;
