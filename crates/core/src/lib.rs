//! Domain types shared by the Shipyard crates.
//!
//! Everything here is pure data: the inbound deployment request, the
//! deterministic resource scope derived from it, the pipeline stages and the
//! workload phases reported by the cluster manager.

pub mod domain;

pub use domain::*;
