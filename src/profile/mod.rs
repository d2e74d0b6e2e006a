//! Profile Resolver
//!
//! Resolves a claim's flat label map into typed, defaulted profiles:
//! - [`VolumeProfile`]: what to provision
//! - [`OrchestratorProfile`]: where to provision it

pub mod labels;
pub mod orchestrator;
pub mod volume;

pub use orchestrator::*;
pub use volume::*;
