//! Domain layer - Core types and port definitions
//!
//! This module defines the claim and descriptor types plus the traits (ports)
//! that orchestrator adapters implement, following hexagonal architecture
//! principles.

pub mod claim;
pub mod descriptors;
pub mod ports;

pub use claim::*;
pub use descriptors::*;
pub use ports::*;
