//! VSM Provisioner - Jiva block volume control plane
//!
//! Provisions replicated Jiva block volumes (VSMs) on Kubernetes: one
//! controller Deployment, its Service, and N replica Deployments, then reads
//! their state back as a flat annotation map.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                Claim (name + label map)                       │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//!                    ┌───────────┴───────────┐
//!                    │   Profile Resolver    │
//!                    └───────────┬───────────┘
//!                                │
//!   ┌────────────────────────────┴─────────────────────────────┐
//!   │   Registries: volume provisioners ─► orchestrators        │
//!   └────────────────────────────┬─────────────────────────────┘
//!                                │
//!   ┌────────────────────────────┴─────────────────────────────┐
//!   │  Kubernetes orchestrator (add / read / delete storage)    │
//!   │  ┌────────────────┐ ┌──────────────┐ ┌─────────────────┐  │
//!   │  │    Resource    │ │   Cluster    │ │      State      │  │
//!   │  │   Synthesizer  │ │    Client    │ │   Synthesizer   │  │
//!   │  └────────────────┘ └──────────────┘ └─────────────────┘  │
//!   └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`profile`]: Claim labels resolved into typed profiles
//! - [`registry`]: Orchestrator and volume provisioner registries
//! - [`controlplane`]: Kubernetes orchestrator and Jiva provisioner
//! - [`domain`]: Core domain types and traits
//! - [`error`]: Error types and handling

pub mod controlplane;
pub mod domain;
pub mod error;
pub mod profile;
pub mod registry;

// Re-export commonly used types
pub use controlplane::{
    JivaProvisioner, K8sOrchestrator, KubeClientConfig, KubeClusterClient, KubeConnector,
};

pub use domain::{
    Annotations, Claim, ClusterClient, ClusterConnector, ClusterTarget, OrchestratorProvider,
    StorageOps, VolumeProvisioner, VolumeState,
};

pub use error::{Error, ErrorKind, Result};

pub use profile::{OrchestratorProfile, VolumeProfile};

pub use registry::{OrchestratorRegistry, Registries, VolumeProvisionerRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
