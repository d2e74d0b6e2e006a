//! Control plane
//!
//! Orchestration providers and volume provisioners that plug into the
//! registries:
//! - [`k8s`]: Kubernetes orchestration provider
//! - [`jiva`]: Jiva persistent volume provisioner

pub mod jiva;
pub mod k8s;

pub use jiva::JivaProvisioner;
pub use k8s::client::{KubeClientConfig, KubeClusterClient, KubeConnector};
pub use k8s::K8sOrchestrator;
