//! Domain Ports - Core trait definitions for the provisioner
//!
//! These traits define the boundaries between the provisioning pipeline and
//! the orchestrator it drives. Adapters implement these traits to provide
//! concrete functionality; test doubles implement the same traits.

use crate::domain::claim::Claim;
use crate::domain::descriptors::{
    ObservedPod, ObservedService, ObservedWorkload, ServiceDescriptor, WorkloadDescriptor,
};
use crate::error::Result;
use crate::profile::VolumeProfile;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// Volume State
// =============================================================================

/// Flat annotation map describing a VSM as observed at the orchestrator
pub type Annotations = BTreeMap<String, String>;

/// Observable state of a VSM, synthesized fresh on every read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeState {
    /// VSM name
    pub name: String,
    /// Namespace the VSM was read from
    pub namespace: String,
    /// When the state was read
    pub read_at: DateTime<Utc>,
    /// Derived annotations, keyed by the constants in `controlplane::k8s::state`
    pub annotations: Annotations,
}

impl VolumeState {
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

// =============================================================================
// Cluster Client Port
// =============================================================================

/// Where a cluster client should operate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterTarget {
    /// Namespace every call is scoped to
    pub namespace: String,
    /// Use the service account of the pod we run in
    pub in_cluster: bool,
}

/// Verb level access to workloads, services and pods of one namespace
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Namespace this client operates on
    fn namespace(&self) -> &str;

    /// Submit a workload
    async fn create_workload(&self, workload: &WorkloadDescriptor) -> Result<ObservedWorkload>;

    /// List workloads matching a label selector
    async fn list_workloads(&self, selector: &str) -> Result<Vec<ObservedWorkload>>;

    /// Delete a workload, `false` when it did not exist
    async fn delete_workload(&self, name: &str) -> Result<bool>;

    /// Submit a service
    async fn create_service(&self, service: &ServiceDescriptor) -> Result<ObservedService>;

    /// Fetch a service by name, `None` when it does not exist
    async fn get_service(&self, name: &str) -> Result<Option<ObservedService>>;

    /// Delete a service, `false` when it did not exist
    async fn delete_service(&self, name: &str) -> Result<bool>;

    /// List pods matching a label selector
    async fn list_pods(&self, selector: &str) -> Result<Vec<ObservedPod>>;
}

/// Builds a cluster client for one request
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    async fn connect(&self, target: &ClusterTarget) -> Result<Arc<dyn ClusterClient>>;
}

// =============================================================================
// Orchestrator Ports
// =============================================================================

/// Storage related operations executed at an orchestrator
#[async_trait]
pub trait StorageOps: Send + Sync {
    /// Create the controller, its service and the replicas of a VSM
    async fn add_storage(&self, profile: &VolumeProfile) -> Result<VolumeState>;

    /// Reconstruct the observable state of a VSM
    async fn read_storage(&self, profile: &VolumeProfile) -> Result<VolumeState>;

    /// Remove every object of a VSM, returning its last observed state
    async fn delete_storage(&self, profile: &VolumeProfile) -> Result<VolumeState>;
}

/// An orchestration provider registered with the provisioner
pub trait OrchestratorProvider: Send + Sync {
    /// Label assigned against the provider
    fn label(&self) -> &str;

    /// Name the provider was registered with
    fn name(&self) -> &str;

    /// Region the provider is deployed in, if it has that notion
    fn region(&self) -> Option<&str>;

    /// Storage operations, `None` if not supported
    fn storage_ops(&self) -> Option<&dyn StorageOps>;
}

// =============================================================================
// Volume Provisioner Port
// =============================================================================

/// A persistent volume provisioner plugin, driven by claims
#[async_trait]
pub trait VolumeProvisioner: Send + Sync {
    fn label(&self) -> &str;

    fn name(&self) -> &str;

    /// Provision the volume described by a claim
    async fn add(&self, claim: &Claim) -> Result<VolumeState>;

    /// Read the volume described by a claim
    async fn read(&self, claim: &Claim) -> Result<VolumeState>;

    /// Delete the volume described by a claim
    async fn delete(&self, claim: &Claim) -> Result<VolumeState>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type ClusterClientRef = Arc<dyn ClusterClient>;
pub type ClusterConnectorRef = Arc<dyn ClusterConnector>;
pub type OrchestratorProviderRef = Arc<dyn OrchestratorProvider>;
pub type VolumeProvisionerRef = Arc<dyn VolumeProvisioner>;
