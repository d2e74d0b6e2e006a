//! Orchestrator neutral resource descriptors
//!
//! Descriptors are transient values built by the resource synthesizer and
//! handed to a [`ClusterClient`](super::ports::ClusterClient) exactly once.
//! The `Observed*` types are the read-back views a cluster client returns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Submitted Descriptors
// =============================================================================

/// A container port, optionally named
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescriptor {
    pub name: Option<String>,
    pub port: i32,
}

impl PortDescriptor {
    pub fn new(port: i32) -> Self {
        Self { name: None, port }
    }

    pub fn named(name: impl Into<String>, port: i32) -> Self {
        Self {
            name: Some(name.into()),
            port,
        }
    }
}

/// Where a named volume is mounted inside the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountDescriptor {
    pub name: String,
    pub mount_path: String,
}

/// A volume backed by a directory on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPathVolume {
    pub name: String,
    pub path: String,
}

/// The single container of a workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDescriptor {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub ports: Vec<PortDescriptor>,
    pub volume_mounts: Vec<MountDescriptor>,
}

/// A named, labeled unit of one container run by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadDescriptor {
    pub name: String,
    /// Labels on the workload object itself
    pub labels: BTreeMap<String, String>,
    /// Labels stamped on every pod, also used as the workload's selector
    pub pod_labels: BTreeMap<String, String>,
    pub replicas: i32,
    pub container: ContainerDescriptor,
    pub host_path: Option<HostPathVolume>,
}

/// A stable address in front of a set of pods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub selector: BTreeMap<String, String>,
    pub ports: Vec<PortDescriptor>,
}

// =============================================================================
// Observed State
// =============================================================================

/// Coarse health of a workload as reported by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkloadHealth {
    Running,
    Pending,
    Unknown,
}

impl std::fmt::Display for WorkloadHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkloadHealth::Running => write!(f, "Running"),
            WorkloadHealth::Pending => write!(f, "Pending"),
            WorkloadHealth::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Container fields read back from a workload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedContainer {
    pub name: String,
    pub args: Vec<String>,
}

/// A workload as currently stored by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedWorkload {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    /// Declared replica count, when the orchestrator reports one
    pub replicas: Option<i32>,
    pub containers: Vec<ObservedContainer>,
    pub health: WorkloadHealth,
}

/// A service as currently stored by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedService {
    pub name: String,
    pub cluster_ip: Option<String>,
}

/// A pod as currently stored by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedPod {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub ip: Option<String>,
}
