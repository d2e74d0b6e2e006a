//! Error types for the VSM provisioner
//!
//! Provides structured error types for profile resolution, the plugin
//! registries, the cluster client facade and the provisioning sequences.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the provisioner
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Missing {field} in '{profile_label}:{profile_name}'")]
    MissingLabel {
        field: String,
        profile_label: String,
        profile_name: String,
    },

    #[error("Invalid value '{value}' for label '{key}': {reason}")]
    InvalidLabel {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Network address '{addr}' not in CIDR format in '{profile_label}:{profile_name}'")]
    InvalidNetworkAddr {
        addr: String,
        profile_label: String,
        profile_name: String,
    },

    #[error("VSM '{vsm}' requires a {role} container image")]
    UnsupportedImage { vsm: String, role: String },

    #[error("VSM '{vsm}' replica count '{replica_count}' does not match persistent path count '{path_count}'")]
    ReplicaCountMismatch {
        vsm: String,
        replica_count: u32,
        path_count: u32,
    },

    #[error("VSM '{vsm}' has no persistent path for replica position '{position}' (count '{count}')")]
    InvalidReplicaPosition { vsm: String, position: u32, count: u32 },

    // =========================================================================
    // Orchestrator Errors
    // =========================================================================
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Cluster connection failed ({mode}): {reason}")]
    ClusterConnection { mode: String, reason: String },

    #[error("Orchestrator call '{operation}' timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("VSM '{vsm}' not found at '{label}:{name}' 'ns:{namespace}'")]
    VsmNotFound {
        vsm: String,
        label: String,
        name: String,
        namespace: String,
    },

    #[error("Service '{service}' of VSM '{vsm}' not found at '{label}:{name}' 'ns:{namespace}'")]
    ServiceNotFound {
        service: String,
        vsm: String,
        label: String,
        name: String,
        namespace: String,
    },

    #[error("'{name}' is not registered as {kind}")]
    NotRegistered { kind: String, name: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("{0}")]
    OrchestratorBuild(String),

    #[error("{feature} not supported by '{provider}'")]
    Unsupported { feature: String, provider: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Claim parse error: {0}")]
    ClaimParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an error, used by callers to decide how to
/// render or retry a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Detected locally before any orchestrator call
    Validation,
    /// Surfaced by the orchestrator or the transport to it
    Orchestrator,
    /// A named VSM, service or plugin does not exist
    NotFound,
    /// Programming or environment errors
    Internal,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingLabel { .. }
            | Error::InvalidLabel { .. }
            | Error::InvalidNetworkAddr { .. }
            | Error::UnsupportedImage { .. }
            | Error::ReplicaCountMismatch { .. }
            | Error::InvalidReplicaPosition { .. } => ErrorKind::Validation,

            Error::Kube(kube::Error::Api(resp)) if resp.code == 404 => ErrorKind::NotFound,
            Error::Kube(_) | Error::ClusterConnection { .. } | Error::Timeout { .. } => {
                ErrorKind::Orchestrator
            }

            Error::VsmNotFound { .. }
            | Error::ServiceNotFound { .. }
            | Error::NotRegistered { .. } => ErrorKind::NotFound,

            _ => ErrorKind::Internal,
        }
    }

    /// Check if retrying the same request could succeed.
    ///
    /// Advisory only; the provisioner itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Orchestrator)
    }

    /// Check if this error was raised before contacting the orchestrator
    pub fn is_validation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation)
    }

    /// Check if this error reports a missing object
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound)
    }
}

/// Result type alias for the provisioner
pub type Result<T> = std::result::Result<T, Error>;
