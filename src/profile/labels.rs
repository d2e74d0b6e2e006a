//! Claim label keys and compiled-in defaults

// =============================================================================
// Volume Provisioner Labels
// =============================================================================

/// Label assigned against volume provisioner profiles
pub const VOLUME_PROVISIONER_PROFILE_LABEL: &str =
    "volumeprovisioner.mapi.openebs.io/profile-name";

/// Selects the volume provisioner plugin
pub const VOLUME_PROVISIONER_NAME: &str = "volumeprovisioner.mapi.openebs.io/name";

pub const VSM_NAME: &str = "vsm.openebs.io/name";
pub const CONTROLLER_IMAGE: &str = "volumeprovisioner.mapi.openebs.io/controller-image";
pub const CONTROLLER_COUNT: &str = "volumeprovisioner.mapi.openebs.io/controller-count";
pub const REPLICA_IMAGE: &str = "volumeprovisioner.mapi.openebs.io/replica-image";
pub const REPLICA_COUNT: &str = "volumeprovisioner.mapi.openebs.io/replica-count";
pub const PERSISTENT_PATH_COUNT: &str = "volumeprovisioner.mapi.openebs.io/persistent-path-count";
pub const PERSISTENT_PATH: &str = "volumeprovisioner.mapi.openebs.io/persistent-path";
pub const STORAGE_SIZE: &str = "volumeprovisioner.mapi.openebs.io/storage-size";
pub const REQ_REPLICA: &str = "volumeprovisioner.mapi.openebs.io/req-replica";
pub const REQ_NETWORKING: &str = "volumeprovisioner.mapi.openebs.io/req-networking";

// =============================================================================
// Orchestration Provider Labels
// =============================================================================

/// Label assigned against orchestration providers
pub const ORCHESTRATOR_NAME: &str = "orchprovider.mapi.openebs.io/name";

/// Label assigned against orchestration provider profiles
pub const ORCHESTRATOR_PROFILE_LABEL: &str = "orchprovider.mapi.openebs.io/profile-name";

pub const NAMESPACE: &str = "orchprovider.mapi.openebs.io/ns";
pub const NETWORK_ADDR: &str = "orchprovider.mapi.openebs.io/network-addr";
pub const IN_CLUSTER: &str = "k8s.orchprovider.mapi.openebs.io/in-cluster";

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_VOLUME_PROFILE: &str = "pvc";
pub const DEFAULT_ORCHESTRATOR_PROFILE: &str = "pvc";
pub const DEFAULT_ORCHESTRATOR: &str = "kubernetes";
pub const DEFAULT_VOLUME_PROVISIONER: &str = "jiva";

pub const DEFAULT_JIVA_IMAGE: &str = "openebs/jiva:latest";
pub const DEFAULT_CONTROLLER_COUNT: u32 = 1;
pub const DEFAULT_REPLICA_COUNT: u32 = 2;
pub const DEFAULT_STORAGE_SIZE: &str = "1G";
pub const DEFAULT_PERSISTENT_PATH: &str = "/var/openebs";

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_IN_CLUSTER: &str = "true";
pub const DEFAULT_NETWORK_ADDR: &str = "172.28.128.1/24";

/// Only the case-insensitive token `true` is truthy
pub fn check_truthy(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
