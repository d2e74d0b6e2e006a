//! Volume provisioner profile
//!
//! Turns a claim's label map into the typed configuration used by every
//! later stage of the provisioning pipeline. Resolution order for each field
//! is the explicit label value, then the compiled-in default. The VSM name
//! has no default.

use super::labels;
use super::orchestrator::OrchestratorProfile;
use crate::domain::{Claim, ClusterTarget};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Resolved, defaulted configuration of one provisioning request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeProfile {
    /// Profile name, `pvc` unless the claim names another profile
    pub name: String,
    /// VSM (volume) name
    pub vsm_name: String,
    pub controller_image: String,
    pub controller_count: u32,
    pub replica_image: String,
    pub replica_count: u32,
    /// Size handed to every replica, e.g. `1G`
    pub storage_size: String,
    pub persistent_path_count: u32,
    /// Base host directory of replica data
    pub persistent_path: String,
    pub req_replica: bool,
    pub req_networking: bool,
    /// Name of the orchestration provider to run on
    pub orchestrator: String,
    pub orchestrator_profile: OrchestratorProfile,
}

impl VolumeProfile {
    /// Resolve the volume provisioner profile of a claim
    pub fn resolve(claim: &Claim) -> Result<Self> {
        let name = claim
            .label(labels::VOLUME_PROVISIONER_PROFILE_LABEL)
            .unwrap_or(labels::DEFAULT_VOLUME_PROFILE)
            .to_string();

        if name != labels::DEFAULT_VOLUME_PROFILE {
            return Err(Error::NotRegistered {
                kind: "a volume provisioner profile".into(),
                name,
            });
        }

        // The claim's own name identifies the VSM when no label overrides it
        let vsm_name = claim
            .label(labels::VSM_NAME)
            .or_else(|| Some(claim.name.trim()).filter(|n| !n.is_empty()))
            .ok_or_else(|| Error::MissingLabel {
                field: "VSM name".into(),
                profile_label: labels::VOLUME_PROVISIONER_PROFILE_LABEL.into(),
                profile_name: name.clone(),
            })?
            .to_string();

        let controller_image = string_or(claim, labels::CONTROLLER_IMAGE, labels::DEFAULT_JIVA_IMAGE);
        let replica_image = string_or(claim, labels::REPLICA_IMAGE, labels::DEFAULT_JIVA_IMAGE);
        let controller_count =
            count_or(claim, labels::CONTROLLER_COUNT, labels::DEFAULT_CONTROLLER_COUNT)?;
        let replica_count = count_or(claim, labels::REPLICA_COUNT, labels::DEFAULT_REPLICA_COUNT)?;
        // One persistent path per replica unless stated otherwise
        let persistent_path_count = count_or(claim, labels::PERSISTENT_PATH_COUNT, replica_count)?;
        let storage_size = string_or(claim, labels::STORAGE_SIZE, labels::DEFAULT_STORAGE_SIZE);
        let persistent_path =
            string_or(claim, labels::PERSISTENT_PATH, labels::DEFAULT_PERSISTENT_PATH);

        let req_replica = claim.label(labels::REQ_REPLICA).map_or(true, labels::check_truthy);
        let req_networking = claim
            .label(labels::REQ_NETWORKING)
            .map_or(true, labels::check_truthy);

        let orchestrator = string_or(claim, labels::ORCHESTRATOR_NAME, labels::DEFAULT_ORCHESTRATOR);
        let orchestrator_profile = OrchestratorProfile::resolve(claim)?;

        Ok(Self {
            name,
            vsm_name,
            controller_image,
            controller_count,
            replica_image,
            replica_count,
            storage_size,
            persistent_path_count,
            persistent_path,
            req_replica,
            req_networking,
            orchestrator,
            orchestrator_profile,
        })
    }

    /// Label assigned against this profile
    pub fn label(&self) -> &str {
        labels::VOLUME_PROVISIONER_PROFILE_LABEL
    }

    pub fn vsm_name(&self) -> &str {
        &self.vsm_name
    }

    pub fn controller_image(&self) -> &str {
        &self.controller_image
    }

    pub fn replica_image(&self) -> &str {
        &self.replica_image
    }

    /// Container network in CIDR format
    pub fn network_cidr(&self) -> &str {
        &self.orchestrator_profile.network_addr
    }

    pub fn network_subnet(&self) -> &str {
        &self.orchestrator_profile.network_subnet
    }

    pub fn namespace(&self) -> &str {
        &self.orchestrator_profile.namespace
    }

    pub fn cluster_target(&self) -> ClusterTarget {
        self.orchestrator_profile.cluster_target()
    }

    /// Host directory backing the replica at `position` (1 based)
    pub fn persistent_path(&self, position: u32) -> Result<String> {
        if position == 0 || position > self.persistent_path_count {
            return Err(Error::InvalidReplicaPosition {
                vsm: self.vsm_name.clone(),
                position,
                count: self.persistent_path_count,
            });
        }

        Ok(format!(
            "{}/{}/rep{}",
            self.persistent_path.trim_end_matches('/'),
            self.vsm_name,
            position
        ))
    }

    /// Checks that can be made before any orchestrator call
    pub fn validate_for_provisioning(&self) -> Result<()> {
        check_image(&self.vsm_name, "controller", &self.controller_image)?;

        if self.req_replica {
            check_image(&self.vsm_name, "replica", &self.replica_image)?;

            if self.replica_count != self.persistent_path_count {
                return Err(Error::ReplicaCountMismatch {
                    vsm: self.vsm_name.clone(),
                    replica_count: self.replica_count,
                    path_count: self.persistent_path_count,
                });
            }
        }

        Ok(())
    }
}

fn string_or(claim: &Claim, key: &str, default: &str) -> String {
    claim.label(key).unwrap_or(default).to_string()
}

/// Largest count a workload can declare
pub const MAX_COUNT: u32 = i32::MAX as u32;

fn count_or(claim: &Claim, key: &str, default: u32) -> Result<u32> {
    let Some(value) = claim.label(key) else {
        return Ok(default);
    };

    let invalid = |reason: String| Error::InvalidLabel {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    };

    let count: u32 = value
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
    if count > MAX_COUNT {
        return Err(invalid(format!("count exceeds {}", MAX_COUNT)));
    }
    Ok(count)
}

fn check_image(vsm: &str, role: &str, image: &str) -> Result<()> {
    if image.is_empty() || image.chars().any(char::is_whitespace) {
        return Err(Error::UnsupportedImage {
            vsm: vsm.to_string(),
            role: role.to_string(),
        });
    }
    Ok(())
}
