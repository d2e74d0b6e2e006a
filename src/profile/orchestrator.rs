//! Orchestration provider profile
//!
//! Resolves where and how the orchestrator is reached: namespace, in-cluster
//! connection mode and the container network.

use super::labels;
use crate::domain::{Claim, ClusterTarget};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Resolved orchestration provider settings of one claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorProfile {
    /// Profile name, `pvc` unless the claim names another profile
    pub name: String,
    /// Namespace all orchestrator calls are scoped to
    pub namespace: String,
    /// Whether the orchestrator is the cluster we run in
    pub in_cluster: bool,
    /// Container network in CIDR format
    pub network_addr: String,
    /// Prefix length of `network_addr`
    pub network_subnet: String,
}

impl OrchestratorProfile {
    /// Resolve the orchestration provider profile of a claim.
    ///
    /// Explicit labels win, compiled-in defaults fill the rest.
    pub fn resolve(claim: &Claim) -> Result<Self> {
        let name = claim
            .label(labels::ORCHESTRATOR_PROFILE_LABEL)
            .unwrap_or(labels::DEFAULT_ORCHESTRATOR_PROFILE)
            .to_string();

        if name != labels::DEFAULT_ORCHESTRATOR_PROFILE {
            return Err(Error::NotRegistered {
                kind: "an orchestration provider profile".into(),
                name,
            });
        }

        let namespace = claim
            .label(labels::NAMESPACE)
            .unwrap_or(labels::DEFAULT_NAMESPACE)
            .to_string();

        let in_cluster = labels::check_truthy(
            claim
                .label(labels::IN_CLUSTER)
                .unwrap_or(labels::DEFAULT_IN_CLUSTER),
        );

        let network_addr = claim
            .label(labels::NETWORK_ADDR)
            .unwrap_or(labels::DEFAULT_NETWORK_ADDR)
            .to_string();

        let network_subnet = cidr_subnet(&network_addr).ok_or_else(|| Error::InvalidNetworkAddr {
            addr: network_addr.clone(),
            profile_label: labels::ORCHESTRATOR_PROFILE_LABEL.into(),
            profile_name: name.clone(),
        })?;

        Ok(Self {
            name,
            namespace,
            in_cluster,
            network_addr,
            network_subnet: network_subnet.to_string(),
        })
    }

    /// Connection target for the cluster client facade
    pub fn cluster_target(&self) -> ClusterTarget {
        ClusterTarget {
            namespace: self.namespace.clone(),
            in_cluster: self.in_cluster,
        }
    }
}

/// Prefix length of a CIDR address, `None` if it is not CIDR
pub fn cidr_subnet(addr: &str) -> Option<u8> {
    let (ip, prefix) = addr.trim().split_once('/')?;
    let ip: IpAddr = ip.parse().ok()?;
    let prefix: u8 = prefix.parse().ok()?;

    let max = match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };

    (prefix <= max).then_some(prefix)
}
