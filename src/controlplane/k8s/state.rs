//! State Synthesizer
//!
//! Folds the workloads, pods and controller service of a VSM into one flat
//! annotation map. Values found on several objects are comma-joined in the
//! order they are observed.

use super::synth;
use crate::domain::descriptors::{ObservedPod, ObservedService, ObservedWorkload};
use crate::domain::ports::Annotations;

// =============================================================================
// Annotation Keys
// =============================================================================

pub const CONTROLLER_IPS: &str = "vsm.openebs.io/controller-ips";
pub const REPLICA_IPS: &str = "vsm.openebs.io/replica-ips";
pub const CLUSTER_IPS: &str = "vsm.openebs.io/cluster-ips";
pub const TARGET_PORTALS: &str = "vsm.openebs.io/targetportals";
pub const IQN: &str = "vsm.openebs.io/iqn";
pub const REPLICA_COUNT: &str = "vsm.openebs.io/replica-count";
pub const VOLUME_SIZE: &str = "vsm.openebs.io/volume-size";
pub const CONTROLLER_STATUS: &str = "vsm.openebs.io/controller-status";
pub const REPLICA_STATUS: &str = "vsm.openebs.io/replica-status";

pub const JIVA_IQN_PREFIX: &str = "iqn.2016-09.com.openebs.jiva";

/// iSCSI qualified name of a VSM
pub fn iqn(vsm: &str) -> String {
    format!("{JIVA_IQN_PREFIX}:{vsm}")
}

/// iSCSI target portal in front of a controller cluster IP
pub fn target_portal(cluster_ip: &str) -> String {
    format!("{}:{}", cluster_ip, synth::ISCSI_PORT)
}

fn append(annotations: &mut Annotations, key: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    annotations
        .entry(key.to_string())
        .and_modify(|existing| {
            existing.push(',');
            existing.push_str(value);
        })
        .or_insert_with(|| value.to_string());
}

// =============================================================================
// Workloads
// =============================================================================

/// Role of a workload within a VSM, decided by its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadRole {
    Controller,
    Replica,
}

pub fn workload_role(vsm: &str, name: &str) -> Option<WorkloadRole> {
    if name == synth::controller_name(vsm) {
        return Some(WorkloadRole::Controller);
    }

    let position = name.strip_prefix(&synth::replica_base_name(vsm))?;
    if position.is_empty() || position.chars().all(|c| c.is_ascii_digit()) {
        Some(WorkloadRole::Replica)
    } else {
        None
    }
}

pub fn set_controller_status(workload: &ObservedWorkload, annotations: &mut Annotations) {
    append(annotations, CONTROLLER_STATUS, &workload.health.to_string());
}

pub fn set_replica_status(workload: &ObservedWorkload, annotations: &mut Annotations) {
    append(annotations, REPLICA_STATUS, &workload.health.to_string());
}

/// Adds the declared replicas of a replica workload to the running total
pub fn add_replica_count(workload: &ObservedWorkload, annotations: &mut Annotations) {
    let Some(replicas) = workload.replicas else {
        return;
    };

    let current: i64 = annotations
        .get(REPLICA_COUNT)
        .and_then(|c| c.parse().ok())
        .unwrap_or(0);

    annotations.insert(REPLICA_COUNT.to_string(), (current + replicas as i64).to_string());
}

/// Size of a replica workload: the structured label, or else the
/// second-to-last launch argument of its first container
pub fn replica_volume_size(workload: &ObservedWorkload) -> Option<String> {
    if let Some(size) = workload.labels.get(synth::VOLUME_SIZE_LABEL) {
        return Some(size.clone());
    }

    let args = &workload.containers.first()?.args;
    args.len().checked_sub(2).map(|i| args[i].clone())
}

pub fn set_volume_size(workload: &ObservedWorkload, annotations: &mut Annotations) {
    if annotations.contains_key(VOLUME_SIZE) {
        return;
    }
    if let Some(size) = replica_volume_size(workload) {
        append(annotations, VOLUME_SIZE, &size);
    }
}

pub fn set_iqn(vsm: &str, annotations: &mut Annotations) {
    if vsm.is_empty() {
        return;
    }
    annotations.insert(IQN.to_string(), iqn(vsm));
}

// =============================================================================
// Service & Pods
// =============================================================================

pub fn set_cluster_ips(service: &ObservedService, annotations: &mut Annotations) {
    if let Some(ip) = &service.cluster_ip {
        append(annotations, CLUSTER_IPS, ip);
    }
}

pub fn set_target_portals(service: &ObservedService, annotations: &mut Annotations) {
    if let Some(ip) = service.cluster_ip.as_deref().map(str::trim).filter(|ip| !ip.is_empty()) {
        append(annotations, TARGET_PORTALS, &target_portal(ip));
    }
}

pub fn set_pod_ips(vsm: &str, pod: &ObservedPod, annotations: &mut Annotations) {
    let Some(ip) = &pod.ip else {
        return;
    };

    match pod.labels.get(synth::VSM_SELECTOR_KEY) {
        Some(role) if *role == synth::controller_name(vsm) => append(annotations, CONTROLLER_IPS, ip),
        Some(role) if *role == synth::replica_base_name(vsm) => append(annotations, REPLICA_IPS, ip),
        _ => {}
    }
}

// =============================================================================
// Fold
// =============================================================================

/// Fold everything observed about a VSM into its annotation map
pub fn synthesize(
    vsm: &str,
    workloads: &[ObservedWorkload],
    service: &ObservedService,
    pods: &[ObservedPod],
) -> Annotations {
    let mut annotations = Annotations::new();

    for workload in workloads {
        match workload_role(vsm, &workload.name) {
            Some(WorkloadRole::Controller) => set_controller_status(workload, &mut annotations),
            Some(WorkloadRole::Replica) => {
                add_replica_count(workload, &mut annotations);
                set_volume_size(workload, &mut annotations);
                set_replica_status(workload, &mut annotations);
                set_iqn(vsm, &mut annotations);
            }
            None => {}
        }
    }

    set_cluster_ips(service, &mut annotations);
    set_target_portals(service, &mut annotations);

    for pod in pods {
        set_pod_ips(vsm, pod, &mut annotations);
    }

    annotations
}
