//! Resource Synthesizer
//!
//! Pure builders turning a resolved [`VolumeProfile`] into the workload and
//! service descriptors of a Jiva VSM. No I/O happens here.

use crate::domain::descriptors::{
    ContainerDescriptor, HostPathVolume, MountDescriptor, PortDescriptor, ServiceDescriptor,
    WorkloadDescriptor,
};
use crate::error::{Error, Result};
use crate::profile::{labels, VolumeProfile};
use std::collections::BTreeMap;

// =============================================================================
// Naming
// =============================================================================

/// Label carried by every object of a VSM
pub const VSM_SELECTOR_KEY: &str = "vsm";

/// Replica workloads record their size here
pub const VOLUME_SIZE_LABEL: &str = "vsm.openebs.io/volume-size";

/// Keeps the pod selectors of sibling replica workloads disjoint
pub const REPLICA_POSITION_LABEL: &str = "vsm.openebs.io/replica-position";

pub const CONTROLLER_SUFFIX: &str = "-ctrl";
pub const REPLICA_SUFFIX: &str = "-rep";
pub const CONTAINER_SUFFIX: &str = "-con";
pub const SERVICE_SUFFIX: &str = "-svc";

pub fn controller_name(vsm: &str) -> String {
    format!("{vsm}{CONTROLLER_SUFFIX}")
}

pub fn controller_container_name(vsm: &str) -> String {
    format!("{vsm}{CONTROLLER_SUFFIX}{CONTAINER_SUFFIX}")
}

pub fn controller_service_name(vsm: &str) -> String {
    format!("{vsm}{CONTROLLER_SUFFIX}{SERVICE_SUFFIX}")
}

/// Common prefix of all replica workloads of a VSM
pub fn replica_base_name(vsm: &str) -> String {
    format!("{vsm}{REPLICA_SUFFIX}")
}

pub fn replica_name(vsm: &str, position: u32) -> String {
    format!("{vsm}{REPLICA_SUFFIX}{position}")
}

pub fn replica_container_name(vsm: &str, position: u32) -> String {
    format!("{vsm}{REPLICA_SUFFIX}{CONTAINER_SUFFIX}{position}")
}

/// Label selector matching every workload of a VSM
pub fn vsm_selector(vsm: &str) -> String {
    format!("{VSM_SELECTOR_KEY}={vsm}")
}

/// Label selector matching the controller and replica pods of a VSM
pub fn pod_selector(vsm: &str) -> String {
    format!(
        "{VSM_SELECTOR_KEY} in ({},{})",
        controller_name(vsm),
        replica_base_name(vsm)
    )
}

fn vsm_labels(value: String) -> BTreeMap<String, String> {
    BTreeMap::from([(VSM_SELECTOR_KEY.to_string(), value)])
}

// =============================================================================
// Ports & Mounts
// =============================================================================

pub const ISCSI_PORT: i32 = 3260;
pub const API_PORT: i32 = 9501;
pub const REPLICA_PORTS: [i32; 3] = [9502, 9503, 9504];

pub const ISCSI_PORT_NAME: &str = "iscsi";
pub const API_PORT_NAME: &str = "api";

pub const MOUNT_NAME: &str = "openebs";
pub const MOUNT_PATH: &str = "/openebs";

// =============================================================================
// Launch Templates
// =============================================================================

pub const VOLUME_NAME_PLACEHOLDER: &str = "__VOLUME_NAME__";
pub const CTRL_IP_PLACEHOLDER: &str = "__CTRL_IP__";
pub const STOR_SIZE_PLACEHOLDER: &str = "__STOR_SIZE__";

pub const JIVA_COMMAND: &[&str] = &["launch"];

pub const JIVA_CTRL_ARGS: &[&str] = &["controller", "--frontend", "gotgt", VOLUME_NAME_PLACEHOLDER];

/// The size is always the second-to-last argument
pub const JIVA_REPLICA_ARGS: &[&str] = &[
    "replica",
    "--frontendIP",
    CTRL_IP_PLACEHOLDER,
    "--listen",
    "0.0.0.0:9502",
    "--size",
    STOR_SIZE_PLACEHOLDER,
    MOUNT_PATH,
];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Controller launch arguments for a VSM
pub fn controller_args(vsm: &str) -> Vec<String> {
    JIVA_CTRL_ARGS
        .iter()
        .map(|arg| arg.replace(VOLUME_NAME_PLACEHOLDER, vsm))
        .collect()
}

/// Replica launch arguments; a blank size falls back to the default size
pub fn replica_args(ctrl_ip: &str, size: &str) -> Vec<String> {
    let size = match size.trim() {
        "" => labels::DEFAULT_STORAGE_SIZE,
        s => s,
    };

    JIVA_REPLICA_ARGS
        .iter()
        .map(|arg| {
            arg.replace(CTRL_IP_PLACEHOLDER, ctrl_ip)
                .replace(STOR_SIZE_PLACEHOLDER, size)
        })
        .collect()
}

// =============================================================================
// Builders
// =============================================================================

/// Controller workload `<vsm>-ctrl`
pub fn controller_workload(profile: &VolumeProfile) -> Result<WorkloadDescriptor> {
    let vsm = profile.vsm_name();

    let replicas = i32::try_from(profile.controller_count).map_err(|e| Error::InvalidLabel {
        key: labels::CONTROLLER_COUNT.to_string(),
        value: profile.controller_count.to_string(),
        reason: e.to_string(),
    })?;

    Ok(WorkloadDescriptor {
        name: controller_name(vsm),
        labels: vsm_labels(vsm.to_string()),
        pod_labels: vsm_labels(controller_name(vsm)),
        replicas,
        container: ContainerDescriptor {
            name: controller_container_name(vsm),
            image: profile.controller_image().to_string(),
            command: to_strings(JIVA_COMMAND),
            args: controller_args(vsm),
            ports: vec![
                PortDescriptor::named(ISCSI_PORT_NAME, ISCSI_PORT),
                PortDescriptor::named(API_PORT_NAME, API_PORT),
            ],
            volume_mounts: Vec::new(),
        },
        host_path: None,
    })
}

/// Controller service `<vsm>-ctrl-svc`, selecting the controller pods
pub fn controller_service(profile: &VolumeProfile) -> ServiceDescriptor {
    let vsm = profile.vsm_name();

    ServiceDescriptor {
        name: controller_service_name(vsm),
        labels: vsm_labels(vsm.to_string()),
        selector: vsm_labels(controller_name(vsm)),
        ports: vec![
            PortDescriptor::named(ISCSI_PORT_NAME, ISCSI_PORT),
            PortDescriptor::named(API_PORT_NAME, API_PORT),
        ],
    }
}

/// Replica workload at `position` (1 based), pointed at the controller IP
pub fn replica_workload(
    profile: &VolumeProfile,
    ctrl_ip: &str,
    position: u32,
) -> Result<WorkloadDescriptor> {
    let vsm = profile.vsm_name();
    let args = replica_args(ctrl_ip, &profile.storage_size);

    let mut workload_labels = vsm_labels(vsm.to_string());
    // Same value as the second-to-last launch argument
    workload_labels.insert(VOLUME_SIZE_LABEL.to_string(), args[args.len() - 2].clone());

    let mut pod_labels = vsm_labels(replica_base_name(vsm));
    pod_labels.insert(REPLICA_POSITION_LABEL.to_string(), position.to_string());

    Ok(WorkloadDescriptor {
        name: replica_name(vsm, position),
        labels: workload_labels,
        pod_labels,
        replicas: 1,
        container: ContainerDescriptor {
            name: replica_container_name(vsm, position),
            image: profile.replica_image().to_string(),
            command: to_strings(JIVA_COMMAND),
            args,
            ports: REPLICA_PORTS.iter().map(|p| PortDescriptor::new(*p)).collect(),
            volume_mounts: vec![MountDescriptor {
                name: MOUNT_NAME.to_string(),
                mount_path: MOUNT_PATH.to_string(),
            }],
        },
        host_path: Some(HostPathVolume {
            name: MOUNT_NAME.to_string(),
            path: profile.persistent_path(position)?,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Claim;

    fn profile(extra: &[(&str, &str)]) -> VolumeProfile {
        let mut claim = Claim::new("demo")
            .with_label(labels::CONTROLLER_IMAGE, "img:v1")
            .with_label(labels::REPLICA_IMAGE, "img:v1");
        for (k, v) in extra {
            claim = claim.with_label(*k, *v);
        }
        VolumeProfile::resolve(&claim).unwrap()
    }

    #[test]
    fn test_names() {
        assert_eq!(controller_name("demo"), "demo-ctrl");
        assert_eq!(controller_container_name("demo"), "demo-ctrl-con");
        assert_eq!(controller_service_name("demo"), "demo-ctrl-svc");
        assert_eq!(replica_base_name("demo"), "demo-rep");
        assert_eq!(replica_name("demo", 2), "demo-rep2");
        assert_eq!(replica_container_name("demo", 2), "demo-rep-con2");
        assert_eq!(vsm_selector("demo"), "vsm=demo");
        assert_eq!(pod_selector("demo"), "vsm in (demo-ctrl,demo-rep)");
    }

    #[test]
    fn test_controller_workload() {
        let ctrl = controller_workload(&profile(&[])).unwrap();
        assert_eq!(ctrl.name, "demo-ctrl");
        assert_eq!(ctrl.labels.get("vsm").map(String::as_str), Some("demo"));
        assert_eq!(ctrl.pod_labels.get("vsm").map(String::as_str), Some("demo-ctrl"));
        assert_eq!(ctrl.replicas, 1);
        assert_eq!(ctrl.container.name, "demo-ctrl-con");
        assert_eq!(ctrl.container.image, "img:v1");
        assert_eq!(ctrl.container.command, vec!["launch"]);
        assert_eq!(ctrl.container.args, vec!["controller", "--frontend", "gotgt", "demo"]);
        let ports: Vec<i32> = ctrl.container.ports.iter().map(|p| p.port).collect();
        assert_eq!(ports, vec![3260, 9501]);
        assert!(ctrl.host_path.is_none());
    }

    #[test]
    fn test_controller_service() {
        let svc = controller_service(&profile(&[]));
        assert_eq!(svc.name, "demo-ctrl-svc");
        assert_eq!(svc.selector.get("vsm").map(String::as_str), Some("demo-ctrl"));
        assert_eq!(svc.labels.get("vsm").map(String::as_str), Some("demo"));
        assert_eq!(
            svc.ports,
            vec![
                PortDescriptor::named("iscsi", 3260),
                PortDescriptor::named("api", 9501)
            ]
        );
    }

    #[test]
    fn test_replica_workload() {
        let profile = profile(&[(labels::STORAGE_SIZE, "5G")]);
        let rep = replica_workload(&profile, "10.0.0.5", 2).unwrap();

        assert_eq!(rep.name, "demo-rep2");
        assert_eq!(rep.pod_labels.get("vsm").map(String::as_str), Some("demo-rep"));
        assert_eq!(
            rep.pod_labels.get(REPLICA_POSITION_LABEL).map(String::as_str),
            Some("2")
        );
        assert_eq!(rep.labels.get(VOLUME_SIZE_LABEL).map(String::as_str), Some("5G"));
        assert_eq!(rep.container.name, "demo-rep-con2");
        assert_eq!(
            rep.container.args,
            vec![
                "replica",
                "--frontendIP",
                "10.0.0.5",
                "--listen",
                "0.0.0.0:9502",
                "--size",
                "5G",
                "/openebs"
            ]
        );
        let ports: Vec<i32> = rep.container.ports.iter().map(|p| p.port).collect();
        assert_eq!(ports, vec![9502, 9503, 9504]);
        assert_eq!(
            rep.host_path,
            Some(HostPathVolume {
                name: "openebs".into(),
                path: "/var/openebs/demo/rep2".into()
            })
        );
        assert_eq!(rep.container.volume_mounts[0].mount_path, "/openebs");
    }

    #[test]
    fn test_replica_args_have_no_placeholders() {
        for size in ["1G", "", "  ", "20Gi"] {
            let args = replica_args("172.16.0.9", size);
            assert!(args
                .iter()
                .all(|a| !a.contains(CTRL_IP_PLACEHOLDER) && !a.contains(STOR_SIZE_PLACEHOLDER)));
        }
        assert_eq!(replica_args("1.1.1.1", "")[6], "1G");
    }

    #[test]
    fn test_controller_count_out_of_range() {
        let mut profile = profile(&[]);
        profile.controller_count = i32::MAX as u32;
        assert_eq!(controller_workload(&profile).unwrap().replicas, i32::MAX);

        profile.controller_count = u32::MAX;
        let err = controller_workload(&profile).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains(labels::CONTROLLER_COUNT));
    }

    #[test]
    fn test_replica_position_out_of_range() {
        let profile = profile(&[]);
        assert!(replica_workload(&profile, "10.0.0.5", 3).is_err());
    }
}
