//! Descriptor ↔ Kubernetes object conversion
//!
//! Workloads map to `apps/v1` Deployments, services to `v1` Services.

use crate::domain::descriptors::{
    ObservedContainer, ObservedPod, ObservedService, ObservedWorkload, ServiceDescriptor,
    WorkloadDescriptor, WorkloadHealth,
};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, HostPathVolumeSource, Pod, PodSpec, PodTemplateSpec, Service,
    ServicePort, ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

// =============================================================================
// Workloads
// =============================================================================

pub fn to_deployment(workload: &WorkloadDescriptor, namespace: &str) -> Deployment {
    let c = &workload.container;

    let container = Container {
        name: c.name.clone(),
        image: Some(c.image.clone()),
        command: Some(c.command.clone()),
        args: Some(c.args.clone()),
        ports: Some(
            c.ports
                .iter()
                .map(|p| ContainerPort {
                    name: p.name.clone(),
                    container_port: p.port,
                    ..ContainerPort::default()
                })
                .collect(),
        ),
        volume_mounts: (!c.volume_mounts.is_empty()).then(|| {
            c.volume_mounts
                .iter()
                .map(|m| VolumeMount {
                    name: m.name.clone(),
                    mount_path: m.mount_path.clone(),
                    ..VolumeMount::default()
                })
                .collect()
        }),
        ..Container::default()
    };

    let volumes = workload.host_path.as_ref().map(|hp| {
        vec![Volume {
            name: hp.name.clone(),
            host_path: Some(HostPathVolumeSource {
                path: hp.path.clone(),
                type_: None,
            }),
            ..Volume::default()
        }]
    });

    Deployment {
        metadata: ObjectMeta {
            name: Some(workload.name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(workload.labels.clone()),
            ..ObjectMeta::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(workload.replicas),
            selector: LabelSelector {
                match_labels: Some(workload.pod_labels.clone()),
                ..LabelSelector::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(workload.pod_labels.clone()),
                    ..ObjectMeta::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    volumes,
                    ..PodSpec::default()
                }),
            },
            ..DeploymentSpec::default()
        }),
        ..Deployment::default()
    }
}

fn deployment_health(deployment: &Deployment) -> WorkloadHealth {
    let Some(status) = &deployment.status else {
        return WorkloadHealth::Unknown;
    };

    let desired = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);
    let ready = status.ready_replicas.unwrap_or(0);

    if desired > 0 && ready >= desired {
        WorkloadHealth::Running
    } else {
        WorkloadHealth::Pending
    }
}

pub fn from_deployment(deployment: &Deployment) -> ObservedWorkload {
    let spec = deployment.spec.as_ref();

    let containers = spec
        .and_then(|s| s.template.spec.as_ref())
        .map(|pod| {
            pod.containers
                .iter()
                .map(|c| ObservedContainer {
                    name: c.name.clone(),
                    args: c.args.clone().unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    ObservedWorkload {
        name: deployment.metadata.name.clone().unwrap_or_default(),
        labels: deployment.metadata.labels.clone().unwrap_or_default(),
        replicas: spec.and_then(|s| s.replicas),
        containers,
        health: deployment_health(deployment),
    }
}

// =============================================================================
// Services
// =============================================================================

pub fn to_service(service: &ServiceDescriptor, namespace: &str) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(service.name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(service.labels.clone()),
            ..ObjectMeta::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(service.selector.clone()),
            ports: Some(
                service
                    .ports
                    .iter()
                    .map(|p| ServicePort {
                        name: p.name.clone(),
                        port: p.port,
                        ..ServicePort::default()
                    })
                    .collect(),
            ),
            ..ServiceSpec::default()
        }),
        ..Service::default()
    }
}

pub fn from_service(service: &Service) -> ObservedService {
    ObservedService {
        name: service.metadata.name.clone().unwrap_or_default(),
        cluster_ip: service
            .spec
            .as_ref()
            .and_then(|s| s.cluster_ip.clone())
            .filter(|ip| !ip.trim().is_empty() && ip != "None"),
    }
}

// =============================================================================
// Pods
// =============================================================================

pub fn from_pod(pod: &Pod) -> ObservedPod {
    let status = pod.status.as_ref();

    ObservedPod {
        name: pod.metadata.name.clone().unwrap_or_default(),
        labels: pod.metadata.labels.clone().unwrap_or_default(),
        ip: status.and_then(|s| s.pod_ip.clone()),
    }
}
