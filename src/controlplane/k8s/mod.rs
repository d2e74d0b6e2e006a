//! Kubernetes orchestration provider
//!
//! Provisions Jiva VSMs as Deployments plus a controller Service and reads
//! their state back from the API server.
//!
//! - [`synth`]: pure descriptor builders
//! - [`client`]: the Kubernetes cluster client facade
//! - [`state`]: annotation synthesis from observed objects

pub mod client;
pub mod convert;
pub mod state;
pub mod synth;

#[cfg(test)]
pub mod fake;

use crate::domain::descriptors::{ObservedPod, ObservedService, ObservedWorkload};
use crate::domain::ports::{
    ClusterClient, ClusterConnectorRef, OrchestratorProvider, StorageOps, VolumeState,
};
use crate::error::{Error, Result};
use crate::profile::VolumeProfile;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join3;
use tracing::{debug, info, warn};

/// Everything the API server reports about one VSM
struct Observed {
    workloads: Vec<ObservedWorkload>,
    service: ObservedService,
    pods: Vec<ObservedPod>,
}

/// Kubernetes implementation of [`OrchestratorProvider`] and [`StorageOps`]
pub struct K8sOrchestrator {
    label: String,
    name: String,
    connector: ClusterConnectorRef,
}

impl K8sOrchestrator {
    pub fn new(label: &str, name: &str, connector: ClusterConnectorRef) -> Result<Self> {
        if label.trim().is_empty() {
            return Err(Error::OrchestratorBuild(
                "Label not found while building k8s orchestrator".into(),
            ));
        }
        if name.trim().is_empty() {
            return Err(Error::OrchestratorBuild(
                "Name not found while building k8s orchestrator".into(),
            ));
        }

        Ok(Self {
            label: label.to_string(),
            name: name.to_string(),
            connector,
        })
    }

    fn vsm_not_found(&self, profile: &VolumeProfile) -> Error {
        Error::VsmNotFound {
            vsm: profile.vsm_name().to_string(),
            label: self.label.clone(),
            name: self.name.clone(),
            namespace: profile.namespace().to_string(),
        }
    }

    fn service_not_found(&self, profile: &VolumeProfile) -> Error {
        Error::ServiceNotFound {
            service: synth::controller_service_name(profile.vsm_name()),
            vsm: profile.vsm_name().to_string(),
            label: self.label.clone(),
            name: self.name.clone(),
            namespace: profile.namespace().to_string(),
        }
    }

    /// Controller, service, then replicas; `created` records what exists so far
    async fn provision(
        &self,
        profile: &VolumeProfile,
        client: &dyn ClusterClient,
        created: &mut Vec<String>,
    ) -> Result<()> {
        let vsm = profile.vsm_name();

        let controller = synth::controller_workload(profile)?;
        client.create_workload(&controller).await?;
        created.push(controller.name);

        let service = synth::controller_service(profile);
        client.create_service(&service).await?;
        created.push(service.name.clone());

        let ctrl_ip = client
            .get_service(&service.name)
            .await?
            .and_then(|s| s.cluster_ip)
            .ok_or_else(|| self.service_not_found(profile))?;
        debug!("VSM '{}' controller reachable at {}", vsm, ctrl_ip);

        if !profile.req_replica {
            return Ok(());
        }

        for position in 1..=profile.replica_count {
            let replica = synth::replica_workload(profile, &ctrl_ip, position)?;
            client.create_workload(&replica).await?;
            created.push(replica.name);
        }

        Ok(())
    }

    async fn observe(&self, profile: &VolumeProfile, client: &dyn ClusterClient) -> Result<Observed> {
        let vsm = profile.vsm_name();
        let workload_selector = synth::vsm_selector(vsm);
        let pod_selector = synth::pod_selector(vsm);
        let service_name = synth::controller_service_name(vsm);

        let (workloads, service, pods) = try_join3(
            client.list_workloads(&workload_selector),
            client.get_service(&service_name),
            client.list_pods(&pod_selector),
        )
        .await?;

        if workloads.is_empty() {
            return Err(self.vsm_not_found(profile));
        }
        let service = service.ok_or_else(|| self.service_not_found(profile))?;

        Ok(Observed {
            workloads,
            service,
            pods,
        })
    }

    fn volume_state(&self, profile: &VolumeProfile, observed: &Observed) -> VolumeState {
        let vsm = profile.vsm_name();

        VolumeState {
            name: vsm.to_string(),
            namespace: profile.namespace().to_string(),
            read_at: Utc::now(),
            annotations: state::synthesize(
                vsm,
                &observed.workloads,
                &observed.service,
                &observed.pods,
            ),
        }
    }
}

impl OrchestratorProvider for K8sOrchestrator {
    fn label(&self) -> &str {
        &self.label
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn region(&self) -> Option<&str> {
        None
    }

    fn storage_ops(&self) -> Option<&dyn StorageOps> {
        Some(self)
    }
}

#[async_trait]
impl StorageOps for K8sOrchestrator {
    async fn add_storage(&self, profile: &VolumeProfile) -> Result<VolumeState> {
        profile.validate_for_provisioning()?;

        let vsm = profile.vsm_name();
        info!("Adding storage for VSM '{}' in namespace {}", vsm, profile.namespace());

        let client = self.connector.connect(&profile.cluster_target()).await?;

        let mut created = Vec::new();
        if let Err(e) = self.provision(profile, client.as_ref(), &mut created).await {
            if !created.is_empty() {
                warn!(
                    "Provisioning of VSM '{}' failed, leaving [{}] in place: {}",
                    vsm,
                    created.join(", "),
                    e
                );
            }
            return Err(e);
        }

        info!("Created {} objects for VSM '{}'", created.len(), vsm);
        let observed = self.observe(profile, client.as_ref()).await?;
        Ok(self.volume_state(profile, &observed))
    }

    async fn read_storage(&self, profile: &VolumeProfile) -> Result<VolumeState> {
        debug!("Reading storage for VSM '{}'", profile.vsm_name());

        let client = self.connector.connect(&profile.cluster_target()).await?;
        let observed = self.observe(profile, client.as_ref()).await?;
        Ok(self.volume_state(profile, &observed))
    }

    async fn delete_storage(&self, profile: &VolumeProfile) -> Result<VolumeState> {
        let vsm = profile.vsm_name();
        info!("Deleting storage for VSM '{}' in namespace {}", vsm, profile.namespace());

        let client = self.connector.connect(&profile.cluster_target()).await?;
        let observed = self.observe(profile, client.as_ref()).await?;
        let last_state = self.volume_state(profile, &observed);

        for workload in &observed.workloads {
            if !client.delete_workload(&workload.name).await? {
                debug!("Workload {} already gone", workload.name);
            }
        }
        if !client.delete_service(&observed.service.name).await? {
            debug!("Service {} already gone", observed.service.name);
        }

        info!(
            "Deleted {} workloads and the service of VSM '{}'",
            observed.workloads.len(),
            vsm
        );
        Ok(last_state)
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{FakeCluster, FakeConnector, Verb};
    use super::*;
    use crate::domain::Claim;
    use crate::profile::labels;
    use std::sync::Arc;
    use tokio_test::assert_ok;

    fn demo_claim() -> Claim {
        Claim::new("demo")
            .with_label(labels::REPLICA_COUNT, "2")
            .with_label(labels::PERSISTENT_PATH_COUNT, "2")
            .with_label(labels::CONTROLLER_IMAGE, "img:v1")
            .with_label(labels::REPLICA_IMAGE, "img:v1")
    }

    fn orchestrator() -> (K8sOrchestrator, Arc<FakeConnector>) {
        let connector = Arc::new(FakeConnector::new());
        let orchestrator =
            K8sOrchestrator::new(labels::ORCHESTRATOR_NAME, "kubernetes", connector.clone())
                .unwrap();
        (orchestrator, connector)
    }

    fn profile(claim: &Claim) -> VolumeProfile {
        VolumeProfile::resolve(claim).unwrap()
    }

    #[test]
    fn test_new_requires_label_and_name() {
        let connector = Arc::new(FakeConnector::new());

        let err = K8sOrchestrator::new(" ", "kubernetes", connector.clone()).err().unwrap();
        assert_eq!(err.to_string(), "Label not found while building k8s orchestrator");

        let err = K8sOrchestrator::new(labels::ORCHESTRATOR_NAME, "", connector).err().unwrap();
        assert_eq!(err.to_string(), "Name not found while building k8s orchestrator");
    }

    #[tokio::test]
    async fn test_add_storage_end_to_end() {
        let (orchestrator, connector) = orchestrator();
        let cluster = &connector.cluster;
        cluster.add_pod("demo-ctrl-x1", "demo-ctrl", "172.17.0.2");
        cluster.add_pod("demo-rep1-x1", "demo-rep", "172.17.0.3");

        let state = assert_ok!(orchestrator.add_storage(&profile(&demo_claim())).await);

        assert_eq!(
            cluster.workload_names(),
            vec!["demo-ctrl", "demo-rep1", "demo-rep2"]
        );
        assert_eq!(cluster.service_names(), vec!["demo-ctrl-svc"]);
        assert_eq!(cluster.calls(Verb::CreateWorkload), 3);
        assert_eq!(cluster.calls(Verb::CreateService), 1);

        assert_eq!(state.name, "demo");
        assert_eq!(state.namespace, "default");
        assert_eq!(state.annotation(state::REPLICA_COUNT), Some("2"));
        assert_eq!(state.annotation(state::VOLUME_SIZE), Some("1G"));
        assert_eq!(
            state.annotation(state::IQN),
            Some("iqn.2016-09.com.openebs.jiva:demo")
        );
        assert_eq!(state.annotation(state::CLUSTER_IPS), Some("10.0.0.1"));
        assert_eq!(state.annotation(state::TARGET_PORTALS), Some("10.0.0.1:3260"));
        assert_eq!(state.annotation(state::CONTROLLER_IPS), Some("172.17.0.2"));
        assert_eq!(state.annotation(state::REPLICA_IPS), Some("172.17.0.3"));

        let replicas = cluster.list_workloads("vsm=demo").await.unwrap();
        let rep = replicas.iter().find(|w| w.name == "demo-rep2").unwrap();
        assert_eq!(rep.containers[0].args[2], "10.0.0.1");

        assert_eq!(
            connector.targets()[0],
            crate::domain::ClusterTarget {
                namespace: "default".into(),
                in_cluster: true,
            }
        );
    }

    #[tokio::test]
    async fn test_read_storage_after_add() {
        let (orchestrator, _connector) = orchestrator();
        let profile = profile(&demo_claim());

        orchestrator.add_storage(&profile).await.unwrap();
        let state = orchestrator.read_storage(&profile).await.unwrap();

        assert_eq!(state.annotation(state::REPLICA_COUNT), Some("2"));
        assert_eq!(state.annotation(state::REPLICA_STATUS), Some("Running,Running"));
        assert_eq!(state.annotation(state::CONTROLLER_STATUS), Some("Running"));
    }

    #[tokio::test]
    async fn test_count_mismatch_makes_no_calls() {
        let (orchestrator, connector) = orchestrator();
        let claim = demo_claim().with_label(labels::PERSISTENT_PATH_COUNT, "1");

        let err = orchestrator.add_storage(&profile(&claim)).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "VSM 'demo' replica count '2' does not match persistent path count '1'"
        );
        assert!(err.is_validation());
        assert!(connector.targets().is_empty());
        assert_eq!(connector.cluster.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_read_missing_vsm() {
        let (orchestrator, _connector) = orchestrator();
        let claim = demo_claim().with_label(labels::NAMESPACE, "storage");

        let err = orchestrator.read_storage(&profile(&claim)).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "VSM 'demo' not found at 'orchprovider.mapi.openebs.io/name:kubernetes' 'ns:storage'"
        );
    }

    #[tokio::test]
    async fn test_service_failure_leaves_controller() {
        let (orchestrator, connector) = orchestrator();
        connector.cluster.fail(Verb::CreateService);

        let result = orchestrator.add_storage(&profile(&demo_claim())).await;

        assert!(result.is_err());
        assert_eq!(connector.cluster.workload_names(), vec!["demo-ctrl"]);
        assert_eq!(connector.cluster.calls(Verb::GetService), 0);
    }

    #[tokio::test]
    async fn test_service_without_cluster_ip() {
        let cluster = FakeCluster::new("default");
        cluster.set_cluster_ip(None);
        let connector = Arc::new(FakeConnector::with_cluster(cluster));
        let orchestrator =
            K8sOrchestrator::new(labels::ORCHESTRATOR_NAME, "kubernetes", connector.clone())
                .unwrap();

        let err = orchestrator.add_storage(&profile(&demo_claim())).await.unwrap_err();

        assert!(matches!(err, Error::ServiceNotFound { ref service, .. } if service == "demo-ctrl-svc"));
        assert_eq!(connector.cluster.workload_names(), vec!["demo-ctrl"]);
    }

    #[tokio::test]
    async fn test_replica_failure_leaves_earlier_objects() {
        let (orchestrator, connector) = orchestrator();
        connector.cluster.fail_after(Verb::CreateWorkload, 2);

        let result = orchestrator.add_storage(&profile(&demo_claim())).await;

        assert!(result.is_err());
        assert_eq!(connector.cluster.calls(Verb::CreateWorkload), 3);
        assert_eq!(connector.cluster.workload_names(), vec!["demo-ctrl", "demo-rep1"]);
        assert_eq!(connector.cluster.service_names(), vec!["demo-ctrl-svc"]);
        assert_eq!(connector.cluster.calls(Verb::ListWorkloads), 0);
    }

    #[tokio::test]
    async fn test_read_without_service() {
        let (orchestrator, connector) = orchestrator();
        let profile = profile(&demo_claim());

        orchestrator.add_storage(&profile).await.unwrap();
        assert!(connector.cluster.delete_service("demo-ctrl-svc").await.unwrap());

        let err = orchestrator.read_storage(&profile).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, Error::ServiceNotFound { ref service, .. } if service == "demo-ctrl-svc"));
        assert_eq!(
            err.to_string(),
            "Service 'demo-ctrl-svc' of VSM 'demo' not found at \
             'orchprovider.mapi.openebs.io/name:kubernetes' 'ns:default'"
        );
    }

    #[tokio::test]
    async fn test_add_without_replicas() {
        let (orchestrator, connector) = orchestrator();
        let claim = demo_claim().with_label(labels::REQ_REPLICA, "false");

        let state = orchestrator.add_storage(&profile(&claim)).await.unwrap();

        assert_eq!(connector.cluster.workload_names(), vec!["demo-ctrl"]);
        assert_eq!(state.annotation(state::REPLICA_COUNT), None);
        assert_eq!(state.annotation(state::TARGET_PORTALS), Some("10.0.0.1:3260"));
    }

    #[tokio::test]
    async fn test_delete_storage() {
        let (orchestrator, connector) = orchestrator();
        let profile = profile(&demo_claim());

        orchestrator.add_storage(&profile).await.unwrap();
        let state = orchestrator.delete_storage(&profile).await.unwrap();

        assert_eq!(state.annotation(state::REPLICA_COUNT), Some("2"));
        assert!(connector.cluster.workload_names().is_empty());
        assert!(connector.cluster.service_names().is_empty());
        assert_eq!(connector.cluster.calls(Verb::DeleteWorkload), 3);

        let err = orchestrator.delete_storage(&profile).await.unwrap_err();
        assert!(matches!(err, Error::VsmNotFound { .. }));
    }
}
