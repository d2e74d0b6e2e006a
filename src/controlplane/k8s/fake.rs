//! In-memory cluster used by tests
//!
//! Stores submitted objects as observed views, hands out sequential cluster
//! IPs and counts calls. Failures can be armed per verb.

use crate::domain::descriptors::{
    ObservedContainer, ObservedPod, ObservedService, ObservedWorkload, ServiceDescriptor,
    WorkloadDescriptor, WorkloadHealth,
};
use crate::domain::ports::{ClusterClient, ClusterClientRef, ClusterConnector, ClusterTarget};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Verbs of the cluster client, used to count calls and arm failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verb {
    CreateWorkload,
    ListWorkloads,
    DeleteWorkload,
    CreateService,
    GetService,
    DeleteService,
    ListPods,
}

#[derive(Default)]
struct Inner {
    workloads: BTreeMap<String, ObservedWorkload>,
    services: BTreeMap<String, ObservedService>,
    pods: Vec<ObservedPod>,
    calls: BTreeMap<Verb, usize>,
    /// Calls of a verb that succeed before it starts failing
    failing: BTreeMap<Verb, usize>,
    next_ip: u8,
    fixed_cluster_ip: Option<Option<String>>,
}

/// In-memory namespace
#[derive(Clone)]
pub struct FakeCluster {
    namespace: String,
    inner: Arc<Mutex<Inner>>,
}

impl FakeCluster {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Make every future call of `verb` fail
    pub fn fail(&self, verb: Verb) {
        self.fail_after(verb, 0);
    }

    /// Let `succeeding` more calls of `verb` through, then fail the rest
    pub fn fail_after(&self, verb: Verb, succeeding: usize) {
        let mut inner = self.inner.lock();
        let done = inner.calls.get(&verb).copied().unwrap_or(0);
        inner.failing.insert(verb, done + succeeding);
    }

    /// Assign this cluster IP (or none) to every created service
    pub fn set_cluster_ip(&self, ip: Option<&str>) {
        self.inner.lock().fixed_cluster_ip = Some(ip.map(str::to_string));
    }

    /// Add a pod as if scheduled by the cluster
    pub fn add_pod(&self, name: &str, vsm_label: &str, ip: &str) {
        self.inner.lock().pods.push(ObservedPod {
            name: name.to_string(),
            labels: BTreeMap::from([("vsm".to_string(), vsm_label.to_string())]),
            ip: Some(ip.to_string()),
        });
    }

    pub fn calls(&self, verb: Verb) -> usize {
        self.inner.lock().calls.get(&verb).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.inner.lock().calls.values().sum()
    }

    pub fn workload_names(&self) -> Vec<String> {
        self.inner.lock().workloads.keys().cloned().collect()
    }

    pub fn service_names(&self) -> Vec<String> {
        self.inner.lock().services.keys().cloned().collect()
    }

    fn enter(&self, verb: Verb) -> Result<()> {
        let mut inner = self.inner.lock();
        let calls = inner.calls.entry(verb).or_insert(0);
        *calls += 1;
        let calls = *calls;

        if inner.failing.get(&verb).map_or(false, |allowed| calls > *allowed) {
            return Err(Error::Configuration(format!("injected {:?} failure", verb)));
        }
        Ok(())
    }
}

/// Matches `k=v` and `k in (a,b)` selectors
fn matches(selector: &str, labels: &BTreeMap<String, String>) -> bool {
    if let Some((key, values)) = selector.split_once(" in ") {
        let values = values.trim().trim_start_matches('(').trim_end_matches(')');
        return labels
            .get(key.trim())
            .map_or(false, |v| values.split(',').any(|c| c.trim() == v));
    }

    match selector.split_once('=') {
        Some((key, value)) => labels.get(key.trim()).map_or(false, |v| v == value.trim()),
        None => false,
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn create_workload(&self, workload: &WorkloadDescriptor) -> Result<ObservedWorkload> {
        self.enter(Verb::CreateWorkload)?;

        let observed = ObservedWorkload {
            name: workload.name.clone(),
            labels: workload.labels.clone(),
            replicas: Some(workload.replicas),
            containers: vec![ObservedContainer {
                name: workload.container.name.clone(),
                args: workload.container.args.clone(),
            }],
            health: WorkloadHealth::Running,
        };
        self.inner
            .lock()
            .workloads
            .insert(workload.name.clone(), observed.clone());
        Ok(observed)
    }

    async fn list_workloads(&self, selector: &str) -> Result<Vec<ObservedWorkload>> {
        self.enter(Verb::ListWorkloads)?;
        Ok(self
            .inner
            .lock()
            .workloads
            .values()
            .filter(|w| matches(selector, &w.labels))
            .cloned()
            .collect())
    }

    async fn delete_workload(&self, name: &str) -> Result<bool> {
        self.enter(Verb::DeleteWorkload)?;
        Ok(self.inner.lock().workloads.remove(name).is_some())
    }

    async fn create_service(&self, service: &ServiceDescriptor) -> Result<ObservedService> {
        self.enter(Verb::CreateService)?;

        let mut inner = self.inner.lock();
        let cluster_ip = match &inner.fixed_cluster_ip {
            Some(ip) => ip.clone(),
            None => {
                inner.next_ip += 1;
                Some(format!("10.0.0.{}", inner.next_ip))
            }
        };
        let observed = ObservedService {
            name: service.name.clone(),
            cluster_ip,
        };
        inner.services.insert(service.name.clone(), observed.clone());
        Ok(observed)
    }

    async fn get_service(&self, name: &str) -> Result<Option<ObservedService>> {
        self.enter(Verb::GetService)?;
        Ok(self.inner.lock().services.get(name).cloned())
    }

    async fn delete_service(&self, name: &str) -> Result<bool> {
        self.enter(Verb::DeleteService)?;
        Ok(self.inner.lock().services.remove(name).is_some())
    }

    async fn list_pods(&self, selector: &str) -> Result<Vec<ObservedPod>> {
        self.enter(Verb::ListPods)?;
        Ok(self
            .inner
            .lock()
            .pods
            .iter()
            .filter(|p| matches(selector, &p.labels))
            .cloned()
            .collect())
    }
}

/// Connector handing out one shared [`FakeCluster`]
pub struct FakeConnector {
    pub cluster: FakeCluster,
    targets: Mutex<Vec<ClusterTarget>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::with_cluster(FakeCluster::new("default"))
    }

    pub fn with_cluster(cluster: FakeCluster) -> Self {
        Self {
            cluster,
            targets: Mutex::new(Vec::new()),
        }
    }

    /// Targets requested so far
    pub fn targets(&self) -> Vec<ClusterTarget> {
        self.targets.lock().clone()
    }
}

#[async_trait]
impl ClusterConnector for FakeConnector {
    async fn connect(&self, target: &ClusterTarget) -> Result<ClusterClientRef> {
        self.targets.lock().push(target.clone());
        Ok(Arc::new(self.cluster.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_matching() {
        let labels = BTreeMap::from([("vsm".to_string(), "demo-rep".to_string())]);
        assert!(matches("vsm=demo-rep", &labels));
        assert!(!matches("vsm=demo", &labels));
        assert!(matches("vsm in (demo-ctrl,demo-rep)", &labels));
        assert!(!matches("vsm in (other-ctrl,other-rep)", &labels));
        assert!(!matches("garbage", &labels));
    }

    #[tokio::test]
    async fn test_fail_after() {
        let cluster = FakeCluster::new("default");
        cluster.fail_after(Verb::DeleteService, 2);

        assert!(cluster.delete_service("a").await.is_ok());
        assert!(cluster.delete_service("b").await.is_ok());
        assert!(cluster.delete_service("c").await.is_err());
        assert_eq!(cluster.calls(Verb::DeleteService), 3);
    }
}
