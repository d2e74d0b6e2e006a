//! Cluster Client Facade
//!
//! Kubernetes implementation of [`ClusterClient`]. Each call is scoped to one
//! namespace and bounded by the configured request timeout.

use super::convert;
use crate::domain::descriptors::{
    ObservedPod, ObservedService, ObservedWorkload, ServiceDescriptor, WorkloadDescriptor,
};
use crate::domain::ports::{ClusterClient, ClusterClientRef, ClusterConnector, ClusterTarget};
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

// =============================================================================
// Configuration
// =============================================================================

/// How to reach the Kubernetes API server
#[derive(Debug, Clone)]
pub struct KubeClientConfig {
    /// Kubeconfig file used outside a cluster; the default lookup applies when unset
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context, the current one when unset
    pub context: Option<String>,
    /// Upper bound for every single API call
    pub request_timeout: Duration,
}

impl Default for KubeClientConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            context: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

// =============================================================================
// Connector
// =============================================================================

/// Builds namespaced Kubernetes clients on demand
pub struct KubeConnector {
    config: KubeClientConfig,
}

impl KubeConnector {
    pub fn new(config: KubeClientConfig) -> Self {
        Self { config }
    }

    fn in_cluster_config(&self) -> Result<Config> {
        Config::incluster().map_err(|e| Error::ClusterConnection {
            mode: "in-cluster".into(),
            reason: e.to_string(),
        })
    }

    async fn out_of_cluster_config(&self) -> Result<Config> {
        let options = KubeConfigOptions {
            context: self.config.context.clone(),
            ..KubeConfigOptions::default()
        };
        let connection_error = |e: kube::config::KubeconfigError| Error::ClusterConnection {
            mode: "out-of-cluster".into(),
            reason: e.to_string(),
        };

        match &self.config.kubeconfig {
            Some(path) => {
                debug!("Loading kubeconfig from {}", path.display());
                let kubeconfig = Kubeconfig::read_from(path).map_err(connection_error)?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(connection_error)
            }
            None => Config::from_kubeconfig(&options).await.map_err(connection_error),
        }
    }
}

#[async_trait]
impl ClusterConnector for KubeConnector {
    async fn connect(&self, target: &ClusterTarget) -> Result<ClusterClientRef> {
        let mut config = if target.in_cluster {
            self.in_cluster_config()?
        } else {
            self.out_of_cluster_config().await?
        };

        config.default_namespace = target.namespace.clone();
        config.read_timeout = Some(self.config.request_timeout);

        let client = Client::try_from(config)?;
        info!(
            "Connected to Kubernetes ({}) in namespace {}",
            if target.in_cluster { "in-cluster" } else { "out-of-cluster" },
            target.namespace
        );

        Ok(Arc::new(KubeClusterClient::new(
            client,
            &target.namespace,
            self.config.request_timeout,
        )))
    }
}

// =============================================================================
// Client
// =============================================================================

/// Namespaced access to Deployments, Services and Pods
pub struct KubeClusterClient {
    client: Client,
    namespace: String,
    request_timeout: Duration,
}

impl KubeClusterClient {
    pub fn new(client: Client, namespace: &str, request_timeout: Duration) -> Self {
        Self {
            client,
            namespace: namespace.to_string(),
            request_timeout,
        }
    }

    fn deployments(&self) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn services(&self) -> Api<Service> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    async fn timed<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, kube::Error>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::Timeout {
                operation: operation.to_string(),
                after: self.request_timeout,
            }),
        }
    }
}

fn absent_as_false(result: Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(Error::Kube(kube::Error::Api(err))) if err.code == 404 => Ok(false),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn create_workload(&self, workload: &WorkloadDescriptor) -> Result<ObservedWorkload> {
        let deployment = convert::to_deployment(workload, &self.namespace);
        let api = self.deployments();
        let created = self
            .timed("create deployment", api.create(&PostParams::default(), &deployment))
            .await?;

        debug!("Created deployment {}/{}", self.namespace, workload.name);
        Ok(convert::from_deployment(&created))
    }

    async fn list_workloads(&self, selector: &str) -> Result<Vec<ObservedWorkload>> {
        let api = self.deployments();
        let params = ListParams::default().labels(selector);
        let list = self.timed("list deployments", api.list(&params)).await?;

        Ok(list.items.iter().map(convert::from_deployment).collect())
    }

    async fn delete_workload(&self, name: &str) -> Result<bool> {
        let api = self.deployments();
        let result = self
            .timed("delete deployment", api.delete(name, &DeleteParams::default()))
            .await
            .map(|_| ());

        let deleted = absent_as_false(result)?;
        debug!("Deleted deployment {}/{}: {}", self.namespace, name, deleted);
        Ok(deleted)
    }

    async fn create_service(&self, service: &ServiceDescriptor) -> Result<ObservedService> {
        let svc = convert::to_service(service, &self.namespace);
        let api = self.services();
        let created = self
            .timed("create service", api.create(&PostParams::default(), &svc))
            .await?;

        debug!("Created service {}/{}", self.namespace, service.name);
        Ok(convert::from_service(&created))
    }

    async fn get_service(&self, name: &str) -> Result<Option<ObservedService>> {
        let api = self.services();
        let service = self.timed("get service", api.get_opt(name)).await?;

        Ok(service.as_ref().map(convert::from_service))
    }

    async fn delete_service(&self, name: &str) -> Result<bool> {
        let api = self.services();
        let result = self
            .timed("delete service", api.delete(name, &DeleteParams::default()))
            .await
            .map(|_| ());

        let deleted = absent_as_false(result)?;
        debug!("Deleted service {}/{}: {}", self.namespace, name, deleted);
        Ok(deleted)
    }

    async fn list_pods(&self, selector: &str) -> Result<Vec<ObservedPod>> {
        let api = self.pods();
        let params = ListParams::default().labels(selector);
        let list = self.timed("list pods", api.list(&params)).await?;

        Ok(list.items.iter().map(convert::from_pod).collect())
    }
}
