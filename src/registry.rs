//! Plugin Registries
//!
//! Name → factory tables for orchestration providers and volume
//! provisioners. Registries are plain values built once at process start and
//! shared by `Arc`; there is no global state. Registration is expected only
//! during start-up, lookups happen per request.

use crate::controlplane::jiva::JivaProvisioner;
use crate::controlplane::k8s::K8sOrchestrator;
use crate::domain::ports::{ClusterConnectorRef, OrchestratorProviderRef, VolumeProvisionerRef};
use crate::error::{Error, Result};
use crate::profile::labels;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

// =============================================================================
// Generic Registry
// =============================================================================

/// A mutex guarded name → factory map
pub struct Registry<F> {
    kind: &'static str,
    entries: Mutex<BTreeMap<String, F>>,
}

impl<F: Clone> Registry<F> {
    /// Create an empty registry; `kind` names what is registered in messages
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Register a factory under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered: two plugins claiming one
    /// identity is a programming error.
    pub fn register(&self, name: impl Into<String>, factory: F) {
        let name = name.into();
        let mut entries = self.entries.lock();

        if entries.contains_key(&name) {
            panic!("{} '{}' was registered twice", self.kind, name);
        }

        info!("Registered '{}' as {}", name, self.kind);
        entries.insert(name, factory);
    }

    /// Look up the factory registered under `name`
    pub fn lookup(&self, name: &str) -> Option<F> {
        self.entries.lock().get(name).cloned()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    fn not_registered(&self, name: &str) -> Error {
        Error::NotRegistered {
            kind: with_article(self.kind),
            name: name.to_string(),
        }
    }
}

/// Prefix `noun` with "a" or "an"
fn with_article(noun: &str) -> String {
    let vowel = noun
        .chars()
        .next()
        .map_or(false, |c| "aeiou".contains(c.to_ascii_lowercase()));
    format!("{} {}", if vowel { "an" } else { "a" }, noun)
}

// =============================================================================
// Orchestrator Registry
// =============================================================================

/// Builds an orchestration provider from its label and registered name
pub type OrchestratorFactory =
    Arc<dyn Fn(&str, &str) -> Result<OrchestratorProviderRef> + Send + Sync>;

pub struct OrchestratorRegistry(Registry<OrchestratorFactory>);

impl OrchestratorRegistry {
    pub fn new() -> Self {
        Self(Registry::new("orchestration provider"))
    }

    pub fn register(&self, name: impl Into<String>, factory: OrchestratorFactory) {
        self.0.register(name, factory)
    }

    pub fn lookup(&self, name: &str) -> Option<OrchestratorFactory> {
        self.0.lookup(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.0.names()
    }

    /// Build a new instance of the named orchestration provider
    pub fn get(&self, name: &str) -> Result<OrchestratorProviderRef> {
        let factory = self.lookup(name).ok_or_else(|| self.0.not_registered(name))?;
        debug!("Building orchestration provider '{}'", name);
        factory(labels::ORCHESTRATOR_NAME, name)
    }
}

impl Default for OrchestratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Volume Provisioner Registry
// =============================================================================

/// Builds a volume provisioner from its label and registered name
pub type VolumeProvisionerFactory =
    Arc<dyn Fn(&str, &str) -> Result<VolumeProvisionerRef> + Send + Sync>;

pub struct VolumeProvisionerRegistry(Registry<VolumeProvisionerFactory>);

impl VolumeProvisionerRegistry {
    pub fn new() -> Self {
        Self(Registry::new("persistent volume provisioner"))
    }

    pub fn register(&self, name: impl Into<String>, factory: VolumeProvisionerFactory) {
        self.0.register(name, factory)
    }

    pub fn lookup(&self, name: &str) -> Option<VolumeProvisionerFactory> {
        self.0.lookup(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.0.names()
    }

    /// Build a new instance of the named volume provisioner
    pub fn get(&self, name: &str) -> Result<VolumeProvisionerRef> {
        let factory = self.lookup(name).ok_or_else(|| self.0.not_registered(name))?;
        debug!("Building persistent volume provisioner '{}'", name);
        factory(labels::VOLUME_PROVISIONER_NAME, name)
    }
}

impl Default for VolumeProvisionerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Registries
// =============================================================================

/// Both registries, wired together
#[derive(Clone)]
pub struct Registries {
    pub orchestrators: Arc<OrchestratorRegistry>,
    pub provisioners: Arc<VolumeProvisionerRegistry>,
}

impl Registries {
    /// Registries holding the Kubernetes orchestrator and the Jiva provisioner
    pub fn with_defaults(connector: ClusterConnectorRef) -> Self {
        let orchestrators = Arc::new(OrchestratorRegistry::new());
        let provisioners = Arc::new(VolumeProvisionerRegistry::new());

        orchestrators.register(
            labels::DEFAULT_ORCHESTRATOR,
            Arc::new(move |label: &str, name: &str| -> Result<OrchestratorProviderRef> {
                let orchestrator = K8sOrchestrator::new(label, name, connector.clone())?;
                Ok(Arc::new(orchestrator) as OrchestratorProviderRef)
            }),
        );

        let lookup = orchestrators.clone();
        provisioners.register(
            labels::DEFAULT_VOLUME_PROVISIONER,
            Arc::new(move |label: &str, name: &str| -> Result<VolumeProvisionerRef> {
                let provisioner = JivaProvisioner::new(label, name, lookup.clone())?;
                Ok(Arc::new(provisioner) as VolumeProvisionerRef)
            }),
        );

        Self {
            orchestrators,
            provisioners,
        }
    }
}
