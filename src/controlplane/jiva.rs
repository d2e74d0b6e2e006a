//! Jiva volume provisioner
//!
//! Resolves claims into profiles and hands them to the storage operations of
//! the orchestration provider each profile names.

use crate::domain::ports::{VolumeProvisioner, VolumeState};
use crate::domain::Claim;
use crate::error::{Error, Result};
use crate::profile::VolumeProfile;
use crate::registry::OrchestratorRegistry;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
enum Operation {
    Add,
    Read,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add => write!(f, "add"),
            Operation::Read => write!(f, "read"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Persistent volume provisioner backed by Jiva VSMs
pub struct JivaProvisioner {
    label: String,
    name: String,
    orchestrators: Arc<OrchestratorRegistry>,
}

impl JivaProvisioner {
    pub fn new(label: &str, name: &str, orchestrators: Arc<OrchestratorRegistry>) -> Result<Self> {
        if label.trim().is_empty() {
            return Err(Error::OrchestratorBuild(
                "Label not found while building jiva provisioner".into(),
            ));
        }
        if name.trim().is_empty() {
            return Err(Error::OrchestratorBuild(
                "Name not found while building jiva provisioner".into(),
            ));
        }

        Ok(Self {
            label: label.to_string(),
            name: name.to_string(),
            orchestrators,
        })
    }

    async fn run(&self, operation: Operation, claim: &Claim) -> Result<VolumeState> {
        let profile = VolumeProfile::resolve(claim)?;
        let orchestrator = self.orchestrators.get(&profile.orchestrator)?;

        let ops = orchestrator.storage_ops().ok_or_else(|| Error::Unsupported {
            feature: "Storage operations".into(),
            provider: format!("{}:{}", orchestrator.label(), orchestrator.name()),
        })?;

        debug!(
            "{} VSM '{}' via '{}:{}'",
            operation,
            profile.vsm_name(),
            orchestrator.label(),
            orchestrator.name()
        );

        match operation {
            Operation::Add => ops.add_storage(&profile).await,
            Operation::Read => ops.read_storage(&profile).await,
            Operation::Delete => ops.delete_storage(&profile).await,
        }
    }
}

#[async_trait]
impl VolumeProvisioner for JivaProvisioner {
    fn label(&self) -> &str {
        &self.label
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, claim: &Claim) -> Result<VolumeState> {
        self.run(Operation::Add, claim).await
    }

    async fn read(&self, claim: &Claim) -> Result<VolumeState> {
        self.run(Operation::Read, claim).await
    }

    async fn delete(&self, claim: &Claim) -> Result<VolumeState> {
        self.run(Operation::Delete, claim).await
    }
}
