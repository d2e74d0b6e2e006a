//! Volume claims
//!
//! A claim is the caller supplied request object: a name plus a flat label
//! map. It is the only place where configuration exists as untyped strings.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Caller supplied provisioning request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Name of the claim
    #[serde(default)]
    pub name: String,
    /// Configuration labels, unknown keys are ignored
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Claim {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
        }
    }

    /// Builder style label setter
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Value of a label, `None` when absent or blank
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Decode a claim from YAML (or JSON, which is a YAML subset)
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Load a claim file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }
}
