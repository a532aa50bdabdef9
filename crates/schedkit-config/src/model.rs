use std::collections::{BTreeMap, BTreeSet, HashSet};

use schedkit_common::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::decoder::RawConfiguration;

/// A scheduler profile: which plugins run and with what arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerProfile {
    #[serde(default = "default_scheduler_name")]
    pub scheduler_name: String,

    /// Enabled plugins, in the order they are instantiated.
    #[serde(default)]
    pub plugins: Vec<String>,

    #[serde(default)]
    pub plugin_config: Vec<PluginConfigEntry>,

    #[serde(default)]
    pub feature_gates: BTreeMap<String, bool>,
}

impl Default for SchedulerProfile {
    fn default() -> Self {
        Self {
            scheduler_name: default_scheduler_name(),
            plugins: Vec::new(),
            plugin_config: Vec::new(),
            feature_gates: BTreeMap::new(),
        }
    }
}

fn default_scheduler_name() -> String {
    "default-scheduler".to_string()
}

/// Arguments for one plugin.
///
/// Either structured `args`, or a `raw` document with its `content_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfigEntry {
    pub name: String,

    #[serde(default)]
    pub args: serde_json::Value,

    #[serde(default)]
    pub content_type: Option<String>,

    #[serde(default)]
    pub raw: Option<String>,
}

impl PluginConfigEntry {
    pub fn to_raw(&self) -> Result<Option<RawConfiguration>> {
        if let Some(raw) = &self.raw {
            let content_type = self.content_type.as_deref().unwrap_or_default();
            return Ok(Some(RawConfiguration::new(content_type, raw.as_bytes())));
        }
        if self.args.is_null() {
            return Ok(None);
        }
        RawConfiguration::from_value(&self.args).map(Some)
    }
}

impl SchedulerProfile {
    pub fn validate(&self) -> Result<()> {
        if self.scheduler_name.trim().is_empty() {
            return Err(Error::Config("scheduler_name must not be empty".into()));
        }

        let mut enabled = HashSet::new();
        for name in &self.plugins {
            if name.trim().is_empty() {
                return Err(Error::Config(format!(
                    "profile {}: enabled plugin name must not be empty",
                    self.scheduler_name
                )));
            }
            if !enabled.insert(name.as_str()) {
                return Err(Error::Config(format!(
                    "profile {}: plugin {} is enabled more than once",
                    self.scheduler_name, name
                )));
            }
        }

        let mut configured = HashSet::new();
        for entry in &self.plugin_config {
            if entry.name.trim().is_empty() {
                return Err(Error::Config(format!(
                    "profile {}: plugin_config entry without a name",
                    self.scheduler_name
                )));
            }
            if !configured.insert(entry.name.as_str()) {
                return Err(Error::Config(format!(
                    "profile {}: repeated config for plugin {}",
                    self.scheduler_name, entry.name
                )));
            }
            if entry.raw.is_some() && !entry.args.is_null() {
                return Err(Error::Config(format!(
                    "profile {}: plugin {} sets both args and raw",
                    self.scheduler_name, entry.name
                )));
            }
        }
        Ok(())
    }

    /// Raw arguments configured for `name`, if any.
    pub fn args_for(&self, name: &str) -> Result<Option<RawConfiguration>> {
        match self.plugin_config.iter().find(|entry| entry.name == name) {
            Some(entry) => entry.to_raw(),
            None => Ok(None),
        }
    }

    pub fn enabled_feature_gates(&self) -> BTreeSet<String> {
        self.feature_gates
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.clone())
            .collect()
    }
}
