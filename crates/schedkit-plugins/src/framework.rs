use std::collections::HashSet;
use std::sync::Arc;

use schedkit_common::{Error, Result};
use schedkit_config::{RuntimeObject, SchedulerProfile};
use tracing::{debug, info, warn};

use crate::registry::FrozenRegistry;
use crate::traits::{FrameworkHandle, Plugin, SchedulingQueue};

/// Minimal handle carrying the profile name.
#[derive(Debug, Clone)]
pub struct BasicHandle {
    profile_name: String,
}

impl BasicHandle {
    pub fn new(profile_name: impl Into<String>) -> Self {
        Self {
            profile_name: profile_name.into(),
        }
    }
}

impl FrameworkHandle for BasicHandle {
    fn profile_name(&self) -> &str {
        &self.profile_name
    }
}

/// The plugins of one scheduler profile, instantiated from a frozen registry.
#[derive(Debug)]
pub struct Framework {
    profile_name: String,
    plugins: Vec<Box<dyn Plugin>>,
    custom_queue: Option<Arc<dyn SchedulingQueue>>,
}

impl Framework {
    /// Instantiate every plugin the profile enables, in profile order.
    pub fn new(
        registry: &FrozenRegistry,
        profile: &SchedulerProfile,
        handle: &dyn FrameworkHandle,
    ) -> Result<Self> {
        profile.validate()?;

        let enabled: HashSet<&str> = profile.plugins.iter().map(String::as_str).collect();
        for entry in &profile.plugin_config {
            if !enabled.contains(entry.name.as_str()) {
                warn!(
                    profile = %profile.scheduler_name,
                    plugin = %entry.name,
                    "ignoring config for plugin that is not enabled"
                );
            }
        }

        let mut plugins = Vec::with_capacity(profile.plugins.len());
        for name in &profile.plugins {
            let factory = registry
                .get(name)
                .ok_or_else(|| Error::PluginNotFound(name.clone()))?;
            let args = profile.args_for(name)?;
            let plugin = factory.create(args.as_ref().map(|raw| raw as &dyn RuntimeObject), handle)?;
            debug!(profile = %profile.scheduler_name, plugin = %name, "initialized plugin");
            plugins.push(plugin);
        }

        info!(
            profile = %profile.scheduler_name,
            plugins = plugins.len(),
            custom_queue = registry.custom_queue().is_some(),
            "framework initialized"
        );
        Ok(Self {
            profile_name: profile.scheduler_name.clone(),
            plugins,
            custom_queue: registry.custom_queue().cloned(),
        })
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn plugins(&self) -> &[Box<dyn Plugin>] {
        &self.plugins
    }

    pub fn plugin(&self, name: &str) -> Option<&dyn Plugin> {
        self.plugins
            .iter()
            .find(|plugin| plugin.name() == name)
            .map(|plugin| plugin.as_ref())
    }

    pub fn custom_queue(&self) -> Option<&Arc<dyn SchedulingQueue>> {
        self.custom_queue.as_ref()
    }
}
