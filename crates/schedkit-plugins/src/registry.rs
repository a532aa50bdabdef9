//! The plugin registry.
//!
//! A [`Registry`] is filled during bootstrap through `register`, `unregister`,
//! `merge` and `set_custom_queue`, then turned into a [`FrozenRegistry`] with
//! [`Registry::freeze`]. Only the frozen view is handed to scheduling workers,
//! so mutation after startup cannot race with lookups.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use schedkit_common::{Error, PluginName, Result};
use schedkit_config::RuntimeObject;
use tracing::{debug, info};

use crate::traits::{FrameworkHandle, Plugin, PluginFactory, SchedulingQueue, factory_fn};

/// Mutable catalog of plugin factories plus an optional custom queue.
#[derive(Default)]
pub struct Registry {
    // Ordered so merge visits names in a stable order.
    factories: BTreeMap<PluginName, Arc<dyn PluginFactory>>,
    custom_queue: Option<Arc<dyn SchedulingQueue>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure or `fn` item as the factory for `name`.
    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<()>
    where
        F: Fn(Option<&dyn RuntimeObject>, &dyn FrameworkHandle) -> Result<Box<dyn Plugin>>
            + Send
            + Sync
            + 'static,
    {
        self.register_factory(name, Arc::new(factory_fn(factory)))
    }

    /// Register an already shared factory for `name`.
    ///
    /// Fails with [`Error::DuplicatePlugin`] if `name` is taken; the existing
    /// entry is left untouched.
    pub fn register_factory(&mut self, name: &str, factory: Arc<dyn PluginFactory>) -> Result<()> {
        let name = PluginName::new(name)?;
        self.insert(name, factory)
    }

    fn insert(&mut self, name: PluginName, factory: Arc<dyn PluginFactory>) -> Result<()> {
        if self.factories.contains_key(&name) {
            return Err(Error::DuplicatePlugin(name.into()));
        }
        debug!(plugin = %name, "registered plugin");
        self.factories.insert(name, factory);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Result<()> {
        match self.factories.remove(name) {
            Some(_) => {
                debug!(plugin = name, "unregistered plugin");
                Ok(())
            }
            None => Err(Error::PluginNotFound(name.to_string())),
        }
    }

    /// Fold `other` into this registry.
    ///
    /// A custom queue carried by `other` always replaces ours. Plugins are then
    /// registered one by one in name order; the first name already present
    /// aborts the merge with [`Error::DuplicatePlugin`], and the entries copied
    /// before it stay in place.
    pub fn merge(&mut self, other: Registry) -> Result<()> {
        if let Some(queue) = other.custom_queue {
            info!(queue = queue.name(), "merged registry overrides custom queue");
            self.custom_queue = Some(queue);
        }

        let incoming = other.factories.len();
        for (name, factory) in other.factories {
            self.insert(name, factory)?;
        }
        info!(plugins = incoming, total = self.factories.len(), "merged registry");
        Ok(())
    }

    /// Set the custom queue. Allowed once per registry.
    pub fn set_custom_queue(&mut self, queue: Arc<dyn SchedulingQueue>) -> Result<()> {
        if self.custom_queue.is_some() {
            return Err(Error::CustomQueueAlreadySet);
        }
        info!(queue = queue.name(), "registered custom queue");
        self.custom_queue = Some(queue);
        Ok(())
    }

    pub fn custom_queue(&self) -> Option<&Arc<dyn SchedulingQueue>> {
        self.custom_queue.as_ref()
    }

    /// Factory registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn PluginFactory>> {
        self.factories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(PluginName::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// End the initialization phase.
    pub fn freeze(self) -> FrozenRegistry {
        info!(
            plugins = self.factories.len(),
            custom_queue = self.custom_queue.is_some(),
            "registry frozen"
        );
        FrozenRegistry {
            inner: Arc::new(self),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("plugins", &self.names())
            .field("custom_queue", &self.custom_queue)
            .finish()
    }
}

/// Read-only registry shared with scheduling workers.
#[derive(Clone, Debug)]
pub struct FrozenRegistry {
    inner: Arc<Registry>,
}

impl FrozenRegistry {
    pub fn get(&self, name: &str) -> Option<&Arc<dyn PluginFactory>> {
        self.inner.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.inner.names()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn custom_queue(&self) -> Option<&Arc<dyn SchedulingQueue>> {
        self.inner.custom_queue()
    }
}
