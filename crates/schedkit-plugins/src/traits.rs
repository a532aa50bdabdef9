use std::fmt;

use schedkit_common::Result;
use schedkit_config::RuntimeObject;

/// A named unit of scheduling logic.
pub trait Plugin: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
}

/// Framework services handed to factories. The registry only forwards it.
pub trait FrameworkHandle: Send + Sync {
    fn profile_name(&self) -> &str;
}

/// An alternate scheduling queue a registry may designate.
pub trait SchedulingQueue: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
}

/// Builds a plugin from its (possibly absent) configuration.
pub trait PluginFactory: Send + Sync {
    fn create(
        &self,
        args: Option<&dyn RuntimeObject>,
        handle: &dyn FrameworkHandle,
    ) -> Result<Box<dyn Plugin>>;
}

/// Closure wrapper returned by [`factory_fn`].
pub struct FnFactory<F>(F);

impl<F> PluginFactory for FnFactory<F>
where
    F: Fn(Option<&dyn RuntimeObject>, &dyn FrameworkHandle) -> Result<Box<dyn Plugin>>
        + Send
        + Sync,
{
    fn create(
        &self,
        args: Option<&dyn RuntimeObject>,
        handle: &dyn FrameworkHandle,
    ) -> Result<Box<dyn Plugin>> {
        (self.0)(args, handle)
    }
}

/// Turn a closure or `fn` item into a [`PluginFactory`].
pub fn factory_fn<F>(f: F) -> FnFactory<F>
where
    F: Fn(Option<&dyn RuntimeObject>, &dyn FrameworkHandle) -> Result<Box<dyn Plugin>>
        + Send
        + Sync,
{
    FnFactory(f)
}
