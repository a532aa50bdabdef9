pub mod builtin;
pub mod features;
pub mod framework;
pub mod registry;
pub mod traits;

pub use builtin::in_tree_registry;
pub use features::{Features, factory_with_features};
pub use framework::{BasicHandle, Framework};
pub use registry::{FrozenRegistry, Registry};
pub use traits::{FnFactory, FrameworkHandle, Plugin, PluginFactory, SchedulingQueue, factory_fn};
