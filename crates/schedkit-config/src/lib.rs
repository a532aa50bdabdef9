pub mod decoder;
pub mod loader;
pub mod model;

pub use decoder::{
    CONTENT_TYPE_JSON, CONTENT_TYPE_YAML, ContentType, RawConfiguration, RuntimeObject,
    decode_into,
};
pub use loader::ProfileLoader;
pub use model::{PluginConfigEntry, SchedulerProfile};
