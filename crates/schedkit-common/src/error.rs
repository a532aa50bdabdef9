use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("a plugin named {0} already exists")]
    DuplicatePlugin(String),

    #[error("no plugin named {0} exists")]
    PluginNotFound(String),

    #[error("custom queue is registered more than one time")]
    CustomQueueAlreadySet,

    #[error("not supported content type {0}")]
    UnsupportedContentType(String),

    #[error("want args of type {expected}, got {got}")]
    TypeMismatch { expected: &'static str, got: String },

    #[error("invalid plugin name: {0:?}")]
    InvalidName(String),

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("plugin {name} failed to initialize: {reason}")]
    Plugin { name: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a factory failure for the plugin `name`.
    pub fn plugin(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Plugin {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}
