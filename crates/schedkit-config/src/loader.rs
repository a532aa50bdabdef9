use std::path::{Path, PathBuf};

use schedkit_common::{Error, Result};
use tracing::info;

use crate::model::SchedulerProfile;

const PROFILE_FILES: [&str; 4] = ["profile.yml", "profile.yaml", "profile.toml", "profile.json"];

/// Locates and parses scheduler profiles on disk.
pub struct ProfileLoader {
    config_dir: PathBuf,
}

impl ProfileLoader {
    pub fn new() -> Self {
        Self {
            config_dir: Self::default_config_dir(),
        }
    }

    pub fn default_config_dir() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join("schedkit"),
            None => PathBuf::from(".schedkit"),
        }
    }

    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// First profile file present in the config dir, in preference order.
    pub fn profile_file(&self) -> Option<PathBuf> {
        PROFILE_FILES
            .iter()
            .map(|name| self.config_dir.join(name))
            .find(|path| path.exists())
    }

    pub fn load(&self) -> Result<SchedulerProfile> {
        match self.profile_file() {
            Some(path) => Self::load_file(&path),
            None => {
                info!(
                    "no profile found in {}, using defaults",
                    self.config_dir.display()
                );
                Ok(SchedulerProfile::default())
            }
        }
    }

    /// Parse a profile, picking the format from the file extension.
    pub fn load_file(path: &Path) -> Result<SchedulerProfile> {
        info!("loading profile from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let profile: SchedulerProfile = match extension.as_str() {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("failed to parse YAML profile: {e}")))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("failed to parse TOML profile: {e}")))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| Error::Config(format!("failed to parse JSON profile: {e}")))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported profile format {:?} for {}",
                    other,
                    path.display()
                )));
            }
        };
        profile.validate()?;
        Ok(profile)
    }
}

impl Default for ProfileLoader {
    fn default() -> Self {
        Self::new()
    }
}
