//! Navigator configuration loaded from TOML.
//!
//! ```toml
//! title = "Demo"
//! home = "http://localhost/index.html"
//! bundle_dir = "assets"
//! manifest_dirs = ["site"]
//!
//! [network]
//! connect_timeout_secs = 10
//! read_timeout_secs = 15
//! max_body_bytes = 8388608
//! offline = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use navpane_loader::HttpSettings;
use navpane_types::{Address, NavError, Result};

/// Home address used when none is configured.
pub const DEFAULT_HOME: &str = "http://localhost/index.html";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NavConfig {
    /// Window title handed to the display surface at launch.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_home")]
    pub home: String,
    #[serde(default)]
    pub network: NetworkConfig,
    /// Directory served as bundled resources under `localhost`.
    #[serde(default)]
    pub bundle_dir: Option<PathBuf>,
    /// Route manifest directories, registered in order.
    #[serde(default)]
    pub manifest_dirs: Vec<PathBuf>,
}

fn default_home() -> String {
    DEFAULT_HOME.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_max_body")]
    pub max_body_bytes: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Refuse every external request.
    #[serde(default)]
    pub offline: bool,
}

fn default_connect_timeout() -> u64 {
    10
}
fn default_read_timeout() -> u64 {
    15
}
fn default_max_body() -> usize {
    8 * 1024 * 1024
}
fn default_user_agent() -> String {
    HttpSettings::default().user_agent
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            max_body_bytes: default_max_body(),
            user_agent: default_user_agent(),
            offline: false,
        }
    }
}

impl NetworkConfig {
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            max_body_bytes: self.max_body_bytes,
            user_agent: self.user_agent.clone(),
        }
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            title: None,
            home: default_home(),
            network: NetworkConfig::default(),
            bundle_dir: None,
            manifest_dirs: Vec::new(),
        }
    }
}

impl NavConfig {
    /// Parse and validate a configuration string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: NavConfig =
            toml::from_str(toml_str).map_err(|e| NavError::Config(format!("navpane.toml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file. Relative directories are taken relative
    /// to the file's own directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// The parsed home address.
    pub fn home_address(&self) -> Result<Address> {
        Address::parse(&self.home)
    }

    fn validate(&self) -> Result<()> {
        self.home_address()
            .map_err(|e| NavError::Config(format!("home: {e}")))?;
        if self.network.max_body_bytes == 0 {
            return Err(NavError::Config(
                "network.max_body_bytes must be greater than zero".into(),
            ));
        }
        if self.network.connect_timeout_secs == 0 || self.network.read_timeout_secs == 0 {
            return Err(NavError::Config(
                "network timeouts must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    fn rebase(&mut self, base: &Path) {
        if let Some(dir) = self.bundle_dir.as_mut()
            && dir.is_relative()
        {
            *dir = base.join(&*dir);
        }
        for dir in &mut self.manifest_dirs {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}
