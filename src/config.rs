use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 5000;

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("taskboard")
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct TaskboardConfig {
    /// Address the API listens on.
    pub bind: String,
    pub port: u16,
    /// Start with the demo tasks instead of an empty list.
    pub seed: bool,
    /// Where `taskctl` finds the API.
    pub server_url: String,
    pub debug_logging: bool,
}

impl Default for TaskboardConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: DEFAULT_PORT,
            seed: true,
            server_url: format!("http://localhost:{}", DEFAULT_PORT),
            debug_logging: false,
        }
    }
}

impl TaskboardConfig {
    pub fn path() -> PathBuf {
        default_config_dir().join("config.json")
    }

    /// Config file (if any) with `PORT` / `TASKBOARD_URL` applied on top.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::path())?;
        config.apply_overrides(
            std::env::var("PORT").ok().as_deref(),
            std::env::var("TASKBOARD_URL").ok().as_deref(),
        )?;
        Ok(config)
    }

    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_overrides(
        &mut self,
        port: Option<&str>,
        server_url: Option<&str>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = port {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Port(port.to_string()))?;
        }
        if let Some(url) = server_url.map(str::trim).filter(|u| !u.is_empty()) {
            self.server_url = url.to_string();
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Address(self.bind.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
