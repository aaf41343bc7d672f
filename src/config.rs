//! Panel configuration loaded from a TOML file.
//!
//! The file lives at `<config dir>/sensorpanel/config.toml`. A missing file is replaced by
//! the defaults on first start, missing keys fall back to their defaults.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "sensorpanel";
const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_HOST: &str = "192.168.1.9";
pub const DEFAULT_PORT: u16 = 9001;

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct PanelConfig {
    pub broker: BrokerConfig,
    pub publisher: PublisherConfig,
}

/// Broker endpoint and session timing.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    /// WebSocket listener port of the broker (usually 9001, not 1883)
    pub port: u16,
    /// Fixed interval between automatic reconnect attempts
    pub reconnect_period_ms: u64,
    /// Pause between tearing a client down and starting a new one on manual reconnect
    pub manual_reconnect_delay_ms: u64,
    pub keep_alive_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            reconnect_period_ms: 5000,
            manual_reconnect_delay_ms: 500,
            keep_alive_secs: 60,
        }
    }
}

impl BrokerConfig {
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    pub fn reconnect_period(&self) -> Duration {
        Duration::from_millis(self.reconnect_period_ms)
    }

    pub fn manual_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.manual_reconnect_delay_ms)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PublisherConfig {
    pub targets: Vec<PublishTarget>,
}

/// One input row on the publisher page.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PublishTarget {
    pub label: String,
    pub topic: String,
    #[serde(default)]
    pub quick_values: Vec<String>,
}

impl PublishTarget {
    fn new(label: &str, topic: &str, quick_values: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            topic: topic.to_string(),
            quick_values: quick_values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            targets: vec![
                PublishTarget::new("Temperature", "sensor/dht", &["22.5", "30.0"]),
                PublishTarget::new("Infrared", "sensor/infrared", &["DETECTED", "CLEAR"]),
                PublishTarget::new("Servo", "aktuator/servo", &["OPEN", "CLOSED"]),
                PublishTarget::new("LED", "aktuator/led", &["RED", "GREEN"]),
            ],
        }
    }
}

impl PanelConfig {
    /// Default location of the config file, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push(CONFIG_DIR);
            path.push(CONFIG_FILE);
            path
        })
    }

    /// Loads the config from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing file is created with the default settings before it is returned.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => {
                    warn!("No config directory available on this platform, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        Self::ensure_default_config(&path).await?;

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

        let config = Self::parse(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

        debug!("Loaded panel config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| eyre!("{}", e))
    }

    async fn ensure_default_config(path: &Path) -> Result<()> {
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| eyre!("Failed to serialize default config: {}", e))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write default config file: {}", e))?;

        info!("Wrote default config to {}", path.display());
        Ok(())
    }

    /// Applies command line overrides for the broker endpoint.
    pub fn with_endpoint(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.broker.host = host;
        }
        if let Some(port) = port {
            self.broker.port = port;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config = PanelConfig::parse(
            r#"
            [broker]
            host = "10.0.0.5"
            "#,
        )
        .unwrap();

        assert_eq!(config.broker.host, "10.0.0.5");
        assert_eq!(config.broker.port, DEFAULT_PORT);
        assert_eq!(config.broker.reconnect_period(), Duration::from_secs(5));
        assert_eq!(
            config.broker.manual_reconnect_delay(),
            Duration::from_millis(500)
        );
        assert_eq!(config.publisher, PublisherConfig::default());
    }

    #[test]
    fn test_ws_url_uses_host_and_port() {
        let broker = BrokerConfig::default();
        assert_eq!(broker.ws_url(), "ws://192.168.1.9:9001");
    }

    #[test]
    fn test_endpoint_overrides() {
        let config = PanelConfig::default().with_endpoint(Some("broker.local".into()), None);
        assert_eq!(config.broker.ws_url(), "ws://broker.local:9001");

        let config = config.with_endpoint(None, Some(8080));
        assert_eq!(config.broker.ws_url(), "ws://broker.local:8080");
    }

    #[test]
    fn test_publish_targets_parse_with_optional_quick_values() {
        let config = PanelConfig::parse(
            r#"
            [[publisher.targets]]
            label = "Pump"
            topic = "aktuator/pump"
            "#,
        )
        .unwrap();

        assert_eq!(config.publisher.targets.len(), 1);
        assert_eq!(config.publisher.targets[0].topic, "aktuator/pump");
        assert!(config.publisher.targets[0].quick_values.is_empty());
    }

    #[tokio::test]
    async fn test_load_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = PanelConfig::load(Some(&path)).await.unwrap();

        assert_eq!(config, PanelConfig::default());
        assert!(path.exists());

        let reloaded = PanelConfig::load(Some(&path)).await.unwrap();
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        tokio::fs::write(&path, "[broker\nport = ").await.unwrap();

        assert!(PanelConfig::load(Some(&path)).await.is_err());
    }
}
