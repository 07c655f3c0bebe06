//! Service configuration.
//!
//! Non-secret settings live in a TOML file (`watermon.toml` by default);
//! every field has a serde default so a missing file or a partial file is
//! fine in dev mode. Secrets never go in the file: `DATABASE_URL` and
//! `GATEWAY_API_KEY` come from the environment, loaded through dotenv by
//! the binary before `Config::load` runs.

use std::path::Path;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "config read error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "config parse error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    /// Seconds between monitoring cycles.
    pub poll_interval_secs: u64,
    /// Trailing samples requested per household per cycle.
    pub samples_per_cycle: usize,
    /// Force the simulator even if a gateway is configured.
    pub simulate: bool,
}

impl Default for ServiceSection {
    fn default() -> Self {
        ServiceSection {
            poll_interval_secs: 300, // meters report every 5 minutes
            samples_per_cycle: 1,
            simulate: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Device-gateway base URL. Unset means dev mode (simulator).
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        GatewaySection {
            base_url: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifySection {
    /// Messaging-gateway base URL. Unset means console channels.
    pub gateway_url: Option<String>,
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub whatsapp_enabled: bool,
}

impl Default for NotifySection {
    fn default() -> Self {
        NotifySection {
            gateway_url: None,
            email_enabled: true,
            sms_enabled: true,
            whatsapp_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// One of debug/info/warn/error.
    pub level: String,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LogSection {
    fn default() -> Self {
        LogSection {
            level: "info".to_string(),
            file: None,
            console_timestamps: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceSection,
    pub gateway: GatewaySection,
    pub notify: NotifySection,
    pub log: LogSection,
}

impl Config {
    /// Loads from a TOML file. A missing file yields the defaults; a file
    /// that exists but fails to parse is an error. Silently running with
    /// defaults after a typo'd config has burnt people before.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Postgres connection string, if persistence is configured.
    pub fn database_url() -> Option<String> {
        std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty())
    }

    /// Bearer key for the messaging gateway.
    pub fn gateway_api_key() -> Option<String> {
        std::env::var("GATEWAY_API_KEY").ok().filter(|s| !s.is_empty())
    }

    /// Channel kinds enabled in this config, in fixed order.
    pub fn enabled_channels(&self) -> Vec<crate::model::ChannelKind> {
        use crate::model::ChannelKind;
        let mut kinds = Vec::new();
        if self.notify.email_enabled {
            kinds.push(ChannelKind::Email);
        }
        if self.notify.sms_enabled {
            kinds.push(ChannelKind::Sms);
        }
        if self.notify.whatsapp_enabled {
            kinds.push(ChannelKind::Whatsapp);
        }
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChannelKind;

    #[test]
    fn test_defaults_are_dev_mode() {
        let config = Config::default();
        assert_eq!(config.service.poll_interval_secs, 300);
        assert!(config.gateway.base_url.is_none());
        assert!(config.notify.gateway_url.is_none());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_toml_fills_missing_sections_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [service]
            poll_interval_secs = 60

            [gateway]
            base_url = "https://gw.example.net"
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.service.poll_interval_secs, 60);
        assert_eq!(config.service.samples_per_cycle, 1, "default fills in");
        assert_eq!(config.gateway.base_url.as_deref(), Some("https://gw.example.net"));
        assert!(config.notify.email_enabled, "default fills in");
    }

    #[test]
    fn test_enabled_channels_in_fixed_order() {
        let config: Config = toml::from_str(
            r#"
            [notify]
            email_enabled = true
            sms_enabled = false
            whatsapp_enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(
            config.enabled_channels(),
            vec![ChannelKind::Email, ChannelKind::Whatsapp]
        );
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let config = Config::load(Path::new("/nonexistent/watermon.toml")).unwrap();
        assert_eq!(config.service.poll_interval_secs, 300);
    }

    #[test]
    fn test_malformed_file_content_is_parse_error() {
        let err = toml::from_str::<Config>("service = \"not a table\"").unwrap_err();
        // Config::load wraps this as ConfigError::Parse; shape checked here.
        assert!(err.to_string().contains("service"));
    }
}
