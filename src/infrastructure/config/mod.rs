//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::ConfigError;

/// Bot configuration, read once at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub gateway: GatewaySettings,
    pub marketplace: MarketplaceSettings,
    pub health: HealthSettings,
    pub limits: LimitsSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    /// First token a message must carry to be parsed as a command.
    pub trigger: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GatewaySettings {
    pub url: String,
    pub token: Option<String>,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub max_failed_connects: u32,
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MarketplaceSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HealthSettings {
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LimitsSettings {
    /// Per-channel lookup budget inside the cooldown window.
    pub cooldown_max_commands: u32,
    pub cooldown_window_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "floorbot".to_string(),
                trigger: "!floor".to_string(),
            },
            gateway: GatewaySettings {
                url: "wss://gateway.discord.gg/?v=10&encoding=json".to_string(),
                token: None,
                backoff_base_ms: 1_000,
                backoff_cap_ms: 60_000,
                max_failed_connects: 5,
                shutdown_grace_secs: 10,
            },
            marketplace: MarketplaceSettings {
                base_url: "https://api.opensea.io/api/v2".to_string(),
                api_key: None,
                timeout_secs: 5,
            },
            health: HealthSettings { port: 8080 },
            limits: LimitsSettings {
                cooldown_max_commands: 3,
                cooldown_window_secs: 30,
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides, used when no config file exists.
    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("DISCORD_TOKEN") {
            self.gateway.token = Some(token);
        }
        if let Ok(trigger) = std::env::var("BOT_TRIGGER") {
            self.bot.trigger = trigger;
        }
        if let Ok(key) = std::env::var("MARKETPLACE_API_KEY") {
            self.marketplace.api_key = Some(key);
        }
        if let Ok(port) = std::env::var("HEALTH_PORT") {
            match port.parse() {
                Ok(port) => self.health.port = port,
                Err(_) => tracing::warn!("Ignoring invalid HEALTH_PORT: {}", port),
            }
        }
    }

    /// Startup validation. Missing credentials are the only fatal error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.token.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::MissingField("gateway.token".to_string()));
        }
        if self.bot.trigger.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "bot.trigger must not be empty".to_string(),
            ));
        }
        if self.bot.trigger.split_whitespace().count() != 1 {
            return Err(ConfigError::InvalidValue(
                "bot.trigger must be a single token".to_string(),
            ));
        }
        if self.marketplace.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "marketplace.timeout-secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        let mut config = Config::default();
        config.gateway.token = Some("t-token".to_string());
        config
    }

    #[test]
    fn missing_token_is_fatal() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField(_))
        ));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn trigger_must_be_one_token() {
        let mut config = valid();
        config.bot.trigger = "".to_string();
        assert!(config.validate().is_err());

        config.bot.trigger = "two words".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_round_trips_in_kebab_case() {
        let yaml = serde_yaml::to_string(&valid()).unwrap();
        assert!(yaml.contains("backoff-base-ms"));
        assert!(yaml.contains("cooldown-max-commands"));

        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.bot.trigger, "!floor");
        assert_eq!(parsed.gateway.backoff_cap_ms, 60_000);
        assert_eq!(parsed.health.port, 8080);
    }
}
