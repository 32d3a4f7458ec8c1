use crate::types::{MarketId, PresetName};
use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `FUNNEL_SIM__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Session defaults applied when the parameter store is seeded.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_market")]
    pub default_market: MarketId,
    #[serde(default = "default_preset")]
    pub default_preset: PresetName,
    #[serde(default)]
    pub muted: bool,
}

// Default functions
fn default_node_id() -> String {
    "sim-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_market() -> MarketId {
    MarketId::Ch
}
fn default_preset() -> PresetName {
    PresetName::Realistic
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            default_market: default_market(),
            default_preset: default_preset(),
            muted: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_source(
            config::Environment::with_prefix("FUNNEL_SIM")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_source<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder().add_source(source).build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_source(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("FUNNEL_SIM")
            .separator("__")
            .try_parsing(true)
            .source(Some(map))
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let cfg = AppConfig::from_source(env_source(&[])).unwrap();
        assert_eq!(cfg.node_id, "sim-01");
        assert_eq!(cfg.api.http_port, 8080);
        assert!(!cfg.metrics.enabled);
        assert_eq!(cfg.simulation.default_market, MarketId::Ch);
        assert_eq!(cfg.simulation.default_preset, PresetName::Realistic);
        assert!(!cfg.simulation.muted);
    }

    #[test]
    fn test_nested_overrides() {
        let cfg = AppConfig::from_source(env_source(&[
            ("FUNNEL_SIM__API__HTTP_PORT", "9000"),
            ("FUNNEL_SIM__SIMULATION__DEFAULT_MARKET", "DE"),
            ("FUNNEL_SIM__SIMULATION__DEFAULT_PRESET", "optimistic"),
        ]))
        .unwrap();
        assert_eq!(cfg.api.http_port, 9000);
        assert_eq!(cfg.simulation.default_market, MarketId::De);
        assert_eq!(cfg.simulation.default_preset, PresetName::Optimistic);
    }

    #[test]
    fn test_unknown_market_is_rejected() {
        let result = AppConfig::from_source(env_source(&[(
            "FUNNEL_SIM__SIMULATION__DEFAULT_MARKET",
            "FR",
        )]));
        assert!(result.is_err());
    }
}
