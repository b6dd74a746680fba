//! YAML configuration.
//!
//! Every section tolerates omission: missing keys fall back to defaults,
//! so a minimal file can carry only credentials and symbols. Risk limits
//! are clamped again inside the risk gate regardless of what the file
//! says.

use anyhow::{bail, Context, Result};
use opus_models::Symbol;
use opus_risk::RiskConfig;
use opus_strategy::SignalFilterConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub exchange: ExchangeSettings,
    pub trading: TradingSettings,
    pub strategy: StrategySettings,
    pub risk: RiskConfig,
    pub notification: NotificationSettings,
    pub recording: RecordingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeSettings {
    pub api_key: String,
    pub secret_key: String,
    /// `paper`, `testnet`, or `mainnet`.
    pub environment: String,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_key: String::new(),
            environment: "paper".to_string(),
        }
    }
}

impl ExchangeSettings {
    pub fn is_paper(&self) -> bool {
        self.environment.eq_ignore_ascii_case("paper")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingSettings {
    /// When false, approved intents are logged but nothing is placed.
    pub enabled: bool,
    pub symbols: Vec<String>,
}

impl Default for TradingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            symbols: vec!["BTCUSDT".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub obi: ObiSettings,
    pub filter: SignalFilterConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObiSettings {
    pub depth_levels: usize,
    /// Raw-signal threshold used for statistics; qualification uses the
    /// filter's own threshold.
    pub imbalance_threshold: f64,
    pub smoothing_period: u64,
}

impl Default for ObiSettings {
    fn default() -> Self {
        Self {
            depth_levels: 10,
            imbalance_threshold: 0.3,
            smoothing_period: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Only `log` ships in-core.
    pub sink: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            sink: "log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    pub enabled: bool,
    pub path: String,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "data/ticks.bin".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("could not parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.trading.symbols.is_empty() {
            bail!("trading.symbols must name at least one symbol");
        }
        if !self.exchange.is_paper()
            && (self.exchange.api_key.is_empty() || self.exchange.secret_key.is_empty())
        {
            bail!(
                "exchange.environment '{}' requires api_key and secret_key",
                self.exchange.environment
            );
        }
        Ok(())
    }

    /// The engine trades one symbol; the first configured one wins.
    pub fn primary_symbol(&self) -> Symbol {
        Symbol::new(self.trading.symbols.first().map(String::as_str).unwrap_or("BTCUSDT"))
    }
}
