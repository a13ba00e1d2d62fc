//! TOML configuration for every run mode.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! [backtest]
//! initial_deposit = 5000
//! recurring_deposit = 500
//! deposit_weekday = "Mon"
//!
//! [dip]
//! enabled = true
//! min_pullback_pct = 10
//!
//! [exits]
//! trailing_stop_pct = 0.15
//! take_profit_pct = 0.15
//!
//! [live]
//! max_signals_per_window = 39
//! window_duration_days = 90
//! ```

use std::path::{Path, PathBuf};

use chrono::Weekday;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use siglab_core::dip::DipBuyRule;
use siglab_core::engine::EngineConfig;
use siglab_core::exits::{StaggeredEntry, TakeProfitTrailing, TrailingStop};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiglabConfig {
    pub backtest: BacktestSection,
    pub dip: DipSection,
    pub exits: ExitSection,
    pub live: LiveSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub initial_deposit: Decimal,
    pub recurring_deposit: Decimal,
    pub deposit_weekday: Weekday,
    /// Decimal places kept on share quantities.
    pub quantity_scale: u32,
    /// Ticker whose bars mark open market days. Any ticker when unset.
    pub reference_ticker: Option<String>,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_deposit: dec!(5000),
            recurring_deposit: dec!(500),
            deposit_weekday: Weekday::Mon,
            quantity_scale: 8,
            reference_ticker: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DipSection {
    pub enabled: bool,
    pub min_pullback_pct: Decimal,
    pub min_days_between_buys: i64,
    pub max_dip_buys: usize,
}

impl Default for DipSection {
    fn default() -> Self {
        let rule = DipBuyRule::default();
        Self {
            enabled: true,
            min_pullback_pct: rule.min_pullback_pct,
            min_days_between_buys: rule.min_days_between_buys,
            max_dip_buys: rule.max_dip_buys,
        }
    }
}

impl DipSection {
    pub fn rule(&self) -> DipBuyRule {
        DipBuyRule {
            min_pullback_pct: self.min_pullback_pct,
            min_days_between_buys: self.min_days_between_buys,
            max_dip_buys: self.max_dip_buys,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitSection {
    pub trailing_stop_pct: f64,
    /// Zero disables the take-profit strategy.
    pub take_profit_pct: f64,
    pub stagger_entry: bool,
    /// Fraction bought on the signal date.
    pub stagger_pct: f64,
    /// Calendar days after the buy date searched for a dip.
    pub entry_window_days: u32,
    /// How many days forward a missing buy/sell price is looked up.
    pub quote_retry_days: u32,
}

impl Default for ExitSection {
    fn default() -> Self {
        Self {
            trailing_stop_pct: 0.15,
            take_profit_pct: 0.15,
            stagger_entry: true,
            stagger_pct: 0.8,
            entry_window_days: 7,
            quote_retry_days: 10,
        }
    }
}

impl ExitSection {
    /// Range checks for the exit constructors, which panic outside them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(self.trailing_stop_pct > 0.0 && self.trailing_stop_pct < 1.0) {
            return invalid(format!(
                "exits.trailing_stop_pct must be in (0, 1), got {}",
                self.trailing_stop_pct
            ));
        }
        if !(self.take_profit_pct >= 0.0 && self.take_profit_pct.is_finite()) {
            return invalid(format!(
                "exits.take_profit_pct must be >= 0, got {}",
                self.take_profit_pct
            ));
        }
        if !(0.0..=1.0).contains(&self.stagger_pct) {
            return invalid(format!(
                "exits.stagger_pct must be in [0, 1], got {}",
                self.stagger_pct
            ));
        }
        Ok(())
    }

    pub fn trailing_stop(&self) -> TrailingStop {
        TrailingStop::new(self.trailing_stop_pct)
    }

    pub fn take_profit(&self) -> Option<TakeProfitTrailing> {
        (self.take_profit_pct > 0.0)
            .then(|| TakeProfitTrailing::new(self.take_profit_pct, self.trailing_stop_pct))
    }

    pub fn staggered(&self) -> Option<StaggeredEntry> {
        self.stagger_entry
            .then(|| StaggeredEntry::new(self.stagger_pct, self.trailing_stop()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveSection {
    pub max_signals_per_window: u32,
    pub window_duration_days: u32,
    /// Per-signal amount used when no allocation window exists.
    pub default_allocation: Decimal,
    pub dip_buys: bool,
}

impl Default for LiveSection {
    fn default() -> Self {
        Self {
            max_signals_per_window: 39,
            window_duration_days: 90,
            default_allocation: dec!(1000),
            dip_buys: false,
        }
    }
}

impl SiglabConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// `from_file` when a path is given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.backtest.initial_deposit < Decimal::ZERO {
            return invalid(format!(
                "backtest.initial_deposit must be >= 0, got {}",
                self.backtest.initial_deposit
            ));
        }
        if self.backtest.recurring_deposit < Decimal::ZERO {
            return invalid(format!(
                "backtest.recurring_deposit must be >= 0, got {}",
                self.backtest.recurring_deposit
            ));
        }
        if self.backtest.quantity_scale > 12 {
            return invalid(format!(
                "backtest.quantity_scale must be <= 12, got {}",
                self.backtest.quantity_scale
            ));
        }
        if self.dip.min_pullback_pct < Decimal::ZERO {
            return invalid(format!(
                "dip.min_pullback_pct must be >= 0, got {}",
                self.dip.min_pullback_pct
            ));
        }
        if self.dip.min_days_between_buys < 0 {
            return invalid(format!(
                "dip.min_days_between_buys must be >= 0, got {}",
                self.dip.min_days_between_buys
            ));
        }
        self.exits.validate()?;
        if self.live.max_signals_per_window == 0 {
            return invalid("live.max_signals_per_window must be > 0".into());
        }
        if self.live.window_duration_days == 0 {
            return invalid("live.window_duration_days must be > 0".into());
        }
        if self.live.default_allocation <= Decimal::ZERO {
            return invalid(format!(
                "live.default_allocation must be > 0, got {}",
                self.live.default_allocation
            ));
        }
        Ok(())
    }

    /// Engine settings for the backtest consumer.
    pub fn backtest_engine(&self) -> EngineConfig {
        EngineConfig::backtest()
            .with_dip_rule(self.dip.enabled.then(|| self.dip.rule()))
            .with_quantity_scale(self.backtest.quantity_scale)
    }

    /// Engine settings for the live consumer at a flat per-signal amount.
    pub fn live_engine(&self, allocation_per_signal: Decimal) -> EngineConfig {
        EngineConfig::live(allocation_per_signal)
            .with_dip_rule((self.dip.enabled && self.live.dip_buys).then(|| self.dip.rule()))
            .with_quantity_scale(self.backtest.quantity_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = SiglabConfig::from_toml("").unwrap();
        assert_eq!(config, SiglabConfig::default());
        assert_eq!(config.backtest.initial_deposit, dec!(5000));
        assert_eq!(config.backtest.deposit_weekday, Weekday::Mon);
        assert_eq!(config.live.max_signals_per_window, 39);
        assert!(!config.live.dip_buys);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SiglabConfig::from_toml(
            r#"
            [backtest]
            initial_deposit = 10000
            deposit_weekday = "Fri"

            [exits]
            take_profit_pct = 0.0
            "#,
        )
        .unwrap();
        assert_eq!(config.backtest.initial_deposit, dec!(10000));
        assert_eq!(config.backtest.recurring_deposit, dec!(500));
        assert_eq!(config.backtest.deposit_weekday, Weekday::Fri);
        assert!(config.exits.take_profit().is_none());
        assert!(config.exits.staggered().is_some());
    }

    #[test]
    fn rejects_out_of_range_stop() {
        let err = SiglabConfig::from_toml("[exits]\ntrailing_stop_pct = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("trailing_stop_pct")));
    }

    #[test]
    fn exit_section_validates_on_its_own() {
        assert!(ExitSection::default().validate().is_ok());
        let nan_stagger = ExitSection {
            stagger_pct: f64::NAN,
            ..ExitSection::default()
        };
        assert!(matches!(nan_stagger.validate(), Err(ConfigError::Invalid(msg)) if msg.contains("stagger_pct")));
        let negative_take_profit = ExitSection {
            take_profit_pct: -0.1,
            ..ExitSection::default()
        };
        assert!(negative_take_profit.validate().is_err());
    }

    #[test]
    fn rejects_zero_window() {
        let err = SiglabConfig::from_toml("[live]\nmax_signals_per_window = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = SiglabConfig::from_toml("[backtest\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn live_engine_honours_dip_switch() {
        let mut config = SiglabConfig::default();
        assert!(config.live_engine(dec!(100)).dip_rule.is_none());
        config.live.dip_buys = true;
        assert!(config.live_engine(dec!(100)).dip_rule.is_some());
        config.dip.enabled = false;
        assert!(config.backtest_engine().dip_rule.is_none());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SiglabConfig::from_file(Path::new("/nonexistent/siglab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
