use crate::config::engine::EngineConfig;
use crate::config::report::ReportConfig;
use crate::config::store::StoreConfig;
use crate::error::{Error, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub store: StoreConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SPLITLEDGER").separator("__"))
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        config.try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::strategy::SettlementStrategy;
    use config::FileFormat;

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(
                "[engine]\nstrategy = \"incremental\"\n\n[report]\ncurrency_symbol = \"₹\"\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.engine.strategy, SettlementStrategy::Incremental);
        assert_eq!(config.report.currency_symbol, "₹");
        assert_eq!(config.store.max_retries, 5);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn defaults_are_exact_and_optimal() {
        let config = AppConfig::default();
        assert_eq!(config.engine.strategy, SettlementStrategy::Optimal);
        assert!(config.engine.conservation_tolerance.is_zero());
        assert_eq!(config.report.currency_symbol, "");
    }
}
