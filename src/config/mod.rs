use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    core::utils::{app_data_dir, config_file_in, ensure_dir},
    cpf::{CpfCalculator, CpfRateTable},
    errors::{EngineError, EngineResult},
    projection::{IncomeBasis, ProjectionRequest},
    utils::persistence::{load_json_from_file, save_json_to_file},
};

/// Longest horizon accepted from configuration or the command line.
pub const MAX_PROJECTION_MONTHS: u32 = 1200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub currency: String,
    pub cpf: CpfRateTable,
    pub projection: ProjectionDefaults,
    /// Age of the earner, used to recompute CPF when an override crosses the ceiling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: "SGD".into(),
            cpf: CpfRateTable::default(),
            projection: ProjectionDefaults::default(),
            age: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionDefaults {
    pub months: u32,
    pub include_investments: bool,
    pub income_basis: IncomeBasis,
}

impl Default for ProjectionDefaults {
    fn default() -> Self {
        Self {
            months: 60,
            include_investments: true,
            income_basis: IncomeBasis::NetOfCpf,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.currency.trim().is_empty() {
            return Err(EngineError::InvalidInput("currency must not be empty".into()));
        }
        validate_months(self.projection.months)?;
        self.cpf.validate()
    }

    /// Calculator over the configured rate table.
    pub fn calculator(&self) -> EngineResult<CpfCalculator> {
        CpfCalculator::new(self.cpf.clone())
    }

    /// Projection request seeded from the configured defaults.
    pub fn projection_request(&self, starting_balance: Decimal) -> ProjectionRequest {
        ProjectionRequest::new(self.projection.months, starting_balance)
            .with_investments(self.projection.include_investments)
            .with_income_basis(self.projection.income_basis)
    }
}

pub fn validate_months(months: u32) -> EngineResult<()> {
    if months == 0 || months > MAX_PROJECTION_MONTHS {
        return Err(EngineError::InvalidInput(format!(
            "projection horizon must be between 1 and {MAX_PROJECTION_MONTHS} months, got {months}"
        )));
    }
    Ok(())
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> EngineResult<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> EngineResult<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
        })
    }

    /// Manager for an explicit configuration file.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads and validates the configuration; a missing file yields the defaults.
    pub fn load(&self) -> EngineResult<EngineConfig> {
        let config = if self.path.exists() {
            load_json_from_file(&self.path)?
        } else {
            tracing::debug!(path = %self.path.display(), "no configuration file, using defaults");
            EngineConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &EngineConfig) -> EngineResult<()> {
        config.validate()?;
        save_json_to_file(config, &self.path)?;
        tracing::info!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
        let config = manager.load().expect("defaults");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.projection.months, 60);
        assert_eq!(config.cpf.ordinary_wage_ceiling, dec!(8000));
    }

    #[test]
    fn save_then_load_keeps_overrides() {
        let dir = tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
        let mut config = EngineConfig::default();
        config.age = Some(42);
        config.projection.months = 24;
        config.cpf.ordinary_wage_ceiling = dec!(7400);
        manager.save(&config).expect("save");

        assert!(manager.path().ends_with("config/config.json"));
        assert_eq!(manager.load().expect("load"), config);
    }

    #[test]
    fn saved_file_uses_camel_case_keys() {
        let dir = tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
        manager.save(&EngineConfig::default()).expect("save");

        let text = fs::read_to_string(manager.path()).expect("read");
        for key in ["ordinaryWageCeiling", "upToAge", "employeeRate", "includeInvestments"] {
            assert!(text.contains(key), "missing `{key}` in {text}");
        }
        assert!(!text.contains("ordinary_wage_ceiling"));
        assert!(!text.contains("up_to_age"));
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{ "currency": "USD", "projection": { "months": 12 } }"#)
            .expect("write");
        let config = ConfigManager::at_path(&path).load().expect("load");
        assert_eq!(config.currency, "USD");
        assert_eq!(config.projection.months, 12);
        assert!(config.projection.include_investments);
        assert_eq!(config.cpf, CpfRateTable::default());
    }

    #[test]
    fn misconfigured_rate_table_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            r#"{ "cpf": { "ordinaryWageCeiling": "0", "bands": [] } }"#,
        )
        .expect("write");
        let err = ConfigManager::at_path(&path).load().expect_err("invalid");
        assert!(matches!(err, EngineError::CpfConfig(_)));
    }

    #[test]
    fn request_uses_configured_defaults() {
        let mut config = EngineConfig::default();
        config.projection.income_basis = IncomeBasis::Gross;
        let request = config.projection_request(dec!(250));
        assert_eq!(request.months, 60);
        assert_eq!(request.income_basis, IncomeBasis::Gross);
        assert_eq!(request.starting_balance, dec!(250));
    }
}
