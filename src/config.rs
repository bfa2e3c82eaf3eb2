// ⚙️ Statement Configuration - Knobs as data
// Loaded from a JSON file; every field has a default so an empty object is valid.

use crate::error::{Result as StatementResult, StatementError};
use crate::report::ColumnLabels;
use anyhow::{Context as AnyhowContext, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// AGING THRESHOLDS
// ============================================================================

/// Inclusive upper bounds (in days) of the aging buckets.
///
/// An invoice aged `d` days lands in the first bucket whose bound is `>= d`;
/// anything above `days_61_90_max` is over 90.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgingThresholds {
    pub current_max_days: i64,
    pub days_1_30_max: i64,
    pub days_31_60_max: i64,
    pub days_61_90_max: i64,
}

impl Default for AgingThresholds {
    fn default() -> Self {
        AgingThresholds {
            current_max_days: 0,
            days_1_30_max: 30,
            days_31_60_max: 60,
            days_61_90_max: 90,
        }
    }
}

impl AgingThresholds {
    fn is_ascending(&self) -> bool {
        self.current_max_days < self.days_1_30_max
            && self.days_1_30_max < self.days_31_60_max
            && self.days_31_60_max < self.days_61_90_max
    }
}

// ============================================================================
// STATEMENT CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementConfig {
    /// Start date used when the caller gives none
    pub epoch_floor: NaiveDate,

    pub aging: AgingThresholds,

    /// Number of hex characters in a statement identifier (1..=32)
    pub statement_id_length: usize,

    /// Description of the synthetic first row
    pub balance_forward_label: String,

    /// Report grid headings, in the reader's language
    pub column_labels: ColumnLabels,
}

impl Default for StatementConfig {
    fn default() -> Self {
        StatementConfig {
            epoch_floor: default_epoch_floor(),
            aging: AgingThresholds::default(),
            statement_id_length: 6,
            balance_forward_label: "Balance Forward".to_string(),
            column_labels: ColumnLabels::default(),
        }
    }
}

fn default_epoch_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl StatementConfig {
    /// Load configuration from a JSON file and validate it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: StatementConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;

        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> StatementResult<()> {
        if !self.aging.is_ascending() {
            return Err(StatementError::InvalidConfig(format!(
                "aging thresholds must be strictly ascending, got {:?}",
                self.aging
            )));
        }

        if !(1..=32).contains(&self.statement_id_length) {
            return Err(StatementError::InvalidConfig(format!(
                "statement_id_length must be between 1 and 32, got {}",
                self.statement_id_length
            )));
        }

        if self.balance_forward_label.trim().is_empty() {
            return Err(StatementError::InvalidConfig(
                "balance_forward_label must not be empty".to_string(),
            ));
        }

        if !self.column_labels.is_complete() {
            return Err(StatementError::InvalidConfig(
                "column_labels must all be non-empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StatementConfig::default();

        assert_eq!(config.epoch_floor, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(config.aging.current_max_days, 0);
        assert_eq!(config.aging.days_61_90_max, 90);
        assert_eq!(config.statement_id_length, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: StatementConfig =
            serde_json::from_str(r#"{"aging": {"current_max_days": 30, "days_1_30_max": 60, "days_31_60_max": 90, "days_61_90_max": 120}}"#)
                .unwrap();

        assert_eq!(config.aging.current_max_days, 30);
        assert_eq!(config.statement_id_length, 6);
        assert_eq!(config.balance_forward_label, "Balance Forward");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let mut config = StatementConfig::default();
        config.aging.days_31_60_max = 20;

        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), "invalid_config");
    }

    #[test]
    fn test_rejects_bad_id_length() {
        let mut config = StatementConfig::default();
        config.statement_id_length = 0;
        assert!(config.validate().is_err());

        config.statement_id_length = 33;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"epoch_floor": "1990-01-01", "statement_id_length": 8}}"#).unwrap();

        let config = StatementConfig::from_file(file.path()).unwrap();
        assert_eq!(config.epoch_floor, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        assert_eq!(config.statement_id_length, 8);

        println!("✅ Config file loading test passed");
    }

    #[test]
    fn test_localized_labels() {
        let config: StatementConfig = serde_json::from_str(
            r#"{"balance_forward_label": "Saldo anterior", "column_labels": {"date": "Fecha", "balance": "Saldo"}}"#,
        )
        .unwrap();

        assert_eq!(config.column_labels.date, "Fecha");
        assert_eq!(config.column_labels.amount, "Amount");
        assert!(config.validate().is_ok());

        let mut config = config;
        config.column_labels.description = " ".to_string();
        assert_eq!(config.validate().unwrap_err().kind(), "invalid_config");
    }

    #[test]
    fn test_from_file_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"statement_id_length": 64}}"#).unwrap();

        assert!(StatementConfig::from_file(file.path()).is_err());
    }
}
