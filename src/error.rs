// Error kinds surfaced by statement generation

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatementError {
    #[error("invalid date {input:?}: {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("customer not found: {0}")]
    CustomerNotFound(String),

    /// Failure raised by the ledger, invoice or customer store
    #[error("data access failed: {0:#}")]
    DataAccess(#[from] anyhow::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StatementError {
    /// Stable tag for callers that translate errors into messages or status codes
    pub fn kind(&self) -> &'static str {
        match self {
            StatementError::InvalidDate { .. } => "invalid_date",
            StatementError::InvalidRange { .. } => "invalid_range",
            StatementError::CustomerNotFound(_) => "customer_not_found",
            StatementError::DataAccess(_) => "data_access",
            StatementError::InvalidConfig(_) => "invalid_config",
        }
    }

    /// True for errors caused by the caller's input rather than the store
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            StatementError::InvalidDate { .. } | StatementError::InvalidRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StatementError>;
