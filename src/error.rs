use sqlx::migrate::MigrateError;
use thiserror::Error;

use crate::wallet::models::Currency;

/// Top-level error type for the reconciler
///
/// Nothing here is fatal to the scan loop: each variant is logged where it
/// occurs and only the smallest affected unit of work is skipped.
#[derive(Error, Debug)]
pub enum AppError {
    /// Network failure, non-success status or malformed body from the chain API
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Find/insert/update failure against the record store
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(Currency),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Record already exists under the same unique key
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Upstream failures are retried by the next scheduled cycle
    pub fn is_upstream(&self) -> bool {
        matches!(self, AppError::UpstreamUnavailable(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::UpstreamUnavailable(format!("HTTP request error: {:?}", error))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                return AppError::Conflict(db_error.message().to_string());
            }
        }
        AppError::StoreUnavailable(format!("Database error: {}", error))
    }
}

impl From<MigrateError> for AppError {
    fn from(error: MigrateError) -> Self {
        AppError::StoreUnavailable(format!("Migration error: {:?}", error))
    }
}

impl From<rust_decimal::Error> for AppError {
    fn from(error: rust_decimal::Error) -> Self {
        AppError::Internal(format!("Decimal conversion error: {:?}", error))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
