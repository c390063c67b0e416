use thiserror::Error;

/// Errors raised by the journal calculators.
///
/// Calculators never return partial output: any of these aborts the whole
/// computation before a number is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JournalError {
    #[error("{field} must be a positive finite number (got {value})")]
    InvalidInput { field: &'static str, value: f64 },

    #[error("unsupported trade direction: {0:?}")]
    UnsupportedDirection(String),

    #[error("invalid trade record {id}: {reason}")]
    InvalidTradeRecord { id: String, reason: String },

    #[error("trades span several currencies ({0}); select one base currency")]
    MixedCurrencies(String),

    #[error("no level band contains score {0}")]
    NoMatchingLevel(u32),

    #[error("invalid scoring configuration: {0}")]
    InvalidConfig(String),
}

impl JournalError {
    /// Id of the offending trade, when the error concerns a single record.
    pub fn record_id(&self) -> Option<&str> {
        match self {
            JournalError::InvalidTradeRecord { id, .. } => Some(id),
            _ => None,
        }
    }

    /// True when the caller supplied bad data (a 400-class response),
    /// false for configuration-integrity failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            JournalError::InvalidInput { .. }
                | JournalError::UnsupportedDirection(_)
                | JournalError::InvalidTradeRecord { .. }
                | JournalError::MixedCurrencies(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, JournalError>;
