use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while computing tax or solving prepayments.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// Unrecognized goal or concentration, or a concentration on a quarter
    /// that is not active for the book year.
    #[error("invalid strategy: {0}")]
    InvalidStrategy(String),

    /// Book year dates are unparseable or not chronological.
    #[error("invalid period {start}..{end}: {reason}")]
    InvalidPeriod {
        /// Start date as supplied by the caller.
        start: String,
        /// End date as supplied by the caller.
        end: String,
        /// Why the period was rejected.
        reason: String,
    },

    /// Arithmetic could not be carried out for the given inputs.
    #[error("calculation failed in {context}: {reason}")]
    CalculationFailed {
        /// Where the failure happened (field code or solver branch).
        context: String,
        /// Human-readable error description.
        reason: String,
    },

    /// A parameter table could not be loaded or failed validation.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

impl EngineError {
    pub(crate) fn invalid_period(
        start: impl ToString,
        end: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidPeriod {
            start: start.to_string(),
            end: end.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn period_order(start: NaiveDate, end: NaiveDate) -> Self {
        Self::invalid_period(start, end, "end date lies before start date")
    }
}

/// Crate-wide result type.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Non-fatal condition surfaced alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[non_exhaustive]
pub enum EngineWarning {
    /// No parameter table exists for the requested tax year; the nearest
    /// defined year was used instead.
    MissingParameters {
        /// Tax year as requested by the caller.
        requested: String,
        /// Tax year whose parameters were applied.
        used: u16,
    },
}

impl std::fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingParameters { requested, used } => write!(
                f,
                "no parameters for tax year '{requested}', using tax year {used}"
            ),
        }
    }
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "quarterly_rates.q2").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
