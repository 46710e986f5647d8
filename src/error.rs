use thiserror::Error;

/// Failure taxonomy shared by the pipeline and the dashboard.
///
/// Per-row validation failures are deliberately absent: malformed rows are
/// filtered and counted by `etl::clean`, never raised.
#[derive(Error, Debug)]
pub enum AppError {
    /// The rate API could not be reached or returned a non-success status.
    #[error("rate source unavailable: {0}")]
    SourceUnavailable(String),

    /// A stage was invoked without output from the previous stage.
    #[error("no payload available from the previous stage")]
    MissingUpstreamPayload,

    /// Schema creation, insert, or read against a store failed.
    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),

    /// A required connection address or credential is not configured.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// The dashboard could not identify the required columns.
    #[error("schema detection failed: {0}")]
    SchemaDetection(String),

    /// Encoding or decoding at a stage boundary failed.
    #[error("stage boundary error: {0}")]
    Boundary(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Short remediation hint rendered next to dashboard errors.
    pub fn hint(&self) -> &'static str {
        match self {
            AppError::Persistence(_) | AppError::SchemaDetection(_) => {
                "Make sure the pipeline has run successfully and created the rate table."
            }
            AppError::ConfigurationMissing(_) => {
                "Set the EXCHANGE_DB_URL environment variable and restart the dashboard."
            }
            _ => "Check the pipeline logs for details.",
        }
    }
}
