use thiserror::Error;

/// Construction-time validation failures.
///
/// `update`, `read` and `snapshot` never fail; only building a metric from
/// bad parameters (or asking for a nonsensical quantile) does.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("unknown time unit \"{0}\"")]
    UnknownTimeUnit(String),

    #[error("quantile {0} is outside [0, 1]")]
    QuantileOutOfRange(f64),

    #[error("reservoir capacity must be positive, got {0}")]
    InvalidCapacity(usize),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
