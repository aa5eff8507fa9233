/// Malformed or out-of-range query-string / path input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("Invalid 'stat' value {0:?}. Use one of: average, min, max, sum")]
    InvalidStatistic(String),
    #[error("'days' must be between 1 and 31, got {0}")]
    DaysOutOfRange(i64),
}

/// Ingestion payload rejected before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("sensor_id cannot be empty")]
    EmptySensorId,
    #[error("At least one metric is required")]
    NoMetrics,
    #[error("'sensor_type' must be a non-empty string")]
    EmptySensorType,
    #[error("'location' must be a non-empty string")]
    EmptyLocation,
    #[error("Metric names must be non-empty strings")]
    EmptyMetricName,
    #[error("Unknown metric '{0}'. See /api/v1/metrics for allowed values")]
    UnknownMetric(String),
    #[error("Metric '{0}' must be a finite number")]
    NonFiniteMetric(String),
}
