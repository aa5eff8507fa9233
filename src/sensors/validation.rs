use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{
    error::ValidationError,
    models::{SensorIngestPayload, SensorReading},
};
use crate::db::models::MetricType;

/// Check an ingestion request. The first failing rule wins.
pub fn validate_ingest(sensor_id: &str, payload: &SensorIngestPayload) -> Result<(), ValidationError> {
    if sensor_id.trim().is_empty() {
        return Err(ValidationError::EmptySensorId);
    }
    if payload.metrics.is_empty() {
        return Err(ValidationError::NoMetrics);
    }
    if payload.sensor_type.trim().is_empty() {
        return Err(ValidationError::EmptySensorType);
    }
    if payload.location.trim().is_empty() {
        return Err(ValidationError::EmptyLocation);
    }
    for (name, value) in &payload.metrics {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyMetricName);
        }
        if name.parse::<MetricType>().is_err() {
            return Err(ValidationError::UnknownMetric(name.clone()));
        }
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteMetric(name.clone()));
        }
    }
    Ok(())
}

/// Validate and convert to a typed reading, stamping `now` when the payload
/// carries no timestamp.
pub fn into_reading(
    sensor_id: &str,
    payload: SensorIngestPayload,
    now: DateTime<Utc>,
) -> Result<SensorReading, ValidationError> {
    validate_ingest(sensor_id, &payload)?;

    let metrics = payload
        .metrics
        .into_iter()
        .map(|(name, value)| {
            name.parse::<MetricType>()
                .map(|m| (m, value))
                .map_err(|_| ValidationError::UnknownMetric(name))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(SensorReading {
        sensor_id: sensor_id.to_owned(),
        metrics,
        timestamp: payload.timestamp.unwrap_or(now),
        location: payload.location,
        sensor_type: payload.sensor_type,
    })
}
