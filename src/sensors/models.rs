use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::{MetricType, SensorMetricRecord, Statistic};

/// Request body for `POST /api/v1/sensors/{sensor_id}/data`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SensorIngestPayload {
    pub location: String,
    pub sensor_type: String,
    /// Metric name → value, in payload order. Names must be one of
    /// `GET /api/v1/metrics`.
    pub metrics: IndexMap<String, f64>,
    /// RFC3339. Defaults to the time of ingestion.
    pub timestamp: Option<DateTime<Utc>>,
}

/// A validated reading, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub sensor_id: String,
    pub metrics: BTreeMap<MetricType, f64>,
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub sensor_type: String,
}

impl SensorReading {
    pub fn to_record(&self) -> SensorMetricRecord {
        let mut record = SensorMetricRecord {
            timestamp: self.timestamp,
            sensor_id: self.sensor_id.clone(),
            location: self.location.clone(),
            sensor_type: self.sensor_type.clone(),
            temperature: None,
            humidity: None,
            pressure: None,
        };
        for (&metric, &value) in &self.metrics {
            record.set(metric, value);
        }
        record
    }
}

/// Normalized filter/aggregation request.
///
/// `sensor_ids == None` selects every sensor; an empty `metrics` selects every
/// known metric. Metric names are kept raw so unknown ones can be dropped at
/// query time instead of failing the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorQuery {
    pub sensor_ids: Option<Vec<String>>,
    pub metrics: Vec<String>,
    pub statistic: Statistic,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl SensorQuery {
    /// Effective `[start, end]` window: end defaults to now, start to one day
    /// before end.
    pub fn date_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self.end_date.unwrap_or_else(Utc::now);
        let start = self.start_date.unwrap_or(end - Duration::days(1));
        (start, end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MetricResult {
    pub metric: MetricType,
    pub value: f64,
    pub statistic: Statistic,
}

/// Aggregated metrics for one sensor.
///
/// `timestamp` is the query's end bound, not the time of any stored reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SensorQueryResult {
    pub sensor_id: String,
    pub metrics: Vec<MetricResult>,
    pub timestamp: DateTime<Utc>,
}
