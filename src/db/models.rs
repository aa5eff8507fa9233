use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Metrics a sensor may report. Each variant owns one nullable
/// `DOUBLE PRECISION` column on `sensor_metrics`.
///
/// Adding a metric means adding a variant here, its column in a new
/// migration, and a field on [`SensorMetricRecord`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Temperature,
    Humidity,
    Pressure,
}

impl MetricType {
    pub const ALL: [MetricType; 3] = [
        MetricType::Temperature,
        MetricType::Humidity,
        MetricType::Pressure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Temperature => "temperature",
            MetricType::Humidity => "humidity",
            MetricType::Pressure => "pressure",
        }
    }

    /// Storage column holding this metric. Only ever spliced into SQL from
    /// this fixed table, never from request input.
    pub fn column(self) -> &'static str {
        match self {
            MetricType::Temperature => "temperature",
            MetricType::Humidity => "humidity",
            MetricType::Pressure => "pressure",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricType::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMetric(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric {0:?}")]
pub struct UnknownMetric(pub String);

/// Aggregation applied per metric column over the query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Min,
    Max,
    #[default]
    #[serde(rename = "average")]
    Avg,
    Sum,
}

impl Statistic {
    pub fn as_str(self) -> &'static str {
        match self {
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Avg => "average",
            Statistic::Sum => "sum",
        }
    }

    /// SQL aggregate evaluated by the store.
    pub fn sql_function(self) -> &'static str {
        match self {
            Statistic::Min => "MIN",
            Statistic::Max => "MAX",
            Statistic::Avg => "AVG",
            Statistic::Sum => "SUM",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of `sensor_metrics`. Primary key is `(timestamp, sensor_id)`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SensorMetricRecord {
    pub timestamp: DateTime<Utc>,
    pub sensor_id: String,
    pub location: String,
    pub sensor_type: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
}

impl SensorMetricRecord {
    #[cfg(test)]
    pub fn value(&self, metric: MetricType) -> Option<f64> {
        match metric {
            MetricType::Temperature => self.temperature,
            MetricType::Humidity => self.humidity,
            MetricType::Pressure => self.pressure,
        }
    }

    fn slot(&mut self, metric: MetricType) -> &mut Option<f64> {
        match metric {
            MetricType::Temperature => &mut self.temperature,
            MetricType::Humidity => &mut self.humidity,
            MetricType::Pressure => &mut self.pressure,
        }
    }

    pub fn set(&mut self, metric: MetricType, value: f64) {
        *self.slot(metric) = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_round_trip_through_from_str() {
        for m in MetricType::ALL {
            assert_eq!(m.as_str().parse::<MetricType>().unwrap(), m);
        }
    }

    #[test]
    fn metric_from_str_is_case_sensitive() {
        assert!("Temperature".parse::<MetricType>().is_err());
        let err = "voltage".parse::<MetricType>().unwrap_err();
        assert_eq!(err, UnknownMetric("voltage".into()));
    }

    #[test]
    fn statistic_serializes_average_alias() {
        let json = serde_json::to_string(&Statistic::Avg).unwrap();
        assert_eq!(json, "\"average\"");
        assert_eq!(Statistic::default(), Statistic::Avg);
    }

    #[test]
    fn statistic_maps_to_sql_aggregate() {
        assert_eq!(Statistic::Min.sql_function(), "MIN");
        assert_eq!(Statistic::Max.sql_function(), "MAX");
        assert_eq!(Statistic::Avg.sql_function(), "AVG");
        assert_eq!(Statistic::Sum.sql_function(), "SUM");
    }

    #[test]
    fn record_set_and_value_agree_per_column() {
        let mut r = SensorMetricRecord {
            timestamp: Utc::now(),
            sensor_id: "s".into(),
            location: "l".into(),
            sensor_type: "t".into(),
            temperature: None,
            humidity: None,
            pressure: None,
        };
        r.set(MetricType::Humidity, 42.5);
        assert_eq!(r.value(MetricType::Humidity), Some(42.5));
        assert_eq!(r.humidity, Some(42.5));
        assert_eq!(r.value(MetricType::Temperature), None);
    }
}
