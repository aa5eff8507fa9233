//! Grouped statistics over `sensor_metrics`.
//!
//! One `GROUP BY sensor_id` query is issued per request, with the chosen
//! aggregate applied to each requested metric column. Aggregation happens in
//! the database; this module only assembles the SQL and shapes the rows.

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Postgres, QueryBuilder, Row};
use tracing::debug;

use super::models::{MetricResult, SensorQuery, SensorQueryResult};
use crate::db::models::{MetricType, Statistic};

/// One grouped row: the sensor and one aggregate per requested metric, in
/// the same order as the metric list used to build the query.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub sensor_id: String,
    pub values: Vec<Option<f64>>,
}

/// Requested metric names mapped onto known columns. Unknown names are
/// dropped; an empty request selects every metric.
pub fn effective_metrics(requested: &[String]) -> Vec<MetricType> {
    if requested.is_empty() {
        return MetricType::ALL.to_vec();
    }
    let mut metrics: Vec<MetricType> = Vec::with_capacity(requested.len());
    for m in requested.iter().filter_map(|name| name.parse().ok()) {
        if !metrics.contains(&m) {
            metrics.push(m);
        }
    }
    metrics
}

fn value_alias(metric: MetricType) -> String {
    format!("{}_value", metric.column())
}

pub fn build_aggregate_query(
    metrics: &[MetricType],
    statistic: Statistic,
    sensor_ids: Option<&[String]>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> QueryBuilder<'static, Postgres> {
    let func = statistic.sql_function();
    let mut qb = QueryBuilder::new("SELECT sensor_id");
    for &metric in metrics {
        qb.push(format!(
            ", {func}({col}) AS {alias}",
            col = metric.column(),
            alias = value_alias(metric)
        ));
    }

    qb.push(r#" FROM sensor_metrics WHERE "timestamp" >= "#)
        .push_bind(start)
        .push(r#" AND "timestamp" <= "#)
        .push_bind(end);

    if let Some(ids) = sensor_ids {
        qb.push(" AND sensor_id = ANY(")
            .push_bind(ids.to_vec())
            .push(")");
    }

    qb.push(" GROUP BY sensor_id");
    qb
}

fn decode_row(row: &PgRow, metrics: &[MetricType]) -> Result<AggregateRow, sqlx::Error> {
    let values = metrics
        .iter()
        .map(|&m| row.try_get::<Option<f64>, _>(value_alias(m).as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AggregateRow {
        sensor_id: row.try_get("sensor_id")?,
        values,
    })
}

/// Turn grouped rows into results. Null aggregates are omitted, and a sensor
/// left with no metrics is dropped. Row order is preserved.
pub fn shape_results(
    rows: Vec<AggregateRow>,
    metrics: &[MetricType],
    statistic: Statistic,
    end: DateTime<Utc>,
) -> Vec<SensorQueryResult> {
    rows.into_iter()
        .filter_map(|row| {
            let results: Vec<MetricResult> = metrics
                .iter()
                .zip(row.values)
                .filter_map(|(&metric, value)| {
                    value.map(|value| MetricResult {
                        metric,
                        value,
                        statistic,
                    })
                })
                .collect();

            (!results.is_empty()).then(|| SensorQueryResult {
                sensor_id: row.sensor_id,
                metrics: results,
                timestamp: end,
            })
        })
        .collect()
}

pub async fn execute_query(
    pool: &PgPool,
    query: &SensorQuery,
) -> Result<Vec<SensorQueryResult>, sqlx::Error> {
    let metrics = effective_metrics(&query.metrics);
    if metrics.is_empty() {
        debug!(requested = ?query.metrics, "No known metrics requested, skipping query");
        return Ok(Vec::new());
    }

    let (start, end) = query.date_range();
    let mut qb = build_aggregate_query(
        &metrics,
        query.statistic,
        query.sensor_ids.as_deref(),
        start,
        end,
    );
    debug!(sql = qb.sql(), "Executing aggregate query");

    let rows = qb
        .build()
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| decode_row(row, &metrics))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(shape_results(rows, &metrics, query.statistic, end))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_request_selects_all_metrics() {
        assert_eq!(effective_metrics(&[]), MetricType::ALL.to_vec());
    }

    #[test]
    fn unknown_metrics_are_dropped_silently() {
        let m = effective_metrics(&names(&["humidity", "voltage", "temperature"]));
        assert_eq!(m, vec![MetricType::Humidity, MetricType::Temperature]);
        assert!(effective_metrics(&names(&["voltage"])).is_empty());
    }

    #[test]
    fn duplicate_names_resolve_once() {
        let m = effective_metrics(&names(&["pressure", "pressure"]));
        assert_eq!(m, vec![MetricType::Pressure]);
    }

    #[test]
    fn builds_grouped_query_for_all_sensors() {
        let start = end() - chrono::Duration::days(1);
        let qb = build_aggregate_query(
            &[MetricType::Temperature, MetricType::Humidity],
            Statistic::Max,
            None,
            start,
            end(),
        );
        assert_eq!(
            qb.sql(),
            "SELECT sensor_id, MAX(temperature) AS temperature_value, \
             MAX(humidity) AS humidity_value FROM sensor_metrics \
             WHERE \"timestamp\" >= $1 AND \"timestamp\" <= $2 GROUP BY sensor_id"
        );
    }

    #[test]
    fn builds_sensor_filter_when_ids_given() {
        let ids = names(&["a", "b"]);
        let qb = build_aggregate_query(
            &[MetricType::Pressure],
            Statistic::Avg,
            Some(ids.as_slice()),
            end(),
            end(),
        );
        assert!(qb.sql().starts_with("SELECT sensor_id, AVG(pressure) AS pressure_value"));
        assert!(qb.sql().contains("AND sensor_id = ANY($3) GROUP BY sensor_id"));
    }

    #[test]
    fn shaping_omits_null_metrics_and_empty_sensors() {
        let metrics = [MetricType::Temperature, MetricType::Pressure];
        let rows = vec![
            AggregateRow {
                sensor_id: "sensor_002".into(),
                values: vec![Some(550.0), None],
            },
            AggregateRow {
                sensor_id: "sensor_003".into(),
                values: vec![None, None],
            },
            AggregateRow {
                sensor_id: "sensor_001".into(),
                values: vec![Some(400.0), Some(1500.0)],
            },
        ];

        let out = shape_results(rows, &metrics, Statistic::Avg, end());

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].sensor_id, "sensor_002");
        assert_eq!(
            out[0].metrics,
            vec![MetricResult {
                metric: MetricType::Temperature,
                value: 550.0,
                statistic: Statistic::Avg,
            }]
        );
        assert_eq!(out[1].sensor_id, "sensor_001");
        assert_eq!(out[1].metrics.len(), 2);
        assert!(out.iter().all(|r| r.timestamp == end()));
    }
}
