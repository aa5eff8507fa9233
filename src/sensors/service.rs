use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{debug, info};

use super::{
    models::{SensorQuery, SensorQueryResult, SensorReading},
    query,
};

/// Sole owner of the database pool. Cloning is cheap and shares the pool;
/// each call checks a connection out and returns it when done.
#[derive(Clone)]
pub struct SensorService {
    pool: PgPool,
}

impl SensorService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one reading as a single row.
    ///
    /// A second reading for the same `(sensor_id, timestamp)` violates the
    /// primary key and fails the call; nothing is overwritten.
    pub async fn store(&self, reading: &SensorReading) -> Result<()> {
        let record = reading.to_record();
        sqlx::query(
            r#"
            INSERT INTO sensor_metrics
                ("timestamp", sensor_id, location, sensor_type,
                 temperature, humidity, pressure)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.timestamp)
        .bind(&record.sensor_id)
        .bind(&record.location)
        .bind(&record.sensor_type)
        .bind(record.temperature)
        .bind(record.humidity)
        .bind(record.pressure)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to insert reading for sensor {}", reading.sensor_id))?;

        info!(
            sensor_id = %reading.sensor_id,
            timestamp = %reading.timestamp,
            metrics = reading.metrics.len(),
            "Sensor reading persisted"
        );
        Ok(())
    }

    pub async fn query(&self, q: &SensorQuery) -> Result<Vec<SensorQueryResult>> {
        debug!(query = ?q, "Running sensor query");
        let results = query::execute_query(&self.pool, q)
            .await
            .context("failed to run aggregate query")?;
        info!(sensors = results.len(), statistic = %q.statistic, "Sensor query complete");
        Ok(results)
    }

    /// Every sensor id ever stored, ascending.
    pub async fn list_sensor_ids(&self) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT sensor_id FROM sensor_metrics ORDER BY sensor_id COLLATE \"C\"",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list sensor ids")?;
        Ok(ids)
    }
}
