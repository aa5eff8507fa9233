use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use utoipa::OpenApi;

use super::{
    dto::{
        HealthResponse, IngestResponse, MetricListResponse, QueryInfo, SensorDataParams,
        SensorListResponse, SensorQueryResponse,
    },
    errors::AppError,
};
use crate::{
    db::models::{MetricType, Statistic},
    sensors::{
        models::{MetricResult, SensorIngestPayload, SensorQuery, SensorQueryResult},
        params, validation, SensorService,
    },
};

// ---------------------------------------------------------------------------
// Shared query plumbing
// ---------------------------------------------------------------------------

fn join_or_all(items: &[String]) -> String {
    if items.is_empty() {
        "all".to_owned()
    } else {
        items.join(",")
    }
}

/// `start to end`, at the microsecond precision the store keeps.
fn format_date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "{} to {}",
        start.to_rfc3339_opts(SecondsFormat::Micros, false),
        end.to_rfc3339_opts(SecondsFormat::Micros, false)
    )
}

/// Normalize query-string input into a descriptor plus its echo. All
/// parameter errors surface here, before storage is touched.
fn build_query(
    sensor_ids: Option<Vec<String>>,
    raw: &SensorDataParams,
) -> Result<(SensorQuery, QueryInfo), AppError> {
    let metrics = params::parse_metric_names(raw.metrics.as_deref());
    let statistic = params::parse_statistic(raw.stat.as_deref())?;
    let (start, end) = params::compute_date_range(raw.days, Utc::now())?;

    let info = QueryInfo {
        sensors: join_or_all(sensor_ids.as_deref().unwrap_or_default()),
        metrics: join_or_all(&metrics),
        statistic: statistic.to_string(),
        date_range: format_date_range(start, end),
    };

    let query = SensorQuery {
        sensor_ids,
        metrics,
        statistic,
        start_date: Some(start),
        end_date: Some(end),
    };
    Ok((query, info))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Store one reading for `sensor_id`.
#[utoipa::path(
    post,
    path = "/api/v1/sensors/{sensor_id}/data",
    params(
        ("sensor_id" = String, Path, description = "Sensor identifier"),
    ),
    request_body = SensorIngestPayload,
    responses(
        (status = 201, description = "Reading stored", body = IngestResponse),
        (status = 400, description = "Invalid payload"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "sensors"
)]
pub async fn ingest_sensor_data(
    State(service): State<SensorService>,
    Path(sensor_id): Path<String>,
    payload: Result<Json<SensorIngestPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestResponse>), AppError> {
    let Json(payload) = payload?;
    let reading = validation::into_reading(&sensor_id, payload, Utc::now())?;

    service.store(&reading).await.map_err(AppError::Ingest)?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            message: "Sensor data stored successfully".to_owned(),
            sensor_id,
        }),
    ))
}

/// Aggregate statistics for a single sensor.
#[utoipa::path(
    get,
    path = "/api/v1/sensors/{sensor_id}/data",
    params(
        ("sensor_id" = String, Path, description = "Sensor identifier"),
        ("metrics" = Option<String>, Query, description = "Comma-separated metrics (default: all)"),
        ("stat" = Option<String>, Query, description = "Statistic: average, min, max, sum"),
        ("days" = Option<i64>, Query, description = "Days back from now, 1-31 (default: 1)"),
    ),
    responses(
        (status = 200, description = "Aggregated sensor data", body = SensorQueryResponse),
        (status = 400, description = "Invalid query parameter"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn get_single_sensor_data(
    State(service): State<SensorService>,
    Path(sensor_id): Path<String>,
    raw: Result<Query<SensorDataParams>, QueryRejection>,
) -> Result<Json<SensorQueryResponse>, AppError> {
    let Query(raw) = raw?;
    let (query, query_info) = build_query(Some(vec![sensor_id.clone()]), &raw)?;

    let results = service.query(&query).await?;

    Ok(Json(SensorQueryResponse {
        results,
        query_info,
        message: format!("Retrieved data for sensor {sensor_id}"),
    }))
}

/// Aggregate statistics across several (or all) sensors.
#[utoipa::path(
    get,
    path = "/api/v1/sensors/data",
    params(
        ("sensors" = Option<String>, Query, description = "Comma-separated sensor IDs (default: all)"),
        ("metrics" = Option<String>, Query, description = "Comma-separated metrics (default: all)"),
        ("stat" = Option<String>, Query, description = "Statistic: average, min, max, sum"),
        ("days" = Option<i64>, Query, description = "Days back from now, 1-31 (default: 1)"),
    ),
    responses(
        (status = 200, description = "Aggregated sensor data", body = SensorQueryResponse),
        (status = 400, description = "Invalid query parameter"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn get_multi_sensor_data(
    State(service): State<SensorService>,
    raw: Result<Query<SensorDataParams>, QueryRejection>,
) -> Result<Json<SensorQueryResponse>, AppError> {
    let Query(raw) = raw?;
    let sensor_ids = params::parse_sensor_ids(raw.sensors.as_deref());
    let (query, query_info) = build_query(sensor_ids, &raw)?;

    let results = service.query(&query).await?;
    let message = format!("Retrieved data for {} sensors", results.len());

    Ok(Json(SensorQueryResponse {
        results,
        query_info,
        message,
    }))
}

/// Every sensor id that has ever reported, sorted.
#[utoipa::path(
    get,
    path = "/api/v1/sensors",
    responses(
        (status = 200, description = "Known sensors", body = SensorListResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn list_sensors(
    State(service): State<SensorService>,
) -> Result<Json<SensorListResponse>, AppError> {
    let sensors = service.list_sensor_ids().await?;
    Ok(Json(SensorListResponse { sensors }))
}

#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    responses(
        (status = 200, description = "Accepted metric names", body = MetricListResponse),
    ),
    tag = "sensors"
)]
pub async fn list_metrics() -> Json<MetricListResponse> {
    Json(MetricListResponse {
        metrics: MetricType::ALL.iter().map(|m| m.to_string()).collect(),
    })
}

/// Liveness only; does not touch the database.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_owned(),
        service: "sensor-api".to_owned(),
    })
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        ingest_sensor_data,
        get_single_sensor_data,
        get_multi_sensor_data,
        list_sensors,
        list_metrics,
        health
    ),
    components(schemas(
        SensorIngestPayload,
        IngestResponse,
        SensorQueryResponse,
        SensorQueryResult,
        MetricResult,
        QueryInfo,
        SensorListResponse,
        MetricListResponse,
        HealthResponse,
        MetricType,
        Statistic
    )),
    tags(
        (name = "sensors", description = "Sensor ingestion and statistics"),
        (name = "system",  description = "System endpoints"),
    ),
    info(
        title = "Sensor Data API",
        version = "0.1.0",
        description = "A REST API for sensor data ingestion and querying with statistics"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
