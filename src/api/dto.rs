use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::sensors::models::SensorQueryResult;

/// Query string shared by the single- and multi-sensor data endpoints.
/// `sensors` is ignored on the single-sensor path.
#[derive(Debug, Default, Deserialize)]
pub struct SensorDataParams {
    pub sensors: Option<String>,
    pub metrics: Option<String>,
    pub stat: Option<String>,
    pub days: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    pub message: String,
    pub sensor_id: String,
}

/// Echo of the resolved request, all values rendered as strings.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryInfo {
    /// Comma-joined ids, or `"all"`.
    pub sensors: String,
    /// Comma-joined metric names as requested, or `"all"`.
    pub metrics: String,
    pub statistic: String,
    /// `"<start> to <end>"`, RFC3339.
    pub date_range: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorQueryResponse {
    pub results: Vec<SensorQueryResult>,
    pub query_info: QueryInfo,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorListResponse {
    pub sensors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricListResponse {
    pub metrics: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}
