pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{routing::get, Router};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::sensors::SensorService;
use handlers::ApiDoc;

pub fn router(service: SensorService) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route(
            "/api/v1/sensors/{sensor_id}/data",
            get(handlers::get_single_sensor_data).post(handlers::ingest_sensor_data),
        )
        .route("/api/v1/sensors/data", get(handlers::get_multi_sensor_data))
        .route("/api/v1/sensors", get(handlers::list_sensors))
        .with_state(service)
        .split_for_parts();

    router
        .route("/api/v1/metrics", get(handlers::list_metrics))
        .route("/api/v1/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
