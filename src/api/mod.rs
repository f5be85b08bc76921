use axum::{
    Router,
    extract::{Json, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::core::{
    AnalysisResult, CalculatorConfig, CoreError, HouseholdSnapshot, PlanType, Projection,
    ProjectionConfig, Scenario, ScenarioSet, VehicleParams, VehicleProjection, VehicleSummary,
    VelocityReport, analyze, assumption_table, calculate_wealth_velocity, compare_vehicles,
    project_vehicle_named, run_all_scenarios, run_projection,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("invalid request body: {0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        json_response(
            status,
            ErrorResponse {
                error: self.to_string(),
            },
        )
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// Optional overrides for the calculator's tax and inflation assumptions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize)]
struct RateOverrides {
    #[serde(default)]
    tax_rate: Option<f64>,
    #[serde(default)]
    inflation_rate: Option<f64>,
}

impl RateOverrides {
    fn config(self) -> CalculatorConfig {
        let defaults = CalculatorConfig::default();
        CalculatorConfig {
            tax_rate: self.tax_rate.unwrap_or(defaults.tax_rate),
            inflation_rate: self.inflation_rate.unwrap_or(defaults.inflation_rate),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct CompareRequest {
    plan_type: String,
    #[serde(flatten)]
    params: VehicleParams,
    #[serde(flatten)]
    rates: RateOverrides,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct CompareParams {
    #[serde(flatten)]
    schedule: VehicleParams,
    #[serde(flatten)]
    rates: RateOverrides,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct CompareMultipleRequest {
    plans: Vec<String>,
    params: CompareParams,
}

#[derive(Serialize)]
struct CompareMultipleResponse {
    comparisons: Vec<VehicleProjection>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct ProjectionRequest {
    #[serde(flatten)]
    snapshot: HouseholdSnapshot,
    #[serde(default)]
    scenario: Option<String>,
}

pub async fn run_http_server(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "fincast HTTP API listening");
    axum::serve(listener, router()).await
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/vehicles", get(vehicles_handler))
        .route("/api/calculator/compare", post(compare_handler))
        .route(
            "/api/calculator/compare-multiple",
            post(compare_multiple_handler),
        )
        .route("/api/projections", post(projection_handler))
        .route(
            "/api/projections/all-scenarios",
            post(all_scenarios_handler),
        )
        .route("/api/insights/analysis", post(analysis_handler))
        .route("/api/wealth-velocity", post(velocity_handler))
        .fallback(not_found_handler)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            service: "fincast",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

async fn vehicles_handler() -> Response {
    json_response(StatusCode::OK, vehicles())
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}

async fn compare_handler(
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    Ok(json_response(StatusCode::OK, compare(&request)?))
}

async fn compare_multiple_handler(
    payload: Result<Json<CompareMultipleRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    Ok(json_response(StatusCode::OK, compare_multiple(&request)?))
}

async fn projection_handler(
    payload: Result<Json<ProjectionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    Ok(json_response(StatusCode::OK, projection(&request)?))
}

async fn all_scenarios_handler(
    payload: Result<Json<HouseholdSnapshot>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(snapshot) = payload?;
    Ok(json_response(StatusCode::OK, all_scenarios(&snapshot)?))
}

async fn analysis_handler(
    payload: Result<Json<HouseholdSnapshot>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(snapshot) = payload?;
    let analysis: AnalysisResult = analyze(&snapshot)?;
    Ok(json_response(StatusCode::OK, analysis))
}

async fn velocity_handler(
    payload: Result<Json<HouseholdSnapshot>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(snapshot) = payload?;
    let report: VelocityReport = calculate_wealth_velocity(&snapshot)?;
    Ok(json_response(StatusCode::OK, report))
}

fn vehicles() -> Vec<VehicleSummary> {
    assumption_table()
}

fn compare(request: &CompareRequest) -> Result<VehicleProjection, ApiError> {
    let config = request.rates.config();
    Ok(project_vehicle_named(
        &request.plan_type,
        &request.params,
        &config,
    )?)
}

fn compare_multiple(request: &CompareMultipleRequest) -> Result<CompareMultipleResponse, ApiError> {
    if request.plans.is_empty() {
        return Err(ApiError::BadRequest("no plans provided".to_string()));
    }
    let config = request.params.rates.config();
    let plan_types = request
        .plans
        .iter()
        .map(|name| name.parse())
        .collect::<Result<Vec<PlanType>, CoreError>>()?;
    let comparisons = compare_vehicles(&plan_types, &request.params.schedule, &config)?;
    Ok(CompareMultipleResponse { comparisons })
}

/// Projection settings for a request made now.
fn projection_config() -> ProjectionConfig {
    ProjectionConfig {
        start_year: Some(Utc::now().year()),
        ..ProjectionConfig::default()
    }
}

fn projection(request: &ProjectionRequest) -> Result<Projection, ApiError> {
    let scenario = match request.scenario.as_deref() {
        Some(name) => name.parse()?,
        None => Scenario::default(),
    };
    Ok(run_projection(
        &request.snapshot,
        scenario,
        &projection_config(),
    )?)
}

fn all_scenarios(snapshot: &HouseholdSnapshot) -> Result<ScenarioSet, ApiError> {
    Ok(run_all_scenarios(snapshot, &projection_config())?)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}
