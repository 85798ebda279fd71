use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::{
    ForecastReport, Scenario, WorkItem, calendar::federal_holidays, validation,
    validation::ValidationError,
};

#[derive(Clone)]
pub struct AppState {
    scenario: Arc<RwLock<Scenario>>,
}

impl AppState {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario: Arc::new(RwLock::new(scenario)),
        }
    }

    fn scenario(&self) -> Arc<RwLock<Scenario>> {
        self.scenario.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        ApiError::Invalid(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Invalid(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
        };
        let body = Json(ErrorBody {
            error,
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/scenario", get(get_scenario).put(replace_scenario))
        .route("/work_items", get(list_work_items).post(create_work_item))
        .route(
            "/work_items/:id",
            get(get_work_item).delete(delete_work_item),
        )
        .route("/forecast", post(run_forecast))
        .route("/holidays/:year", get(list_holidays))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, scenario: Scenario) -> std::io::Result<()> {
    let state = AppState::new(scenario);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_scenario(State(state): State<AppState>) -> Json<Scenario> {
    let scenario = state.scenario();
    let current = scenario.read().clone();
    Json(current)
}

async fn replace_scenario(
    State(state): State<AppState>,
    Json(replacement): Json<Scenario>,
) -> Result<Json<Scenario>, ApiError> {
    validation::validate_scenario(&replacement)?;
    let scenario = state.scenario();
    *scenario.write() = replacement.clone();
    Ok(Json(replacement))
}

async fn list_work_items(State(state): State<AppState>) -> Json<Vec<WorkItem>> {
    let scenario = state.scenario();
    let items = scenario.read().work_items.clone();
    Json(items)
}

async fn get_work_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkItem>, ApiError> {
    let scenario = state.scenario();
    let found = scenario.read().find_work_item(&id).cloned();
    found
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("work item {id} not found")))
}

async fn create_work_item(
    State(state): State<AppState>,
    Json(item): Json<WorkItem>,
) -> Result<(StatusCode, Json<WorkItem>), ApiError> {
    validation::validate_work_item(&item)?;
    let scenario = state.scenario();
    {
        let mut guard = scenario.write();
        if guard.find_work_item(&item.id).is_some() {
            return Err(ApiError::Conflict(format!(
                "work item {} already exists",
                item.id
            )));
        }
        guard.work_items.push(item.clone());
    }
    Ok((StatusCode::CREATED, Json(item)))
}

async fn delete_work_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let scenario = state.scenario();
    let removed = scenario.write().remove_work_item(&id);
    if !removed {
        return Err(ApiError::not_found(format!("work item {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn run_forecast(State(state): State<AppState>) -> Json<ForecastReport> {
    let snapshot = state.scenario().read().clone();
    let report = snapshot.run();
    Json(report)
}

async fn list_holidays(Path(year): Path<i32>) -> Result<Json<Vec<NaiveDate>>, ApiError> {
    if !(1900..=2200).contains(&year) {
        return Err(ApiError::Invalid(format!("year {year} is out of range")));
    }
    Ok(Json(federal_holidays(year).iter().collect()))
}
