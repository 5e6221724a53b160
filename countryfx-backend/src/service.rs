//! HTTP surface
//!
//! Refresh goes through [`CountryUpdater`]; every other route is a thin read
//! or delete against [`CountryStore`].

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use countryfx_common::{
    CountryRecord, MessageResponse, RefreshResponse, SortOrder, StatusResponse,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::module::country::{CountryFilter, CountryStore, CountryUpdater};

#[derive(Clone)]
pub struct AppState {
    updater: Arc<CountryUpdater>,
    artifact_path: PathBuf,
}

impl AppState {
    pub fn new(updater: Arc<CountryUpdater>, artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            updater,
            artifact_path: artifact_path.into(),
        }
    }

    fn store(&self) -> &CountryStore {
        self.updater.store()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<String>,
}

impl From<ListParams> for CountryFilter {
    fn from(params: ListParams) -> Self {
        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        CountryFilter {
            sort: SortOrder::parse_or_default(params.sort.as_deref()),
            region: non_empty(params.region),
            currency: non_empty(params.currency),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/favicon.ico", get(favicon))
        .route("/status", get(status))
        .route("/countries", get(list_countries))
        .route("/countries/refresh", post(refresh_countries))
        .route("/countries/image", get(summary_image))
        .route("/countries/{name}", get(get_country).delete(delete_country))
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Country Currency & Exchange API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /countries/refresh": "Refresh country data from external APIs",
            "GET /countries": "Get all countries (supports ?region=, ?currency=, ?sort=)",
            "GET /countries/{name}": "Get a single country by name",
            "DELETE /countries/{name}": "Delete a country",
            "GET /status": "Get API status",
            "GET /countries/image": "Get summary image",
        }
    }))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// POST /countries/refresh
async fn refresh_countries(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    let outcome = state.updater.refresh().await?;
    Ok(Json(RefreshResponse {
        message: "Countries refreshed successfully".to_string(),
        total_countries: outcome.total_countries,
        last_refreshed_at: outcome.last_refreshed_at,
    }))
}

/// GET /countries
async fn list_countries(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<CountryRecord>>> {
    let filter = CountryFilter::from(params);
    let records = state.store().run(move |store| store.list(&filter)).await?;
    Ok(Json(records))
}

/// GET /countries/{name}
async fn get_country(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<CountryRecord>> {
    state
        .store()
        .run(move |store| store.find_by_name(&name))
        .await?
        .map(Json)
        .ok_or(ApiError::CountryNotFound)
}

/// DELETE /countries/{name}
async fn delete_country(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<MessageResponse>> {
    let key = name.clone();
    if !state.store().run(move |store| store.delete_by_name(&key)).await? {
        return Err(ApiError::CountryNotFound);
    }
    tracing::info!("Deleted country '{}'", name);
    Ok(Json(MessageResponse {
        message: format!("Country '{}' deleted successfully", name),
    }))
}

/// GET /status
async fn status(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    let status = state.store().run(|store| store.status()).await?;
    Ok(Json(status))
}

/// GET /countries/image
async fn summary_image(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    match tokio::fs::read(&state.artifact_path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "image/png")], bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ApiError::ImageNotFound),
        Err(e) => Err(anyhow::Error::from(e)
            .context(format!("Failed to read {:?}", state.artifact_path))
            .into()),
    }
}
