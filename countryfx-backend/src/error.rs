use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use countryfx_common::ErrorResponse;
use thiserror::Error;

use crate::module::country::FieldErrors;

/// The two upstream feeds a refresh depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFeed {
    Countries,
    ExchangeRates,
}

impl SourceFeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFeed::Countries => "RestCountries API",
            SourceFeed::ExchangeRates => "Exchange Rate API",
        }
    }
}

impl std::fmt::Display for SourceFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum RefreshError {
    /// Timeout, transport failure, non-2xx status or unusable body.
    /// Carries only the feed and URL, never the transport detail.
    #[error("Could not fetch data from {feed} ({url})")]
    SourceUnavailable { feed: SourceFeed, url: String },

    #[error("Validation failed: {}", format_field_errors(.0))]
    ValidationFailed(FieldErrors),

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl RefreshError {
    pub fn unavailable(feed: SourceFeed, url: impl Into<String>) -> Self {
        RefreshError::SourceUnavailable {
            feed,
            url: url.into(),
        }
    }
}

fn format_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Refresh(#[from] RefreshError),
    #[error("Country not found")]
    CountryNotFound,
    #[error("Summary image not found")]
    ImageNotFound,
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Refresh(RefreshError::SourceUnavailable { .. }) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::with_details("External data source unavailable", self.to_string().into()),
            ),
            ApiError::Refresh(RefreshError::ValidationFailed(errors)) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_details("Validation failed", serde_json::json!(errors)),
            ),
            ApiError::Refresh(RefreshError::Internal(e)) => {
                tracing::error!("Refresh failed: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Internal server error", format!("{:#}", e).into()),
                )
            }
            ApiError::CountryNotFound | ApiError::ImageNotFound => {
                (StatusCode::NOT_FOUND, ErrorResponse::new(self.to_string()))
            }
            ApiError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(self.to_string()))
            }
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
