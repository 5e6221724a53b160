use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored country snapshot as exposed over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub id: i64,
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: DateTime<Utc>,
}

/// Sort orders accepted by the country listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "gdp_desc")]
    GdpDesc,
    #[serde(rename = "gdp_asc")]
    GdpAsc,
    #[serde(rename = "population_desc")]
    PopulationDesc,
    #[serde(rename = "population_asc")]
    PopulationAsc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Name => "name",
            SortOrder::GdpDesc => "gdp_desc",
            SortOrder::GdpAsc => "gdp_asc",
            SortOrder::PopulationDesc => "population_desc",
            SortOrder::PopulationAsc => "population_asc",
        }
    }

    /// Lenient parse used by the listing endpoint: unknown values sort by name.
    pub fn parse_or_default(s: Option<&str>) -> Self {
        s.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(SortOrder::Name),
            "gdp_desc" => Ok(SortOrder::GdpDesc),
            "gdp_asc" => Ok(SortOrder::GdpAsc),
            "population_desc" => Ok(SortOrder::PopulationDesc),
            "population_asc" => Ok(SortOrder::PopulationAsc),
            _ => Err(format!("Unknown sort order: {}", s)),
        }
    }
}

/// Body returned by `POST /countries/refresh`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub message: String,
    pub total_countries: u64,
    pub last_refreshed_at: DateTime<Utc>,
}

/// Body returned by `GET /status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub total_countries: u64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

/// Uniform error body. `details` is a string for source/internal failures
/// and a field → message object for validation failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            error: error.into(),
            details: Some(details),
        }
    }
}

/// Body returned by message-only endpoints such as `DELETE /countries/{name}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
