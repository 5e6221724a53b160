//! Country pipeline data types

use chrono::{DateTime, Utc};
use countryfx_common::{CountryRecord, SortOrder};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Field name → message for every rule a raw record violated
pub type FieldErrors = BTreeMap<String, String>;

/// Currency code → rate against the feed's base currency. Lives for one refresh only.
pub type ExchangeRateTable = HashMap<String, f64>;

/// A raw country record that passed validation, before estimation
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    /// First listed currency only
    pub currency_code: Option<String>,
    pub flag_url: Option<String>,
}

/// Currency resolution plus the derived economic figure for one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
}

/// Everything fetched for one refresh invocation
#[derive(Debug, Clone)]
pub struct RefreshBatch {
    /// Stamped on every record this batch touches
    pub refreshed_at: DateTime<Utc>,
    pub countries: Vec<Value>,
    pub rates: ExchangeRateTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    Inserted,
    Updated,
}

/// Result of a committed refresh
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub total_countries: u64,
    pub last_refreshed_at: DateTime<Utc>,
    pub inserted: usize,
    pub updated: usize,
}

/// Filters for the country listing
#[derive(Debug, Clone, Default)]
pub struct CountryFilter {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: SortOrder,
}

/// Read-only view of the committed store used for the summary image
#[derive(Debug, Clone)]
pub struct SummaryStats {
    pub total_countries: u64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    /// Highest `estimated_gdp` first, null values excluded
    pub top: Vec<CountryRecord>,
}
