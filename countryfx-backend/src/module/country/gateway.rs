//! External feed access
//!
//! One GET per feed, bounded by the configured timeout, no retries. Every
//! failure collapses into [`RefreshError::SourceUnavailable`]; the transport
//! detail only reaches the log.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::types::ExchangeRateTable;
use crate::config::SourcesConfig;
use crate::error::{RefreshError, SourceFeed};

#[async_trait]
pub trait SourceGateway: Send + Sync {
    /// Raw country objects, unvalidated.
    async fn fetch_countries(&self) -> Result<Vec<Value>, RefreshError>;

    async fn fetch_exchange_rates(&self) -> Result<ExchangeRateTable, RefreshError>;
}

/// Extract the country array. Any other shape means the feed is unusable.
pub fn parse_countries_payload(payload: Value) -> Option<Vec<Value>> {
    match payload {
        Value::Array(countries) => Some(countries),
        _ => None,
    }
}

/// Collect `rates.{CODE}` numbers. Missing `rates` yields an empty table and
/// non-numeric entries are skipped.
pub fn parse_rates_payload(payload: &Value) -> ExchangeRateTable {
    payload
        .get("rates")
        .and_then(Value::as_object)
        .map(|rates| {
            rates
                .iter()
                .filter_map(|(code, rate)| rate.as_f64().map(|r| (code.clone(), r)))
                .collect()
        })
        .unwrap_or_default()
}

pub struct HttpSourceGateway {
    client: Client,
    countries_url: String,
    exchange_rates_url: String,
}

impl HttpSourceGateway {
    pub fn new(config: &SourcesConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("countryfx/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build reqwest client")?;

        Ok(Self {
            client,
            countries_url: config.countries_url.clone(),
            exchange_rates_url: config.exchange_rates_url.clone(),
        })
    }

    async fn get_json(&self, feed: SourceFeed, url: &str) -> Result<Value, RefreshError> {
        tracing::info!("Fetching {} from {}", feed, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let body = match response {
            Ok(response) => response.json::<Value>().await,
            Err(e) => Err(e),
        };

        body.map_err(|e| {
            if e.is_timeout() {
                tracing::warn!("{} timed out: {}", feed, e);
            } else {
                tracing::warn!("{} request failed: {}", feed, e);
            }
            RefreshError::unavailable(feed, url)
        })
    }
}

#[async_trait]
impl SourceGateway for HttpSourceGateway {
    async fn fetch_countries(&self) -> Result<Vec<Value>, RefreshError> {
        let feed = SourceFeed::Countries;
        let payload = self.get_json(feed, &self.countries_url).await?;

        let countries = parse_countries_payload(payload).ok_or_else(|| {
            tracing::warn!("{} returned something other than a JSON array", feed);
            RefreshError::unavailable(feed, &self.countries_url)
        })?;

        tracing::info!("{} returned {} countries", feed, countries.len());
        Ok(countries)
    }

    async fn fetch_exchange_rates(&self) -> Result<ExchangeRateTable, RefreshError> {
        let feed = SourceFeed::ExchangeRates;
        let payload = self.get_json(feed, &self.exchange_rates_url).await?;

        let rates = parse_rates_payload(&payload);
        tracing::info!("{} returned {} rates", feed, rates.len());
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    /// Serve a fixed router on an ephemeral port, returning its base URL.
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn gateway(base: &str, timeout_secs: u64) -> HttpSourceGateway {
        HttpSourceGateway::new(&SourcesConfig {
            countries_url: format!("{}/countries", base),
            exchange_rates_url: format!("{}/rates", base),
            timeout_secs,
        })
        .unwrap()
    }

    #[test]
    fn test_parse_rates_payload() {
        let payload = json!({
            "result": "success",
            "base_code": "USD",
            "rates": { "USD": 1, "NGN": 1600.25, "BAD": "n/a" }
        });
        let rates = parse_rates_payload(&payload);
        assert_eq!(rates.len(), 2);
        assert_eq!(rates["USD"], 1.0);
        assert_eq!(rates["NGN"], 1600.25);

        assert!(parse_rates_payload(&json!({ "result": "error" })).is_empty());
    }

    #[test]
    fn test_parse_countries_payload() {
        assert_eq!(parse_countries_payload(json!([{ "name": "Chad" }])).unwrap().len(), 1);
        assert!(parse_countries_payload(json!({ "message": "rate limited" })).is_none());
    }

    #[tokio::test]
    async fn test_fetch_both_feeds() {
        let app = Router::new()
            .route("/countries", get(|| async { Json(json!([{ "name": "Chad", "population": 16425859 }])) }))
            .route("/rates", get(|| async { Json(json!({ "rates": { "XAF": 606.4 } })) }));
        let gw = gateway(&serve(app).await, 5);

        let countries = gw.fetch_countries().await.unwrap();
        assert_eq!(countries[0]["name"], "Chad");

        let rates = gw.fetch_exchange_rates().await.unwrap();
        assert_eq!(rates.get("XAF"), Some(&606.4));
    }

    #[tokio::test]
    async fn test_error_status_is_source_unavailable() {
        let app = Router::new()
            .route("/countries", get(|| async { Json(json!([])) }))
            .route("/rates", get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }));
        let base = serve(app).await;
        let gw = gateway(&base, 5);

        match gw.fetch_exchange_rates().await {
            Err(RefreshError::SourceUnavailable { feed, url }) => {
                assert_eq!(feed, SourceFeed::ExchangeRates);
                assert_eq!(url, format!("{}/rates", base));
            }
            other => panic!("expected SourceUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_array_countries_is_source_unavailable() {
        let app = Router::new().route("/countries", get(|| async { Json(json!({ "status": 404 })) }));
        let gw = gateway(&serve(app).await, 5);

        let err = gw.fetch_countries().await.unwrap_err();
        assert!(matches!(err, RefreshError::SourceUnavailable { feed: SourceFeed::Countries, .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_source_unavailable() {
        let app = Router::new().route(
            "/rates",
            get(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(3)).await;
                Json(json!({ "rates": {} }))
            }),
        );
        let gw = gateway(&serve(app).await, 1);

        let err = gw.fetch_exchange_rates().await.unwrap_err();
        assert!(matches!(err, RefreshError::SourceUnavailable { feed: SourceFeed::ExchangeRates, .. }));
        assert!(!err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_source_unavailable() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = gateway(&base, 2).fetch_countries().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Could not fetch data from RestCountries API ({}/countries)", base)
        );
    }
}
