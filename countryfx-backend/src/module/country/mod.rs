//! Country refresh pipeline
//!
//! Pulls the country directory and exchange-rate feeds, validates each
//! record, derives an estimated GDP, and upserts the batch into SQLite.
//!
//! ## Main Components
//! - `SourceGateway` / `HttpSourceGateway`: the two upstream feeds
//! - `validate`: raw record → `Candidate`
//! - `estimate`: currency resolution and GDP estimate
//! - `reconcile`: case-insensitive insert-or-update
//! - `CountryStore`: SQLite storage and read queries
//! - `CountryUpdater`: sequencing, transaction boundary, summary image

mod types;
pub use types::*;

mod gateway;
pub use gateway::{parse_countries_payload, parse_rates_payload, HttpSourceGateway, SourceGateway};

mod validator;
pub use validator::validate;

mod estimator;
pub use estimator::{estimate, MULTIPLIER_RANGE};

mod reconciler;
pub use reconciler::reconcile;

mod store;
pub use store::{count_rows, name_key, CountryStore};

mod updater;
pub use updater::CountryUpdater;
