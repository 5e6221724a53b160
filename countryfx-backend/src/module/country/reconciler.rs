//! Insert-or-update of one estimated candidate
//!
//! Matching is on the case-folded name. An existing row is fully replaced
//! (null values overwrite stored ones); only its `id` and the stored spelling
//! of `name` survive.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Transaction};

use super::store::name_key;
use super::types::{Candidate, Estimate, ReconcileAction};

pub fn reconcile(
    tx: &Transaction<'_>,
    candidate: &Candidate,
    estimate: &Estimate,
    refreshed_at: DateTime<Utc>,
) -> rusqlite::Result<ReconcileAction> {
    let key = name_key(&candidate.name);

    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM countries WHERE name_key = ?1 ORDER BY id LIMIT 1",
            [&key],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => {
            tx.execute(
                "UPDATE countries SET \
                    capital = ?2, region = ?3, population = ?4, currency_code = ?5, \
                    exchange_rate = ?6, estimated_gdp = ?7, flag_url = ?8, last_refreshed_at = ?9 \
                 WHERE id = ?1",
                params![
                    id,
                    candidate.capital,
                    candidate.region,
                    candidate.population,
                    estimate.currency_code,
                    estimate.exchange_rate,
                    estimate.estimated_gdp,
                    candidate.flag_url,
                    refreshed_at,
                ],
            )?;
            Ok(ReconcileAction::Updated)
        }
        None => {
            tx.execute(
                "INSERT INTO countries \
                    (name, name_key, capital, region, population, currency_code, \
                     exchange_rate, estimated_gdp, flag_url, last_refreshed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    candidate.name,
                    key,
                    candidate.capital,
                    candidate.region,
                    candidate.population,
                    estimate.currency_code,
                    estimate.exchange_rate,
                    estimate.estimated_gdp,
                    candidate.flag_url,
                    refreshed_at,
                ],
            )?;
            Ok(ReconcileAction::Inserted)
        }
    }
}
