//! Refresh orchestration
//!
//! fetch (both feeds, joined) → validate → estimate → reconcile, all inside
//! one storage transaction, then a best-effort summary image.

use anyhow::Context;
use chrono::Utc;
use futures::future::try_join;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

use super::estimator::estimate;
use super::gateway::SourceGateway;
use super::reconciler::reconcile;
use super::store::{count_rows, CountryStore};
use super::types::{ReconcileAction, RefreshBatch, RefreshOutcome};
use super::validator::validate;
use crate::error::RefreshError;
use crate::module::renderer::SummaryRenderer;

type SharedRng = Arc<StdMutex<Box<dyn RngCore + Send>>>;

/// Rows touched by one committed batch, plus the table size at commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BatchTotals {
    inserted: usize,
    updated: usize,
    total: u64,
}

/// Owns the refresh pipeline. At most one refresh runs at a time.
pub struct CountryUpdater {
    gateway: Arc<dyn SourceGateway>,
    store: CountryStore,
    renderer: SummaryRenderer,
    refresh_lock: Mutex<()>,
    rng: SharedRng,
}

impl CountryUpdater {
    pub fn new(gateway: Arc<dyn SourceGateway>, store: CountryStore, renderer: SummaryRenderer) -> Self {
        Self::with_rng(gateway, store, renderer, StdRng::from_entropy())
    }

    pub fn with_rng(
        gateway: Arc<dyn SourceGateway>,
        store: CountryStore,
        renderer: SummaryRenderer,
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        let rng: Box<dyn RngCore + Send> = Box::new(rng);
        Self {
            gateway,
            store,
            renderer,
            refresh_lock: Mutex::new(()),
            rng: Arc::new(StdMutex::new(rng)),
        }
    }

    pub fn store(&self) -> &CountryStore {
        &self.store
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        let _guard = self.refresh_lock.lock().await;
        tracing::info!("Country refresh started");

        let (countries, rates) = try_join(
            self.gateway.fetch_countries(),
            self.gateway.fetch_exchange_rates(),
        )
        .await
        .inspect_err(|e| tracing::warn!("Country refresh aborted: {}", e))?;

        let batch = RefreshBatch {
            refreshed_at: Utc::now(),
            countries,
            rates,
        };
        let refreshed_at = batch.refreshed_at;

        let rng = self.rng.clone();
        let totals = self
            .store
            .run(move |store| apply_batch(store, &batch, &rng))
            .await
            .inspect_err(|e| tracing::warn!("Country refresh rolled back: {}", e))?;

        // Post-commit; nothing below can fail the refresh.
        if let Err(e) = self.publish_summary().await {
            tracing::warn!("Summary image generation failed: {:#}", e);
        }

        tracing::info!(
            "Country refresh committed: {} inserted, {} updated, {} total",
            totals.inserted,
            totals.updated,
            totals.total
        );

        Ok(RefreshOutcome {
            total_countries: totals.total,
            last_refreshed_at: refreshed_at,
            inserted: totals.inserted,
            updated: totals.updated,
        })
    }

    async fn publish_summary(&self) -> anyhow::Result<PathBuf> {
        let stats = self
            .store
            .run(|store| store.summary(SummaryRenderer::TOP_N))
            .await?;
        self.renderer.render(&stats).await
    }
}

/// Validate, estimate and reconcile every record in one transaction, then
/// count the table before commit. The first invalid record rolls back the
/// whole batch.
fn apply_batch(store: &CountryStore, batch: &RefreshBatch, rng: &SharedRng) -> Result<BatchTotals, RefreshError> {
    let mut rng = rng
        .lock()
        .map_err(|_| anyhow::anyhow!("estimator rng lock poisoned"))?;

    store.with_transaction(|tx| {
        let mut inserted = 0;
        let mut updated = 0;

        for (index, raw) in batch.countries.iter().enumerate() {
            let candidate = validate(raw).map_err(|errors| {
                tracing::warn!("Country record #{} failed validation: {:?}", index, errors);
                RefreshError::ValidationFailed(errors)
            })?;

            let estimate = estimate(&candidate, &batch.rates, &mut *rng);

            match reconcile(tx, &candidate, &estimate, batch.refreshed_at)
                .context(format!("Failed to store country '{}'", candidate.name))?
            {
                ReconcileAction::Inserted => inserted += 1,
                ReconcileAction::Updated => updated += 1,
            }
        }

        let total = count_rows(tx)?;
        Ok(BatchTotals { inserted, updated, total })
    })
}
