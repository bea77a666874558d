//! Alert derivation service
//!
//! Thin wrapper around the pure `derive_alerts` core: fetches the joined
//! loan rows, derives, filters. Nothing is cached or stored.

use chrono::{Duration, Utc};

use crate::{
    error::AppResult,
    models::alert::{derive_alerts, Alert, AlertKind},
    repository::Repository,
    services::workers::normalize_rut,
};

#[derive(Clone)]
pub struct AlertsService {
    repository: Repository,
    due_soon_days: i64,
}

impl AlertsService {
    pub fn new(repository: Repository, due_soon_days: i64) -> Self {
        Self {
            repository,
            due_soon_days,
        }
    }

    /// All current alerts, optionally restricted to one site
    pub async fn list(&self, site: Option<&str>) -> AppResult<Vec<Alert>> {
        let rows = self.repository.loans.list_with_refs().await?;
        let mut alerts = derive_alerts(Utc::now(), &rows, Duration::days(self.due_soon_days));
        if let Some(site) = site {
            alerts.retain(|a| a.site == site);
        }
        Ok(alerts)
    }

    /// Unresolved return issues of one worker, for the lend-flow warning
    pub async fn for_worker(&self, rut: &str) -> AppResult<Vec<Alert>> {
        let rut = normalize_rut(rut)?;
        self.repository.workers.get_by_rut(&rut).await?;
        let rows = self.repository.loans.list_with_refs().await?;
        let mut alerts = derive_alerts(Utc::now(), &rows, Duration::days(self.due_soon_days));
        alerts.retain(|a| a.kind == AlertKind::IssuePending && a.worker_rut == rut);
        Ok(alerts)
    }

    /// Number of alerts pending right now, for the dashboard tile
    pub async fn count(&self) -> AppResult<i64> {
        Ok(self.list(None).await?.len() as i64)
    }
}
