//! Business logic services

pub mod alerts;
pub mod equipment;
pub mod loans;
pub mod resolver;
pub mod stats;
pub mod workers;

use crate::{config::LoansConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub equipment: equipment::EquipmentService,
    pub workers: workers::WorkersService,
    pub loans: loans::LoansService,
    pub alerts: alerts::AlertsService,
    pub resolver: resolver::ResolverService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, loans_config: LoansConfig) -> Self {
        let alerts = alerts::AlertsService::new(repository.clone(), loans_config.due_soon_days);
        Self {
            equipment: equipment::EquipmentService::new(repository.clone()),
            workers: workers::WorkersService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone(), loans_config),
            resolver: resolver::ResolverService::new(repository.clone()),
            stats: stats::StatsService::new(repository, alerts.clone()),
            alerts,
        }
    }
}
