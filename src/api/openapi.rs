//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{alerts, config, equipment, health, loans, stats, workers};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FieldGear API",
        version = "1.0.0",
        description = "Field Equipment Loan Tracking REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Equipment
        equipment::list_equipment,
        equipment::list_available_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::set_equipment_state,
        equipment::delete_equipment,
        equipment::scan_equipment,
        // Workers
        workers::list_workers,
        workers::get_worker,
        workers::create_worker,
        workers::update_worker,
        workers::terminate_worker,
        workers::get_worker_loans,
        workers::get_worker_alerts,
        // Loans
        loans::list_loans,
        loans::get_loan,
        loans::create_loan,
        loans::return_loan,
        loans::mark_charger_returned,
        loans::delete_loan,
        // Alerts
        alerts::list_alerts,
        // Stats
        stats::get_dashboard,
        // Vocabulary
        config::list_sites,
        config::list_categories,
    ),
    components(
        schemas(
            // Equipment
            crate::models::equipment::Equipment,
            crate::models::equipment::EquipmentWithLoan,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            crate::models::equipment::SetOperationalState,
            crate::models::enums::OperationalState,
            crate::models::enums::ScanAction,
            equipment::ScanResolution,
            // Workers
            crate::models::worker::Worker,
            crate::models::worker::CreateWorker,
            crate::models::worker::UpdateWorker,
            crate::models::user::Role,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanWithRefs,
            crate::models::loan::CreateLoan,
            crate::models::loan::ReturnLoan,
            crate::models::enums::LoanState,
            // Alerts
            crate::models::alert::Alert,
            crate::models::alert::AlertKind,
            // Stats
            stats::DashboardResponse,
            stats::DashboardSummary,
            stats::DailyLoans,
            stats::TrendLine,
            stats::StatEntry,
            stats::TopEquipmentEntry,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "equipment", description = "Equipment registry and QR scan resolution"),
        (name = "workers", description = "Worker registry"),
        (name = "loans", description = "Loan ledger"),
        (name = "alerts", description = "Derived alerts"),
        (name = "stats", description = "Dashboard statistics"),
        (name = "config", description = "Open-vocabulary values")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
