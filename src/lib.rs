//! FieldGear - Field Equipment Loan Tracking Server
//!
//! REST JSON API that tracks the checkout and check-in of field equipment
//! (laptops, tablets, radios, ...) handed to workers across job sites: the
//! loan state machine, condition capture at handoff and return, derived
//! alerting, QR scan resolution and dashboard aggregates.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
