//! Worker registry service

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{AppError, AppResult},
    models::worker::{CreateWorker, UpdateWorker, Worker, WorkerQuery},
    repository::Repository,
};

/// Normalized RUT shape: body of 7-8 digits, dash, digit or K check digit
static RUT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{7,8}-[0-9K]$").unwrap());

/// Normalize a RUT to `NNNNNNNN-D`: strip dots and spaces, uppercase the
/// check digit, then validate the shape.
pub fn normalize_rut(raw: &str) -> AppResult<String> {
    let rut = raw.trim().replace(['.', ' '], "").to_uppercase();
    if !RUT_RE.is_match(&rut) {
        return Err(AppError::Validation(format!("Invalid RUT format: {}", raw)));
    }
    Ok(rut)
}

#[derive(Clone)]
pub struct WorkersService {
    repository: Repository,
}

impl WorkersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &WorkerQuery) -> AppResult<Vec<Worker>> {
        self.repository.workers.list(query).await
    }

    pub async fn get(&self, rut: &str) -> AppResult<Worker> {
        let rut = normalize_rut(rut)?;
        self.repository.workers.get_by_rut(&rut).await
    }

    pub async fn create(&self, mut data: CreateWorker) -> AppResult<Worker> {
        data.rut = normalize_rut(&data.rut)?;
        data.name = data.name.trim().to_string();
        data.site = data.site.trim().to_string();
        if data.name.is_empty() || data.site.is_empty() {
            return Err(AppError::Validation(
                "Name and site are required".to_string(),
            ));
        }
        self.repository.workers.create(&data).await
    }

    pub async fn update(&self, rut: &str, data: UpdateWorker) -> AppResult<Worker> {
        let rut = normalize_rut(rut)?;
        self.repository.workers.update(&rut, &data).await
    }

    /// Terminate a worker. No reactivation is exposed; HR corrections go
    /// through the database, not this API.
    pub async fn terminate(&self, rut: &str) -> AppResult<Worker> {
        let rut = normalize_rut(rut)?;
        self.repository.workers.terminate(&rut).await
    }

    pub async fn sites(&self) -> AppResult<Vec<String>> {
        self.repository.workers.sites().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_dots_and_uppercases() {
        assert_eq!(normalize_rut("12.345.678-k").unwrap(), "12345678-K");
        assert_eq!(normalize_rut(" 7654321-0 ").unwrap(), "7654321-0");
    }

    #[test]
    fn normalize_rejects_malformed_ruts() {
        assert!(normalize_rut("12345678").is_err());
        assert!(normalize_rut("123-4").is_err());
        assert!(normalize_rut("abcdefgh-9").is_err());
        assert!(normalize_rut("").is_err());
    }
}
