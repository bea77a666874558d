//! Statistics service
//!
//! Everything here is computed from the ledger at request time; the
//! dashboard holds no state of its own.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use sqlx::Row;

use crate::{
    api::stats::{
        DailyLoans, DashboardResponse, DashboardSummary, StatEntry, TopEquipmentEntry, TrendLine,
    },
    error::AppResult,
    repository::Repository,
    services::alerts::AlertsService,
};

/// Ordinary least squares over (x, y) pairs.
///
/// Degenerate inputs (no points, or all x equal so n·Σx² = (Σx)²) yield a
/// flat line through the mean with R² = 0 rather than NaN; a series with
/// zero variance likewise reports R² = 0.
pub fn linear_regression(points: &[(f64, f64)]) -> TrendLine {
    let n = points.len() as f64;
    if points.is_empty() {
        return TrendLine {
            slope: 0.0,
            intercept: 0.0,
            r_squared: 0.0,
        };
    }

    let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
    let sum_x2: f64 = points.iter().map(|(x, _)| x * x).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return TrendLine {
            slope: 0.0,
            intercept: sum_y / n,
            r_squared: 0.0,
        };
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    let mean_y = sum_y / n;
    let ss_res: f64 = points
        .iter()
        .map(|(x, y)| {
            let predicted = slope * x + intercept;
            (y - predicted) * (y - predicted)
        })
        .sum();
    let ss_tot: f64 = points.iter().map(|(_, y)| (y - mean_y) * (y - mean_y)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    TrendLine {
        slope,
        intercept,
        r_squared,
    }
}

/// Expand sparse (day, count) rows into a dense series over days 1..=last_day
fn zero_filled_series(raw: &[(i32, i64)], last_day: u32) -> Vec<DailyLoans> {
    (1..=last_day as i32)
        .map(|day| DailyLoans {
            day,
            count: raw
                .iter()
                .find(|(d, _)| *d == day)
                .map(|(_, c)| *c)
                .unwrap_or(0),
        })
        .collect()
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    alerts: AlertsService,
}

impl StatsService {
    pub fn new(repository: Repository, alerts: AlertsService) -> Self {
        Self { repository, alerts }
    }

    /// Build the dashboard aggregate
    pub async fn dashboard(&self) -> AppResult<DashboardResponse> {
        let pool = &self.repository.pool;
        let now = Utc::now();

        // Equipment by operational state
        let equipment_row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE operational_state = 'OPERATIONAL') AS operational,
                   COUNT(*) FILTER (WHERE operational_state = 'MAINTENANCE') AS maintenance,
                   COUNT(*) FILTER (WHERE operational_state = 'RETIRED') AS retired
            FROM equipment
            "#,
        )
        .fetch_one(pool)
        .await?;

        let active_loans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE state = 'ACTIVE'")
                .fetch_one(pool)
                .await?;

        let active_workers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM workers WHERE active = TRUE")
                .fetch_one(pool)
                .await?;

        let returned_last_30_days: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE state = 'RETURNED' AND return_at >= $1",
        )
        .bind(now - Duration::days(30))
        .fetch_one(pool)
        .await?;

        let pending_alerts = self.alerts.count().await?;

        // Loans per day for the current month, through today
        let month_start = Utc
            .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .unwrap();
        let month_end = next_month_start(now);

        let raw_daily: Vec<(i32, i64)> = sqlx::query(
            r#"
            SELECT EXTRACT(DAY FROM created_at)::int AS day, COUNT(*) AS count
            FROM loans
            WHERE created_at >= $1 AND created_at < $2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(month_start)
        .bind(month_end)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| (row.get("day"), row.get("count")))
        .collect();

        let loans_per_day = zero_filled_series(&raw_daily, now.day());
        let points: Vec<(f64, f64)> = loans_per_day
            .iter()
            .map(|d| (d.day as f64, d.count as f64))
            .collect();
        let trend = linear_regression(&points);

        // Loans this month by equipment category
        let loans_by_category = sqlx::query(
            r#"
            SELECT e.category AS label, COUNT(*) AS value
            FROM loans l
            JOIN equipment e ON l.equipment_id = e.id
            WHERE l.created_at >= $1 AND l.created_at < $2
            GROUP BY e.category
            ORDER BY value DESC
            "#,
        )
        .bind(month_start)
        .bind(month_end)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| StatEntry {
            label: row.get("label"),
            value: row.get("value"),
        })
        .collect();

        // Most-loaned equipment, all time
        let top_equipment = sqlx::query(
            r#"
            SELECT e.serial, e.category, COUNT(*) AS loans
            FROM loans l
            JOIN equipment e ON l.equipment_id = e.id
            GROUP BY e.id, e.serial, e.category
            ORDER BY loans DESC
            LIMIT 5
            "#,
        )
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| TopEquipmentEntry {
            serial: row.get("serial"),
            category: row.get("category"),
            loans: row.get("loans"),
        })
        .collect();

        Ok(DashboardResponse {
            summary: DashboardSummary {
                total_equipment: equipment_row.get("total"),
                equipment_operational: equipment_row.get("operational"),
                equipment_maintenance: equipment_row.get("maintenance"),
                equipment_retired: equipment_row.get("retired"),
                active_loans,
                active_workers,
                returned_last_30_days,
                pending_alerts,
            },
            loans_per_day,
            trend,
            loans_by_category,
            top_equipment,
        })
    }
}

fn next_month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    if now.month() == 12 {
        Utc.with_ymd_and_hms(now.year() + 1, 1, 1, 0, 0, 0).unwrap()
    } else {
        Utc.with_ymd_and_hms(now.year(), now.month() + 1, 1, 0, 0, 0)
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regression_on_flat_zero_series_is_all_zero() {
        let trend = linear_regression(&[(1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        assert_eq!(trend.slope, 0.0);
        assert_eq!(trend.intercept, 0.0);
        assert_eq!(trend.r_squared, 0.0);
        assert!(!trend.r_squared.is_nan());
    }

    #[test]
    fn regression_on_perfect_line() {
        let trend = linear_regression(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]);
        assert!((trend.slope - 2.0).abs() < 1e-9);
        assert!(trend.intercept.abs() < 1e-9);
        assert!((trend.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn regression_guards_single_point() {
        let trend = linear_regression(&[(1.0, 5.0)]);
        assert_eq!(trend.slope, 0.0);
        assert_eq!(trend.intercept, 5.0);
        assert_eq!(trend.r_squared, 0.0);
    }

    #[test]
    fn regression_on_empty_series() {
        let trend = linear_regression(&[]);
        assert_eq!(trend.slope, 0.0);
        assert_eq!(trend.intercept, 0.0);
        assert_eq!(trend.r_squared, 0.0);
    }

    #[test]
    fn series_is_zero_filled_through_today() {
        let series = zero_filled_series(&[(2, 3), (5, 1)], 6);
        assert_eq!(series.len(), 6);
        assert_eq!(series[0].count, 0);
        assert_eq!(series[1].count, 3);
        assert_eq!(series[4].count, 1);
        assert_eq!(series[5].count, 0);
    }
}
