//! Derived alerts
//!
//! Alerts are never stored. `derive_alerts` is a pure function of the
//! current instant and the joined loan rows; it is recomputed on every call
//! and carries no cache contract.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::enums::LoanState;
use super::loan::LoanWithRefs;

pub const PROBLEM_BAD_CONDITION: &str = "bad condition";
pub const PROBLEM_MISSING_CHARGER: &str = "missing charger";

/// Alert kinds, from most to least urgent display tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    /// Active loan past its due date
    Overdue,
    /// Terminated worker still owing an unresolved return issue
    TerminatedWithIssue,
    /// Returned loan with bad condition or a charger that never came back
    IssuePending,
    /// Active loan due within the configured window
    DueSoon,
}

impl AlertKind {
    /// Display ordering: overdue first, then terminations, then the
    /// informational tier.
    fn rank(&self) -> u8 {
        match self {
            AlertKind::Overdue => 0,
            AlertKind::TerminatedWithIssue => 1,
            AlertKind::IssuePending => 2,
            AlertKind::DueSoon => 2,
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, AlertKind::Overdue | AlertKind::TerminatedWithIssue)
    }
}

/// A derived alert. Loan-level fields are absent on worker-level alerts.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
    pub loan_id: Option<i32>,
    pub equipment_id: Option<i32>,
    pub equipment_serial: Option<String>,
    pub worker_rut: String,
    pub worker_name: String,
    pub site: String,
    pub due_at: Option<DateTime<Utc>>,
    /// Days until due; negative once overdue
    pub days_remaining: Option<i64>,
    pub return_at: Option<DateTime<Utc>>,
    pub problems: Vec<String>,
    pub return_notes: Option<String>,
    pub urgent: bool,
}

fn issue_problems(row: &LoanWithRefs) -> Vec<String> {
    let mut problems = Vec::new();
    if row.loan.return_condition_good == Some(false) {
        problems.push(PROBLEM_BAD_CONDITION.to_string());
    }
    if row.loan.return_has_charger == Some(false) && !row.loan.charger_returned_later {
        problems.push(PROBLEM_MISSING_CHARGER.to_string());
    }
    problems
}

/// Compute every alert visible right now from the given loan rows.
///
/// `due_soon_window` is the configured DUE_SOON horizon. Rows must carry the
/// full loan history (issue alerts come from settled loans), joined with
/// equipment serial/category and worker name/active flag.
pub fn derive_alerts(
    now: DateTime<Utc>,
    rows: &[LoanWithRefs],
    due_soon_window: Duration,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    // Active loans: overdue, or inside the due-soon window
    for row in rows.iter().filter(|r| r.loan.state == LoanState::Active) {
        let remaining = row.loan.due_at.signed_duration_since(now);
        let days = remaining.num_days();
        if row.loan.due_at < now {
            alerts.push(Alert {
                kind: AlertKind::Overdue,
                message: format!("{} overdue at {}", row.equipment_serial, row.loan.site),
                loan_id: Some(row.loan.id),
                equipment_id: Some(row.loan.equipment_id),
                equipment_serial: Some(row.equipment_serial.clone()),
                worker_rut: row.loan.worker_rut.clone(),
                worker_name: row.worker_name.clone(),
                site: row.loan.site.clone(),
                due_at: Some(row.loan.due_at),
                days_remaining: Some(days),
                return_at: None,
                problems: Vec::new(),
                return_notes: None,
                urgent: true,
            });
        } else if remaining < due_soon_window {
            alerts.push(Alert {
                kind: AlertKind::DueSoon,
                message: format!(
                    "{} due in {} days - {}",
                    row.equipment_serial, days, row.loan.site
                ),
                loan_id: Some(row.loan.id),
                equipment_id: Some(row.loan.equipment_id),
                equipment_serial: Some(row.equipment_serial.clone()),
                worker_rut: row.loan.worker_rut.clone(),
                worker_name: row.worker_name.clone(),
                site: row.loan.site.clone(),
                due_at: Some(row.loan.due_at),
                days_remaining: Some(days),
                return_at: None,
                problems: Vec::new(),
                return_notes: None,
                urgent: false,
            });
        }
    }

    // Settled loans with something left to chase. These persist until the
    // record is deleted or the charger flag flips; time never clears them.
    for row in rows.iter().filter(|r| r.loan.has_pending_issue()) {
        alerts.push(Alert {
            kind: AlertKind::IssuePending,
            message: format!(
                "{} returned with issues by {}",
                row.equipment_serial, row.worker_name
            ),
            loan_id: Some(row.loan.id),
            equipment_id: Some(row.loan.equipment_id),
            equipment_serial: Some(row.equipment_serial.clone()),
            worker_rut: row.loan.worker_rut.clone(),
            worker_name: row.worker_name.clone(),
            site: row.loan.site.clone(),
            due_at: None,
            days_remaining: None,
            return_at: row.loan.return_at,
            problems: issue_problems(row),
            return_notes: row.loan.return_notes.clone(),
            urgent: false,
        });
    }

    // One higher-priority alert per terminated worker still owing an issue
    let mut seen_workers: Vec<&str> = Vec::new();
    for row in rows
        .iter()
        .filter(|r| !r.worker_active && r.loan.has_pending_issue())
    {
        if seen_workers.contains(&row.loan.worker_rut.as_str()) {
            continue;
        }
        seen_workers.push(row.loan.worker_rut.as_str());

        let mut problems = Vec::new();
        let mut open_issues = 0;
        for other in rows
            .iter()
            .filter(|r| r.loan.worker_rut == row.loan.worker_rut && r.loan.has_pending_issue())
        {
            open_issues += 1;
            for p in issue_problems(other) {
                if !problems.contains(&p) {
                    problems.push(p);
                }
            }
        }

        alerts.push(Alert {
            kind: AlertKind::TerminatedWithIssue,
            message: format!(
                "{} terminated with {} unresolved return issue(s)",
                row.worker_name, open_issues
            ),
            loan_id: None,
            equipment_id: None,
            equipment_serial: None,
            worker_rut: row.loan.worker_rut.clone(),
            worker_name: row.worker_name.clone(),
            site: row.loan.site.clone(),
            due_at: None,
            days_remaining: None,
            return_at: None,
            problems,
            return_notes: None,
            urgent: true,
        });
    }

    alerts.sort_by_key(|a| (a.kind.rank(), a.days_remaining.unwrap_or(999)));
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::loan::Loan;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn window() -> Duration {
        Duration::days(3)
    }

    fn active_row(id: i32, due_at: DateTime<Utc>) -> LoanWithRefs {
        LoanWithRefs {
            loan: Loan {
                id,
                equipment_id: id + 100,
                worker_rut: "12345678-5".into(),
                site: "NORTH YARD".into(),
                created_at: now() - Duration::days(10),
                due_at,
                state: LoanState::Active,
                changed_by: None,
                handoff_condition_good: true,
                handoff_has_charger: true,
                handoff_notes: None,
                return_at: None,
                return_condition_good: None,
                return_has_charger: None,
                return_notes: None,
                charger_returned_later: false,
            },
            equipment_serial: format!("SN-{:04}", id),
            equipment_category: "NOTEBOOK".into(),
            worker_name: "Ana Rojas".into(),
            worker_active: true,
        }
    }

    fn returned_row(id: i32, condition_good: bool, has_charger: bool) -> LoanWithRefs {
        let mut row = active_row(id, now() + Duration::days(20));
        row.loan.state = LoanState::Returned;
        row.loan.return_at = Some(now() - Duration::days(1));
        row.loan.return_condition_good = Some(condition_good);
        row.loan.return_has_charger = Some(has_charger);
        row
    }

    #[test]
    fn overdue_loan_yields_one_overdue_and_no_due_soon() {
        let rows = vec![active_row(1, now() - Duration::days(1))];
        let alerts = derive_alerts(now(), &rows, window());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Overdue);
        assert!(alerts[0].urgent);
        assert_eq!(alerts[0].days_remaining, Some(-1));
    }

    #[test]
    fn loan_inside_window_is_due_soon() {
        let rows = vec![active_row(1, now() + Duration::days(2))];
        let alerts = derive_alerts(now(), &rows, window());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::DueSoon);
        assert_eq!(alerts[0].days_remaining, Some(2));
    }

    #[test]
    fn loan_outside_window_is_silent() {
        let rows = vec![active_row(1, now() + Duration::days(5))];
        assert!(derive_alerts(now(), &rows, window()).is_empty());
    }

    #[test]
    fn missing_charger_pends_until_flag_flips() {
        let mut rows = vec![returned_row(1, true, false)];
        let alerts = derive_alerts(now(), &rows, window());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::IssuePending);
        assert_eq!(alerts[0].problems, vec![PROBLEM_MISSING_CHARGER.to_string()]);

        rows[0].loan.charger_returned_later = true;
        assert!(derive_alerts(now(), &rows, window()).is_empty());
    }

    #[test]
    fn bad_condition_and_missing_charger_both_reported() {
        let rows = vec![returned_row(1, false, false)];
        let alerts = derive_alerts(now(), &rows, window());
        assert_eq!(alerts.len(), 1);
        assert_eq!(
            alerts[0].problems,
            vec![
                PROBLEM_BAD_CONDITION.to_string(),
                PROBLEM_MISSING_CHARGER.to_string()
            ]
        );
    }

    #[test]
    fn terminated_worker_with_issue_gets_urgent_alert() {
        let mut rows = vec![returned_row(1, false, true)];
        // Still employed: issue stays informational
        let alerts = derive_alerts(now(), &rows, window());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::IssuePending);

        rows[0].worker_active = false;
        let alerts = derive_alerts(now(), &rows, window());
        assert_eq!(alerts.len(), 2);
        assert!(alerts
            .iter()
            .any(|a| a.kind == AlertKind::TerminatedWithIssue && a.urgent));
        assert!(alerts.iter().any(|a| a.kind == AlertKind::IssuePending));
    }

    #[test]
    fn terminated_worker_alert_is_one_per_worker() {
        let mut first = returned_row(1, false, true);
        let mut second = returned_row(2, true, false);
        first.worker_active = false;
        second.worker_active = false;
        let alerts = derive_alerts(now(), &[first, second], window());
        let terminated: Vec<_> = alerts
            .iter()
            .filter(|a| a.kind == AlertKind::TerminatedWithIssue)
            .collect();
        assert_eq!(terminated.len(), 1);
        assert_eq!(
            terminated[0].problems,
            vec![
                PROBLEM_BAD_CONDITION.to_string(),
                PROBLEM_MISSING_CHARGER.to_string()
            ]
        );
    }

    #[test]
    fn overdue_sorts_before_informational() {
        let rows = vec![
            returned_row(1, false, true),
            active_row(2, now() - Duration::days(4)),
            active_row(3, now() + Duration::days(1)),
        ];
        let alerts = derive_alerts(now(), &rows, window());
        assert_eq!(alerts[0].kind, AlertKind::Overdue);
    }
}
