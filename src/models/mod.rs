//! Data models for FieldGear

pub mod alert;
pub mod enums;
pub mod equipment;
pub mod loan;
pub mod user;
pub mod worker;

// Re-export commonly used types
pub use alert::{Alert, AlertKind};
pub use enums::{LoanState, OperationalState, ScanAction};
pub use equipment::{Equipment, EquipmentWithLoan};
pub use loan::{Loan, LoanWithRefs};
pub use user::{Role, UserClaims};
pub use worker::Worker;
