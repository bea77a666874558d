//! Shared domain enums

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// OperationalState
// ---------------------------------------------------------------------------

/// Operational state of a piece of equipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationalState {
    Operational,
    Maintenance,
    Retired,
}

impl OperationalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationalState::Operational => "OPERATIONAL",
            OperationalState::Maintenance => "MAINTENANCE",
            OperationalState::Retired => "RETIRED",
        }
    }
}

impl std::fmt::Display for OperationalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OperationalState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OPERATIONAL" => Ok(OperationalState::Operational),
            "MAINTENANCE" => Ok(OperationalState::Maintenance),
            "RETIRED" => Ok(OperationalState::Retired),
            _ => Err(format!("Invalid operational state: {}", s)),
        }
    }
}

// Stored as TEXT; conversions mirror the string representation
impl sqlx::Type<Postgres> for OperationalState {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for OperationalState {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for OperationalState {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

// ---------------------------------------------------------------------------
// LoanState
// ---------------------------------------------------------------------------

/// Persisted loan state. Overdue is always derived from `due_at`, never
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanState {
    Active,
    Returned,
}

impl LoanState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanState::Active => "ACTIVE",
            LoanState::Returned => "RETURNED",
        }
    }
}

impl std::fmt::Display for LoanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(LoanState::Active),
            "RETURNED" => Ok(LoanState::Returned),
            _ => Err(format!("Invalid loan state: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for LoanState {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for LoanState {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanState {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

// ---------------------------------------------------------------------------
// ScanAction
// ---------------------------------------------------------------------------

/// Action the QR resolver picks for a scanned equipment id. Decided from the
/// ledger on every scan; the code itself carries no direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScanAction {
    Lend,
    Return,
}

impl std::fmt::Display for ScanAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ScanAction::Lend => "lend",
            ScanAction::Return => "return",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operational_state_round_trip() {
        for state in [
            OperationalState::Operational,
            OperationalState::Maintenance,
            OperationalState::Retired,
        ] {
            assert_eq!(state.as_str().parse::<OperationalState>().unwrap(), state);
        }
    }

    #[test]
    fn loan_state_parses_case_insensitively() {
        assert_eq!("active".parse::<LoanState>().unwrap(), LoanState::Active);
        assert_eq!("RETURNED".parse::<LoanState>().unwrap(), LoanState::Returned);
        assert!("LOST".parse::<LoanState>().is_err());
    }
}
