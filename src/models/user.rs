//! Identity claims supplied by the external session service
//!
//! The server never issues credentials itself; it validates the bearer token
//! minted by the identity collaborator and uses the claims for boundary role
//! gates and the `changed_by` audit field on loans.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Caller roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// IT staff: full control over equipment and loans
    Tech,
    /// Human resources: worker administration and terminations
    Hr,
    /// Site manager: read access scoped to their own site
    SiteManager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Tech => "tech",
            Role::Hr => "hr",
            Role::SiteManager => "site_manager",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JWT claims for authenticated callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Username of the acting user
    pub sub: String,
    pub role: Role,
    /// Home site, set for site managers
    pub site: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token (used by tests and tooling; production tokens
    /// come from the identity service)
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Equipment and loan mutations are reserved for IT staff
    pub fn require_tech(&self) -> Result<(), AppError> {
        if self.role == Role::Tech {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "IT privileges required".to_string(),
            ))
        }
    }

    /// Worker administration is open to IT and HR
    pub fn require_worker_admin(&self) -> Result<(), AppError> {
        match self.role {
            Role::Tech | Role::Hr => Ok(()),
            _ => Err(AppError::Authorization(
                "IT or HR privileges required".to_string(),
            )),
        }
    }

    /// Terminations are an HR act
    pub fn require_hr(&self) -> Result<(), AppError> {
        if self.role == Role::Hr {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "HR privileges required".to_string(),
            ))
        }
    }

    /// Site managers only see their own site; other roles see everything.
    /// Returns the effective site filter for list endpoints.
    pub fn site_scope<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        match self.role {
            Role::SiteManager => self.site.as_deref(),
            _ => requested,
        }
    }
}
