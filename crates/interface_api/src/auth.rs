//! Authentication and authorization
//!
//! Requests carry a JWT whose `roles` claim lists staff roles. Each handler
//! asks for a [`Capability`]; a role grants a fixed set of capabilities.

use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::UserId;

use crate::error::ApiError;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    /// Roles this token carries; unknown role names are ignored
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.iter().filter_map(|r| r.parse().ok())
    }

    /// Staff identifier when the subject is a user id
    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }

    /// Returns true if any role grants `capability`
    pub fn can(&self, capability: Capability) -> bool {
        self.roles().any(|role| role.grants(capability))
    }

    /// Fails with `Forbidden` unless a role grants `capability`
    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "missing permission: {}",
                capability.as_str()
            )))
        }
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
}

/// Staff roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Accounting,
    Receptionist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Accounting => "accounting",
            Role::Receptionist => "receptionist",
        }
    }

    /// Returns true if this role may perform `capability`
    pub fn grants(&self, capability: Capability) -> bool {
        use Capability::*;
        match self {
            Role::Admin | Role::Manager => true,
            Role::Accounting => matches!(
                capability,
                ViewFolios | PostCharges | RecordPayments | ConfirmPayments | ViewMetrics
                    | RefreshMetrics | ViewReports
            ),
            Role::Receptionist => matches!(capability, ViewFolios | OpenFolios | FrontDesk),
        }
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "accounting" => Ok(Role::Accounting),
            "receptionist" => Ok(Role::Receptionist),
            _ => Err(AuthError::InvalidToken),
        }
    }
}

/// Actions guarded by role checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ViewFolios,
    OpenFolios,
    PostCharges,
    RecordPayments,
    ConfirmPayments,
    ViewMetrics,
    RefreshMetrics,
    ViewReports,
    FrontDesk,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewFolios => "folio:read",
            Capability::OpenFolios => "folio:open",
            Capability::PostCharges => "folio:charge",
            Capability::RecordPayments => "payment:write",
            Capability::ConfirmPayments => "payment:confirm",
            Capability::ViewMetrics => "metrics:read",
            Capability::RefreshMetrics => "metrics:write",
            Capability::ViewReports => "report:read",
            Capability::FrontDesk => "stay:write",
        }
    }
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `roles` - User's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: &str,
    roles: &[Role],
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}
