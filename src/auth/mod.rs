use std::collections::HashSet;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Settings;

/// Raw JWT claims as they appear on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    pub exp: i64,
}

/// Normalized role derived from the raw `role` claim.
///
/// Tokens arrive with a handful of aliases for the same job title; anything
/// unrecognized falls back to Developer, the least-privileged role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "CIO")]
    Cio,
    Architect,
    Developer,
}

impl Role {
    pub fn from_claim(raw: Option<&str>) -> Self {
        match raw {
            Some("CIO") | Some("ChiefInformationOfficer") => Role::Cio,
            Some("Architect")
            | Some("EnterpriseArchitect")
            | Some("SystemArchitect")
            | Some("SolutionArchitect") => Role::Architect,
            _ => Role::Developer,
        }
    }
}

/// Per-request identity built from verified token claims.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub subject: String,
    pub name: Option<String>,
    pub role: Role,
    pub team: Option<String>,
    pub expiry: i64,
}

impl Identity {
    fn from_claims(claims: Claims) -> Self {
        Self {
            role: Role::from_claim(claims.role.as_deref()),
            subject: claims.sub,
            name: claims.name,
            team: claims.team,
            expiry: claims.exp,
        }
    }

    /// Stand-in identity used when authentication is disabled.
    pub fn dev_default(now: i64) -> Self {
        Self {
            subject: "devuser@example.com".to_string(),
            name: Some("Dev User".to_string()),
            role: Role::Developer,
            team: Some("Platform".to_string()),
            expiry: now + 3600,
        }
    }
}

/// Outcome of the auth gate: a verified identity, or the bypass marker
/// carrying dev defaults when `DISABLE_AUTH` is set.
#[derive(Debug, Clone)]
pub enum AuthContext {
    Identity(Identity),
    Bypassed(Identity),
}

impl AuthContext {
    pub fn identity(&self) -> &Identity {
        match self {
            AuthContext::Identity(id) | AuthContext::Bypassed(id) => id,
        }
    }

    pub fn is_bypassed(&self) -> bool {
        matches!(self, AuthContext::Bypassed(_))
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or invalid Authorization header")]
    MissingToken,

    #[error("token signature verification failed")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token generation failed: {0}")]
    TokenGeneration(String),
}

/// Time source for expiry checks, injectable so tests are deterministic.
pub trait Clock: Send + Sync {
    /// Current time as unix seconds.
    fn now(&self) -> i64;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// HS256 token verification and minting against the configured secret.
pub struct AuthService {
    disable_auth: bool,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Box<dyn Clock>,
}

impl AuthService {
    pub fn new(settings: &Settings) -> Self {
        Self::with_clock(settings, Box::new(SystemClock))
    }

    pub fn with_clock(settings: &Settings, clock: Box<dyn Clock>) -> Self {
        Self {
            disable_auth: settings.disable_auth,
            encoding_key: EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            clock,
        }
    }

    /// Authenticate a request from its `Authorization` header value.
    ///
    /// Returns `Bypassed` unconditionally when auth is disabled; otherwise
    /// expects `Bearer <token>` and verifies it.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<AuthContext, AuthError> {
        if self.disable_auth {
            return Ok(AuthContext::Bypassed(Identity::dev_default(self.clock.now())));
        }

        let header = authorization.ok_or(AuthError::MissingToken)?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        self.verify(token)
    }

    /// Verify a bare token string and build the caller's identity.
    pub fn verify(&self, token: &str) -> Result<AuthContext, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp must be present, but the time comparison runs against the
        // injected clock below rather than the library's wall clock.
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthError::InvalidSignature
        })?;

        if self.clock.now() >= data.claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(AuthContext::Identity(Identity::from_claims(data.claims)))
    }

    /// Mint a signed token for the given claims. Used by tests and local
    /// tooling; the service itself never issues tokens to clients.
    pub fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }
}
