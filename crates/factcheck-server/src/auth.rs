//! Bearer-token identity resolution.
//!
//! Authentication proper (credential storage, login flows) is an external
//! concern. The server only needs to turn an opaque bearer token into a user
//! id; deployments wire in their own resolver. The static-token resolver is
//! enough for development and tests.

use std::collections::HashMap;

use axum::http::{header, HeaderMap};
use tracing::warn;
use uuid::Uuid;

pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Option<Uuid>;
}

/// Statically configured token → user mapping.
pub struct StaticTokens {
    tokens: HashMap<String, Uuid>,
}

impl StaticTokens {
    /// Parse the `FACTCHECK_API_TOKENS` format: `token=uuid,token=uuid`.
    /// Malformed entries are skipped with a warning.
    pub fn parse(raw: &str) -> Self {
        let mut tokens = HashMap::new();
        for entry in raw.split(',').filter(|e| !e.trim().is_empty()) {
            match entry.trim().split_once('=') {
                Some((token, user)) => match user.trim().parse::<Uuid>() {
                    Ok(user_id) => {
                        tokens.insert(token.trim().to_string(), user_id);
                    }
                    Err(_) => warn!(entry, "skipping token entry with invalid user id"),
                },
                None => warn!(entry, "skipping malformed token entry"),
            }
        }
        Self { tokens }
    }

    pub fn from_env() -> Self {
        let raw = std::env::var("FACTCHECK_API_TOKENS").unwrap_or_default();
        let parsed = Self::parse(&raw);
        if parsed.tokens.is_empty() {
            warn!("FACTCHECK_API_TOKENS is empty — every request will be unauthorized");
        }
        parsed
    }
}

impl IdentityProvider for StaticTokens {
    fn resolve(&self, token: &str) -> Option<Uuid> {
        self.tokens.get(token).copied()
    }
}

/// Pull the bearer token out of the Authorization header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
