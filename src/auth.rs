//! Bearer-token verification at the HTTP boundary.
//!
//! Tokens are issued elsewhere; this module only checks them and hands the
//! verified user id to handlers. Format: `<user uuid>.<hex sha256(secret "." uuid)>`.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::{error::AppError, store::GuidanceStore, AppState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("malformed token")]
    Malformed,
    #[error("bad token signature")]
    BadSignature,
}

impl From<AuthError> for AppError {
    fn from(_: AuthError) -> Self {
        AppError::Unauthorized
    }
}

#[derive(Clone)]
pub struct TokenKey {
    secret: String,
}

impl TokenKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn sign(&self, user_id: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b".");
        hasher.update(user_id.as_bytes());
        hasher.finalize().to_vec()
    }

    pub fn mint(&self, user_id: Uuid) -> String {
        let id = user_id.to_string();
        format!("{id}.{}", hex::encode(self.sign(&id)))
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let (id, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let user_id = Uuid::parse_str(id).map_err(|_| AuthError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| AuthError::Malformed)?;

        if !constant_time_eq(&signature, &self.sign(id)) {
            return Err(AuthError::BadSignature);
        }
        Ok(user_id)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// The verified caller. Present in a handler means the request carried a
/// valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<AppState<S>> for AuthUser
where
    S: GuidanceStore + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AuthError::Missing)?;

        let user_id = state.tokens.verify(token.trim()).map_err(|e| {
            tracing::warn!("🔒 rejected token: {}", e);
            e
        })?;
        Ok(AuthUser(user_id))
    }
}
