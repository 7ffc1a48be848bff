//! Pregnancy-week guidance service.
//!
//! Derives a patient's gestational week from a due date (or takes one picked
//! by hand), serves that week's guidance (the patient's own stored record,
//! else built-in content, else an empty template) and saves guidance edits
//! with one record per `(user, week)`.

pub mod auth;
pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod guidance;
pub mod models;
pub mod routes;
pub mod store;
pub mod week;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth::TokenKey, guidance::GuidanceResolver, store::GuidanceStore};

/// Shared state threaded through the guidance handlers.
pub struct AppState<S> {
    pub resolver: GuidanceResolver<S>,
    pub tokens: Arc<TokenKey>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

/// The full application: guidance routes under `/api`, plus `/health`.
pub fn app<S>(state: AppState<S>, cors: CorsLayer) -> Router
where
    S: GuidanceStore + 'static,
{
    Router::new()
        .nest("/api", routes::guidance::routes(state))
        .route("/health", get(|| async { "✅ Backend up" }))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
