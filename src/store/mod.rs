//! The `GuidanceStore` trait: keyed persistence for `(user, week)` guidance.
//!
//! The resolver is the only caller. Backends must keep at most one record per
//! `(user_id, week)`, including under concurrent upserts.

mod memory;
mod postgres;

pub use memory::MemoryGuidanceStore;
pub use postgres::PgGuidanceStore;

use std::future::Future;

use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{GuidanceContent, GuidanceRecord},
    week::Week,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Timeout, refused connection or exhausted pool. Retryable.
    #[error("guidance store unavailable: {0}")]
    Unavailable(String),

    /// A concurrent writer won the race for this key. Retrying the upsert
    /// updates the record it created.
    #[error("guidance for user {user_id} week {week} was written concurrently, retry the request")]
    Conflict { user_id: Uuid, week: Week },

    #[error("guidance store error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub trait GuidanceStore: Send + Sync {
    /// The record stored for `(user_id, week)`, if any.
    fn find(
        &self,
        user_id: Uuid,
        week: Week,
    ) -> impl Future<Output = Result<Option<GuidanceRecord>, StoreError>> + Send + '_;

    /// All of a user's records, ascending by week.
    fn list(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<GuidanceRecord>, StoreError>> + Send + '_;

    /// Insert or fully replace the content for `(user_id, week)` as one atomic
    /// step and return the row as persisted.
    ///
    /// `created_at` is set on insert only; `updated_at` on every call.
    fn upsert(
        &self,
        user_id: Uuid,
        week: Week,
        content: GuidanceContent,
    ) -> impl Future<Output = Result<GuidanceRecord, StoreError>> + Send + '_;
}
