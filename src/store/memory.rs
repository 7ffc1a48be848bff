use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{GuidanceStore, StoreError};
use crate::{
    models::{GuidanceContent, GuidanceRecord},
    week::Week,
};

/// In-process store keyed by `(user_id, week)`.
///
/// One lock covers every key, so the lookup and write inside `upsert` can
/// never interleave with another upsert.
#[derive(Debug, Default)]
pub struct MemoryGuidanceStore {
    records: Mutex<BTreeMap<(Uuid, Week), GuidanceRecord>>,
}

impl MemoryGuidanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

impl GuidanceStore for MemoryGuidanceStore {
    async fn find(&self, user_id: Uuid, week: Week) -> Result<Option<GuidanceRecord>, StoreError> {
        Ok(self.records.lock().await.get(&(user_id, week)).cloned())
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<GuidanceRecord>, StoreError> {
        // BTreeMap order is (user_id, week), so one user's range is already sorted by week
        let records = self.records.lock().await;
        Ok(records
            .range((user_id, Week::FIRST)..)
            .take_while(|((owner, _), _)| *owner == user_id)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        week: Week,
        content: GuidanceContent,
    ) -> Result<GuidanceRecord, StoreError> {
        let mut records = self.records.lock().await;
        let now = Utc::now();

        let record = records
            .entry((user_id, week))
            .and_modify(|existing| {
                existing.content = content.clone();
                existing.updated_at = now;
            })
            .or_insert_with(|| GuidanceRecord {
                id: Uuid::new_v4(),
                user_id,
                week,
                content,
                created_at: now,
                updated_at: now,
            });

        Ok(record.clone())
    }
}
