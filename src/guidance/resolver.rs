use std::sync::Arc;

use uuid::Uuid;

use super::defaults;
use crate::{
    error::AppError,
    models::{GuidancePayload, GuidanceRecord, ResolvedGuidance, WeekTemplate},
    store::GuidanceStore,
    week::Week,
};

/// Picks the guidance a user sees for a week and applies their edits.
///
/// A stored record always wins over built-in content. Built-in content is
/// only a fallback for a missing record: a store failure is returned as an
/// error, never papered over with defaults.
pub struct GuidanceResolver<S> {
    store: Arc<S>,
}

impl<S> Clone for GuidanceResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: GuidanceStore> GuidanceResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Read-only: never writes the fallback into the store.
    pub async fn resolve(&self, user_id: Uuid, week: Week) -> Result<ResolvedGuidance, AppError> {
        if let Some(record) = self.store.find(user_id, week).await? {
            tracing::debug!(%user_id, %week, "serving stored guidance");
            return Ok(ResolvedGuidance::Stored(record));
        }

        let resolved = match defaults::lookup(week) {
            Some(content) => ResolvedGuidance::Default(WeekTemplate {
                week,
                content: content.clone(),
            }),
            None => ResolvedGuidance::Synthesized(WeekTemplate {
                week,
                content: Default::default(),
            }),
        };
        tracing::debug!(%user_id, %week, stored = false, "serving fallback guidance");
        Ok(resolved)
    }

    /// Create or fully replace the user's guidance for `payload.week`.
    /// Returns the record as persisted.
    pub async fn upsert(
        &self,
        user_id: Uuid,
        payload: GuidancePayload,
    ) -> Result<GuidanceRecord, AppError> {
        let week = Week::new(payload.week)?;
        let content = payload.into_content();
        let record = self.store.upsert(user_id, week, content).await?;

        tracing::info!(%user_id, %week, id = %record.id, "📝 guidance saved");
        Ok(record)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<GuidanceRecord>, AppError> {
        Ok(self.store.list(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::GuidanceContent,
        store::{MemoryGuidanceStore, StoreError},
    };
    use serde_json::json;

    fn resolver() -> GuidanceResolver<MemoryGuidanceStore> {
        GuidanceResolver::new(Arc::new(MemoryGuidanceStore::new()))
    }

    fn week(n: i64) -> Week {
        Week::new(n).unwrap()
    }

    fn payload(value: serde_json::Value) -> GuidancePayload {
        serde_json::from_value(value).unwrap()
    }

    fn nausea_week_5() -> GuidancePayload {
        payload(json!({
            "week": 5,
            "symptoms": ["nausea"],
            "activities": [],
            "nutrition": { "recommendations": [], "foodToAvoid": [], "supplements": [] },
            "exercises": [],
            "precautions": [],
            "medicalTips": []
        }))
    }

    #[tokio::test]
    async fn week_one_without_record_serves_builtin_default() {
        let r = resolver();
        let resolved = r.resolve(Uuid::new_v4(), week(1)).await.unwrap();

        assert!(matches!(resolved, ResolvedGuidance::Default(_)));

        let content = resolved.content();
        assert!(content.symptoms.contains(&"Missed period".to_string()));
        let recommendations = &content.nutrition.recommendations;
        assert!(recommendations.contains(&"Folic acid foods".to_string()));
    }

    #[tokio::test]
    async fn week_without_default_serves_empty_template() {
        let r = resolver();
        for n in [2, 17, 40] {
            let resolved = r.resolve(Uuid::new_v4(), week(n)).await.unwrap();
            assert!(matches!(resolved, ResolvedGuidance::Synthesized(_)));
            assert_eq!(resolved.week(), week(n));
            assert!(resolved.content().is_empty());
        }
    }

    #[tokio::test]
    async fn resolve_does_not_persist_defaults() {
        let r = resolver();
        let user = Uuid::new_v4();
        r.resolve(user, week(1)).await.unwrap();
        r.resolve(user, week(9)).await.unwrap();
        assert!(r.store().is_empty().await);
    }

    #[tokio::test]
    async fn stored_record_wins_over_default() {
        let r = resolver();
        let user = Uuid::new_v4();
        r.upsert(user, nausea_week_5()).await.unwrap();

        let resolved = r.resolve(user, week(5)).await.unwrap();
        assert!(resolved.is_stored());
        assert_eq!(resolved.content().symptoms, vec!["nausea"]);
    }

    #[tokio::test]
    async fn stored_week_one_is_not_merged_with_default() {
        let r = resolver();
        let user = Uuid::new_v4();
        let edit = payload(json!({ "week": 1, "symptoms": ["Heartburn"] }));
        r.upsert(user, edit).await.unwrap();

        let resolved = r.resolve(user, week(1)).await.unwrap();
        assert!(resolved.is_stored());
        assert_eq!(resolved.content().symptoms, vec!["Heartburn"]);
        assert!(resolved.content().nutrition.recommendations.is_empty());
    }

    #[tokio::test]
    async fn records_are_per_user() {
        let r = resolver();
        let owner = Uuid::new_v4();
        r.upsert(owner, nausea_week_5()).await.unwrap();

        let other = r.resolve(Uuid::new_v4(), week(5)).await.unwrap();
        assert!(!other.is_stored());
    }

    #[tokio::test]
    async fn repeated_upsert_is_idempotent() {
        let r = resolver();
        let user = Uuid::new_v4();
        let first = r.upsert(user, nausea_week_5()).await.unwrap();
        let second = r.upsert(user, nausea_week_5()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(r.store().len().await, 1);
        assert_eq!(second.content, nausea_week_5().into_content());

        match r.resolve(user, week(5)).await.unwrap() {
            ResolvedGuidance::Stored(record) => assert_eq!(record, second),
            other => panic!("expected stored guidance, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_upsert_fully_replaces_the_first() {
        let r = resolver();
        let user = Uuid::new_v4();
        let first = payload(json!({ "week": 8, "exercises": ["Yoga"] }));
        let second = payload(json!({ "week": 8, "symptoms": ["back pain"] }));
        r.upsert(user, first).await.unwrap();
        r.upsert(user, second).await.unwrap();

        let resolved = r.resolve(user, week(8)).await.unwrap();
        assert_eq!(resolved.content().symptoms, vec!["back pain"]);
        assert!(resolved.content().exercises.is_empty());
        assert_eq!(r.store().len().await, 1);
    }

    #[tokio::test]
    async fn upsert_sets_and_keeps_timestamps() {
        let r = resolver();
        let user = Uuid::new_v4();
        let created = r.upsert(user, nausea_week_5()).await.unwrap();
        assert_eq!(created.created_at, created.updated_at);

        let edit = payload(json!({ "week": 5, "symptoms": ["cramps"] }));
        let updated = r.upsert(user, edit).await.unwrap();
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn upsert_rejects_out_of_range_week_without_writing() {
        let r = resolver();
        let user = Uuid::new_v4();
        for bad in [0, 41, -1] {
            let edit = payload(json!({ "week": bad, "symptoms": ["x"] }));
            let err = r.upsert(user, edit).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{bad}: {err:?}");
        }
        assert!(r.store().is_empty().await);
    }

    #[tokio::test]
    async fn list_returns_records_sorted_by_week() {
        let r = resolver();
        let user = Uuid::new_v4();
        for n in [20, 4, 11] {
            let edit = payload(json!({ "week": n }));
            r.upsert(user, edit).await.unwrap();
        }
        let records = r.list(user).await.unwrap();
        let weeks: Vec<u8> = records.iter().map(|g| g.week.get()).collect();
        assert_eq!(weeks, vec![4, 11, 20]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_upserts_leave_exactly_one_record() {
        let r = resolver();
        let user = Uuid::new_v4();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let r = r.clone();
                let edit = payload(json!({ "week": 12, "symptoms": [format!("s{i}")] }));
                tokio::spawn(async move { r.upsert(user, edit).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }

        assert_eq!(r.store().len().await, 1);
        assert!(ids.iter().all(|id| *id == ids[0]));

        let stored = r.resolve(user, week(12)).await.unwrap();
        let symptom = &stored.content().symptoms[0];
        assert!((0..32).any(|i| *symptom == format!("s{i}")));
    }

    struct DownStore;

    impl GuidanceStore for DownStore {
        async fn find(&self, _: Uuid, _: Week) -> Result<Option<GuidanceRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn list(&self, _: Uuid) -> Result<Vec<GuidanceRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn upsert(
            &self,
            _: Uuid,
            _: Week,
            _: GuidanceContent,
        ) -> Result<GuidanceRecord, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn unreachable_store_is_an_error_not_default_content() {
        let r = GuidanceResolver::new(Arc::new(DownStore));
        let user = Uuid::new_v4();
        let err = r.resolve(user, week(1)).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));

        let err = r.upsert(user, nausea_week_5()).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }
}
