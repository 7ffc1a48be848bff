//! Handlers for `/guidance` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/guidance/current` | `?week=N` or `?dueDate=YYYY-MM-DD`; `week` wins when both are set |
//! | `GET`  | `/guidance` | the caller's stored records, ascending by week |
//! | `POST` | `/guidance` | body: [`GuidancePayload`]; returns 201 + persisted record |
//! | `GET`  | `/guidance/progress` | `?dueDate=YYYY-MM-DD` |

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    error::AppError,
    models::{GuidancePayload, GuidanceRecord, ResolvedGuidance},
    store::GuidanceStore,
    week::{current_week_for_date, Progress, Week},
    AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentQuery {
    pub week: Option<i64>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub due_date: NaiveDate,
}

pub fn routes<S>(state: AppState<S>) -> Router
where
    S: GuidanceStore + 'static,
{
    Router::new()
        .route(
            "/guidance",
            get(list_guidance::<S>).post(upsert_guidance::<S>),
        )
        .route("/guidance/current", get(current_guidance::<S>))
        .route("/guidance/progress", get(progress))
        .with_state(state)
}

async fn current_guidance<S>(
    State(state): State<AppState<S>>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<CurrentQuery>, QueryRejection>,
) -> Result<Json<ResolvedGuidance>, AppError>
where
    S: GuidanceStore + 'static,
{
    let Query(params) = query?;

    let week = match (params.week, params.due_date) {
        (Some(week), _) => Week::explicit(week)?,
        (None, Some(due)) => current_week_for_date(due, Utc::now()),
        (None, None) => return Err(AppError::Validation("week or dueDate is required".into())),
    };

    Ok(Json(state.resolver.resolve(user_id, week).await?))
}

async fn list_guidance<S>(
    State(state): State<AppState<S>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<GuidanceRecord>>, AppError>
where
    S: GuidanceStore + 'static,
{
    Ok(Json(state.resolver.list(user_id).await?))
}

async fn upsert_guidance<S>(
    State(state): State<AppState<S>>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<GuidancePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<GuidanceRecord>), AppError>
where
    S: GuidanceStore + 'static,
{
    let Json(payload) = payload?;
    let record = state.resolver.upsert(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn progress(
    AuthUser(_): AuthUser,
    query: Result<Query<ProgressQuery>, QueryRejection>,
) -> Result<Json<Progress>, AppError> {
    let Query(params) = query?;
    Ok(Json(Progress::for_due_date(params.due_date, Utc::now())))
}
