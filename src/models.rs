use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::week::Week;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    pub recommendations: Vec<String>,
    pub food_to_avoid: Vec<String>,
    pub supplements: Vec<String>,
}

/// The displayable body of a week's guidance, whether stored or built in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceContent {
    pub symptoms: Vec<String>,
    pub activities: Vec<String>,
    pub nutrition: Nutrition,
    pub exercises: Vec<String>,
    pub precautions: Vec<String>,
    pub medical_tips: Vec<String>,
}

impl GuidanceContent {
    pub fn is_empty(&self) -> bool {
        *self == GuidanceContent::default()
    }
}

/// A user's persisted guidance for one week. At most one exists per
/// `(user_id, week)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week: Week,
    #[serde(flatten)]
    pub content: GuidanceContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekTemplate {
    pub week: Week,
    #[serde(flatten)]
    pub content: GuidanceContent,
}

/// What `GET /guidance/current` hands back. `source` tells the client whether
/// the content is the user's own record or built-in fallback content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ResolvedGuidance {
    Stored(GuidanceRecord),
    Default(WeekTemplate),
    Synthesized(WeekTemplate),
}

impl ResolvedGuidance {
    pub fn week(&self) -> Week {
        match self {
            ResolvedGuidance::Stored(record) => record.week,
            ResolvedGuidance::Default(t) | ResolvedGuidance::Synthesized(t) => t.week,
        }
    }

    pub fn content(&self) -> &GuidanceContent {
        match self {
            ResolvedGuidance::Stored(record) => &record.content,
            ResolvedGuidance::Default(t) | ResolvedGuidance::Synthesized(t) => &t.content,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, ResolvedGuidance::Stored(_))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionPayload {
    pub recommendations: Option<Vec<String>>,
    pub food_to_avoid: Option<Vec<String>>,
    pub supplements: Option<Vec<String>>,
}

/// Body of `POST /guidance`. Every content field is optional; anything left
/// out (or `null`) is stored empty, never kept from a previous record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidancePayload {
    pub week: i64,
    pub symptoms: Option<Vec<String>>,
    pub activities: Option<Vec<String>>,
    pub nutrition: Option<NutritionPayload>,
    pub exercises: Option<Vec<String>>,
    pub precautions: Option<Vec<String>>,
    pub medical_tips: Option<Vec<String>>,
}

impl GuidancePayload {
    pub fn into_content(self) -> GuidanceContent {
        let nutrition = self.nutrition.unwrap_or_default();
        GuidanceContent {
            symptoms: self.symptoms.unwrap_or_default(),
            activities: self.activities.unwrap_or_default(),
            nutrition: Nutrition {
                recommendations: nutrition.recommendations.unwrap_or_default(),
                food_to_avoid: nutrition.food_to_avoid.unwrap_or_default(),
                supplements: nutrition.supplements.unwrap_or_default(),
            },
            exercises: self.exercises.unwrap_or_default(),
            precautions: self.precautions.unwrap_or_default(),
            medical_tips: self.medical_tips.unwrap_or_default(),
        }
    }
}
