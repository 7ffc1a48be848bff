//! Built-in fallback guidance, used only when a user has no stored record
//! for the requested week.
//!
//! Only week 1 has content. Every other week has no entry and resolves to an
//! empty template.

use std::{collections::BTreeMap, sync::OnceLock};

use crate::{
    models::{GuidanceContent, Nutrition},
    week::Week,
};

static TABLE: OnceLock<BTreeMap<Week, GuidanceContent>> = OnceLock::new();

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn build() -> BTreeMap<Week, GuidanceContent> {
    let mut table = BTreeMap::new();
    table.insert(
        Week::FIRST,
        GuidanceContent {
            symptoms: strings(&["Missed period", "Breast tenderness", "Fatigue"]),
            activities: strings(&["Rest", "Eat healthy", "Take prenatal vitamins"]),
            nutrition: Nutrition {
                recommendations: strings(&["Folic acid foods", "Iron-rich foods", "Calcium"]),
                food_to_avoid: strings(&["Raw fish", "Unpasteurized dairy", "High mercury fish"]),
                supplements: strings(&["Prenatal vitamins", "Folic acid"]),
            },
            exercises: strings(&["Walking", "Stretching", "Pelvic floor exercises"]),
            precautions: strings(&["Avoid alcohol", "Avoid smoking", "Avoid hot baths"]),
            medical_tips: strings(&["Schedule first prenatal visit", "Get blood tests"]),
        },
    );
    table
}

pub fn lookup(week: Week) -> Option<&'static GuidanceContent> {
    TABLE.get_or_init(build).get(&week)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_one_has_content() {
        let content = lookup(Week::FIRST).unwrap();
        assert!(content.symptoms.contains(&"Missed period".to_string()));
        assert!(content
            .nutrition
            .recommendations
            .contains(&"Folic acid foods".to_string()));
    }

    #[test]
    fn other_weeks_have_no_entry() {
        for n in 2..=40 {
            assert!(lookup(Week::new(n).unwrap()).is_none(), "week {n}");
        }
    }
}
