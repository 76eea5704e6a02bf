use crate::coerce::{Coerce, FieldReader, ListArity};
use crate::defaults::GenerationDefaults;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const AGE_RANGE: RangeInclusive<u32> = 18..=90;
pub const GOAL_ARITY: ListArity = ListArity::exactly(3);
pub const FRUSTRATION_ARITY: ListArity = ListArity::exactly(3);
pub const PERSONA_COUNT: usize = 5;

/// A persona drafted from the brief
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaCard {
    pub name: String,
    pub role: String,
    pub quote: String,
    pub goals: Vec<String>,
    pub frustrations: Vec<String>,
    pub age: u32,
    pub keyword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PersonaCard {
    /// One-line description used when writing a headshot prompt.
    pub fn portrait_brief(&self) -> String {
        format!("{}, {}, age {}. \"{}\"", self.name, self.role, self.age, self.quote)
    }
}

impl Coerce for PersonaCard {
    const ENVELOPE_KEYS: &'static [&'static str] = &["personas", "persona"];

    fn coerce_fields(fields: &mut FieldReader<'_>, defaults: &GenerationDefaults) -> Self {
        let table = &defaults.persona;
        let name = fields.text("name", &table.name);
        let role = fields.text_any(&["role", "occupation", "title"], &table.role);
        let quote = fields.text("quote", &table.quote);
        let goals = fields.list("goals", GOAL_ARITY, &table.goals);
        let frustrations = fields.list_any(
            &["frustrations", "painPoints", "pains"],
            FRUSTRATION_ARITY,
            &table.frustrations,
        );
        let age = fields.score("age", AGE_RANGE, table.age);
        // Headshots are keyed on the role, not the person's name.
        let keyword = defaults.keyword_for(fields.optional_text("keyword").as_deref(), &role);
        let image_url = fields.optional_text("imageUrl");

        PersonaCard {
            name,
            role,
            quote,
            goals,
            frustrations,
            age,
            keyword,
            image_url,
        }
    }

    fn fallback(defaults: &GenerationDefaults) -> Self {
        let empty = serde_json::Value::Null;
        PersonaCard::coerce_fields(&mut FieldReader::new(&empty), defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::coerce_record;

    #[test]
    fn persona_fields_are_coerced() {
        let defaults = GenerationDefaults::default();
        let raw = r#"{"persona": {"name": "Maya", "occupation": "Nurse", "age": "112",
            "goals": ["Rest"], "pain_points": "Shifts; Paperwork; Parking; Noise"}}"#;
        let persona = coerce_record::<PersonaCard>(raw, &defaults).unwrap().value;
        assert_eq!(persona.role, "Nurse");
        assert_eq!(persona.age, 90);
        assert_eq!(persona.goals.len(), 3);
        assert_eq!(persona.frustrations, vec!["Shifts", "Paperwork", "Parking"]);
        assert_eq!(persona.keyword, "nurse");
    }
}
