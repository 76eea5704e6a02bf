use crate::coerce::{coerce_record_list, Coerce, FieldReader, ListArity};
use crate::defaults::GenerationDefaults;
use serde::{Deserialize, Serialize};

pub const OPPORTUNITY_ARITY: ListArity = ListArity::exactly(2);
pub const CONCEPT_ARITY: ListArity = ListArity::between(3, 4);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConcept {
    pub title: String,
    pub description: String,
}

impl Coerce for ProjectConcept {
    const ENVELOPE_KEYS: &'static [&'static str] = &["concept"];

    fn coerce_fields(fields: &mut FieldReader<'_>, defaults: &GenerationDefaults) -> Self {
        let table = &defaults.project;
        ProjectConcept {
            title: fields.text_any(&["title", "name"], &table.concept_title),
            description: fields.text_any(&["description", "summary"], &table.concept_description),
        }
    }

    fn fallback(defaults: &GenerationDefaults) -> Self {
        ProjectConcept {
            title: defaults.project.concept_title.clone(),
            description: defaults.project.concept_description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOpportunity {
    pub title: String,
    pub description: String,
    pub concepts: Vec<ProjectConcept>,
}

impl Coerce for ProjectOpportunity {
    const ENVELOPE_KEYS: &'static [&'static str] = &["opportunity"];

    fn coerce_fields(fields: &mut FieldReader<'_>, defaults: &GenerationDefaults) -> Self {
        let table = &defaults.project;
        let title = fields.text_any(&["title", "name"], &table.opportunity_title);
        let description = fields.text_any(
            &["description", "summary"],
            &table.opportunity_description,
        );
        let concepts = match fields.value_any(&["concepts", "ideas"]) {
            Some(value) => coerce_record_list(value, CONCEPT_ARITY, defaults),
            None => None,
        };
        let concepts = match concepts {
            Some(coerced) => {
                if coerced.is_partial() {
                    fields.mark_defaulted("concepts");
                }
                coerced.value
            }
            None => {
                fields.mark_defaulted("concepts");
                vec![ProjectConcept::fallback(defaults); CONCEPT_ARITY.min]
            }
        };
        ProjectOpportunity {
            title,
            description,
            concepts,
        }
    }

    fn fallback(defaults: &GenerationDefaults) -> Self {
        ProjectOpportunity {
            title: defaults.project.opportunity_title.clone(),
            description: defaults.project.opportunity_description.clone(),
            concepts: vec![ProjectConcept::fallback(defaults); CONCEPT_ARITY.min],
        }
    }
}

/// Two opportunities, each with three or four concepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    pub opportunities: Vec<ProjectOpportunity>,
}

impl Coerce for ProjectDetail {
    const ENVELOPE_KEYS: &'static [&'static str] = &["project", "projectDetail"];

    fn coerce_fields(fields: &mut FieldReader<'_>, defaults: &GenerationDefaults) -> Self {
        let opportunities = fields
            .value_any(&["opportunities", "opportunitySpaces"])
            .and_then(|value| coerce_record_list(value, OPPORTUNITY_ARITY, defaults));
        let opportunities = match opportunities {
            Some(coerced) => {
                if coerced.is_partial() {
                    fields.mark_defaulted("opportunities");
                }
                coerced.value
            }
            None => {
                fields.mark_defaulted("opportunities");
                vec![ProjectOpportunity::fallback(defaults); OPPORTUNITY_ARITY.min]
            }
        };
        ProjectDetail { opportunities }
    }

    fn fallback(defaults: &GenerationDefaults) -> Self {
        ProjectDetail {
            opportunities: vec![ProjectOpportunity::fallback(defaults); OPPORTUNITY_ARITY.min],
        }
    }
}
