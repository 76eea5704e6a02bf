use crate::coerce::{Coerce, FieldReader, ListArity};
use crate::defaults::GenerationDefaults;
use serde::{Deserialize, Serialize};
pub const EVIDENCE_ARITY: ListArity = ListArity::between(2, 3);
/// Insights per scope
pub const INSIGHT_COUNT: usize = 4;

/// A research insight drawn from the project scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub title: String,
    pub statement: String,
    pub evidence: Vec<String>,
    pub confidence: u32,
}

impl Coerce for Insight {
    const ENVELOPE_KEYS: &'static [&'static str] = &["insights", "insight"];

    fn coerce_fields(fields: &mut FieldReader<'_>, defaults: &GenerationDefaults) -> Self {
        let table = &defaults.insight;
        let title = fields.text_any(&["title", "headline"], &table.title);
        let statement = fields.text_any(&["statement", "insight", "description"], &table.statement);
        let evidence = fields.list_any(
            &["evidence", "supportingEvidence"],
            EVIDENCE_ARITY,
            &table.evidence,
        );
        let confidence = fields.percent("confidence", table.confidence);
        Insight {
            title,
            statement,
            evidence,
            confidence,
        }
    }

    fn fallback(defaults: &GenerationDefaults) -> Self {
        let empty = serde_json::Value::Null;
        Insight::coerce_fields(&mut FieldReader::new(&empty), defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::coerce_records;

    #[test]
    fn insights_list_is_padded_to_four() {
        let defaults = GenerationDefaults::default();
        let raw = r#"[{"title": "Commuters", "statement": "Commutes are long", "evidence": ["Survey"], "confidence": 0.8}]"#;
        let insights =
            coerce_records::<Insight>(raw, ListArity::exactly(INSIGHT_COUNT), &defaults).unwrap();
        assert_eq!(insights.value.len(), 4);
        assert_eq!(insights.value[0].evidence.len(), 2);
        // 0.8 is a share, not a percentage.
        assert_eq!(insights.value[0].confidence, 80);
        assert_eq!(insights.value[3], Insight::fallback(&defaults));
    }

    #[test]
    fn single_insight_with_object_evidence_stays_one_record() {
        let defaults = GenerationDefaults::default();
        let raw = r#"{"title": "Trust", "statement": "Users distrust auto-billing",
            "evidence": [{"text": "Survey A"}, {"text": "Interview B"}], "confidence": 70}"#;
        let insights =
            coerce_records::<Insight>(raw, ListArity::exactly(INSIGHT_COUNT), &defaults).unwrap();
        assert_eq!(insights.value[0].title, "Trust");
        assert_eq!(insights.value[0].evidence, vec!["Survey A", "Interview B"]);
        assert_eq!(insights.value[0].confidence, 70);
        assert_eq!(insights.value[1], Insight::fallback(&defaults));
    }
}
