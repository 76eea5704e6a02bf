//! Record tables for the `table` output format.

use super::shared::{format_section_heading, provenance_label, truncate};
use crate::pipeline::Pipeline;
use crate::records::{
    Concept, Insight, MarketValidation, OpportunitySpace, PersonaCard, ProjectDetail,
};
use crate::task::TaskOutcome;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

const SUMMARY_WIDTH: usize = 60;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(header);
    table
}

pub fn format_concepts_table(pipeline: &Pipeline, concepts: &[TaskOutcome<Concept>]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Concepts"));
    let mut rows = table(vec!["#", "Title", "Summary", "Score", "Markets", "Image", "Source"]);
    for (i, outcome) in concepts.iter().enumerate() {
        let concept = &outcome.value;
        let markets = concept
            .markets
            .iter()
            .map(|m| format!("{}:{}", m.id, m.alignment.as_str()))
            .collect::<Vec<_>>()
            .join(" ");
        rows.add_row(vec![
            (i + 1).to_string(),
            concept.title.clone(),
            truncate(&concept.summary, SUMMARY_WIDTH),
            concept.opportunity_score.to_string(),
            markets,
            pipeline.display_image(outcome),
            provenance_label(outcome),
        ]);
    }
    out.push_str(&format!("{}\n", rows));
    out
}

pub fn format_opportunities_table(
    pipeline: &Pipeline,
    spaces: &[TaskOutcome<OpportunitySpace>],
) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Opportunity spaces"));
    let mut rows = table(vec!["#", "Title", "Themes", "Target users", "Score", "Image", "Source"]);
    for (i, outcome) in spaces.iter().enumerate() {
        let space = &outcome.value;
        rows.add_row(vec![
            (i + 1).to_string(),
            space.title.clone(),
            space.themes.join(", "),
            space.target_users.join(", "),
            space.opportunity_score.to_string(),
            pipeline.display_image(outcome),
            provenance_label(outcome),
        ]);
    }
    out.push_str(&format!("{}\n", rows));
    out
}

pub fn format_insights_table(outcome: &TaskOutcome<Vec<Insight>>) -> String {
    let mut out = format!(
        "{}  [{}]\n\n",
        format_section_heading("Insights"),
        provenance_label(outcome)
    );
    let mut rows = table(vec!["#", "Title", "Statement", "Evidence", "Confidence"]);
    for (i, insight) in outcome.value.iter().enumerate() {
        rows.add_row(vec![
            (i + 1).to_string(),
            insight.title.clone(),
            truncate(&insight.statement, SUMMARY_WIDTH),
            insight.evidence.len().to_string(),
            format!("{}%", insight.confidence),
        ]);
    }
    out.push_str(&format!("{}\n", rows));
    out
}

pub fn format_personas_table(outcome: &TaskOutcome<Vec<PersonaCard>>) -> String {
    let mut out = format!(
        "{}  [{}]\n\n",
        format_section_heading("Personas"),
        provenance_label(outcome)
    );
    let mut rows = table(vec!["#", "Name", "Role", "Age", "Quote", "Headshot"]);
    for (i, persona) in outcome.value.iter().enumerate() {
        rows.add_row(vec![
            (i + 1).to_string(),
            persona.name.clone(),
            persona.role.clone(),
            persona.age.to_string(),
            truncate(&persona.quote, SUMMARY_WIDTH),
            persona.image_url.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    out.push_str(&format!("{}\n", rows));
    out
}

pub fn format_project_table(outcome: &TaskOutcome<ProjectDetail>) -> String {
    let mut out = format!(
        "{}  [{}]\n\n",
        format_section_heading("Project"),
        provenance_label(outcome)
    );
    for opportunity in &outcome.value.opportunities {
        out.push_str(&format!(
            "{}\n{}\n\n",
            format_section_heading(&opportunity.title),
            opportunity.description
        ));
        let mut rows = table(vec!["Concept", "Description"]);
        for concept in &opportunity.concepts {
            rows.add_row(vec![concept.title.clone(), truncate(&concept.description, SUMMARY_WIDTH)]);
        }
        out.push_str(&format!("{}\n\n", rows));
    }
    out
}

pub fn format_validations_table(outcome: &TaskOutcome<Vec<MarketValidation>>) -> String {
    let mut out = format!(
        "{}  [{}]\n\n",
        format_section_heading("Market validation"),
        provenance_label(outcome)
    );
    let mut rows = table(vec!["Market", "Alignment", "Score", "Verdict", "Nuances"]);
    for validation in &outcome.value {
        rows.add_row(vec![
            format!("{} ({})", validation.market_name, validation.market_id),
            validation.alignment.as_str().to_string(),
            validation.score.to_string(),
            validation.verdict.clone(),
            validation.nuances.join("; "),
        ]);
    }
    out.push_str(&format!("{}\n", rows));
    out
}
