//! CLI presentation: table and json formatters per flow.

mod records;
mod shared;

pub use records::{
    format_concepts_table, format_insights_table, format_opportunities_table,
    format_personas_table, format_project_table, format_validations_table,
};
pub use shared::format_json;
