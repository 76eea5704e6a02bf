//! CLI domain: parse, route, output, and presentation only.
//! No generation logic; the route table dispatches to pipeline flows.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_concepts_table, format_insights_table, format_json, format_opportunities_table,
    format_personas_table, format_project_table, format_validations_table,
};
pub use route::RunContext;
