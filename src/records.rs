//! Domain records produced by the pipeline.
//!
//! Every record serializes camelCase and implements [`Coerce`](crate::coerce::Coerce),
//! so it can be filled from a loose agent object or built as a fallback.

pub mod concept;
pub mod insight;
pub mod opportunity;
pub mod persona;
pub mod project;
pub mod validation;

pub use concept::{Concept, Seed};
pub use insight::{Insight, INSIGHT_COUNT};
pub use opportunity::OpportunitySpace;
pub use persona::{PersonaCard, PERSONA_COUNT};
pub use project::{ProjectConcept, ProjectDetail, ProjectOpportunity};
pub use validation::{assign_validations, MarketValidation, ValidationDraft};
