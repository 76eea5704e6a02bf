//! Single-agent task: one agent call plus one coercion, always yielding a value.
//!
//! | Agent outcome            | Result                          |
//! |--------------------------|---------------------------------|
//! | service not configured   | fallback, no retry              |
//! | transport / status error | fallback, no retry              |
//! | empty payload            | fallback                        |
//! | unparseable text         | fallback                        |
//! | parsed                   | coerced record (maybe defaulted)|

use crate::agent::{AgentClient, GenerationRequest, RawAgentResponse, TargetShape};
use crate::coerce::{extract, Coerced};
use crate::error::GenerationFault;
use serde::Serialize;
use tracing::{debug, warn};

/// Where a task's value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    Agent { defaulted: Vec<&'static str> },
    Fallback { fault: GenerationFault },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOutcome<T> {
    pub value: T,
    pub provenance: Provenance,
}

impl<T> TaskOutcome<T> {
    pub fn from_agent(coerced: Coerced<T>) -> Self {
        Self {
            value: coerced.value,
            provenance: Provenance::Agent {
                defaulted: coerced.defaulted,
            },
        }
    }

    pub fn fallback(value: T, fault: GenerationFault) -> Self {
        Self {
            value,
            provenance: Provenance::Fallback { fault },
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.provenance, Provenance::Fallback { .. })
    }

    /// The fault to report, if any. Partially defaulted agent output reports
    /// `PartialFieldDefaulted`.
    pub fn fault(&self) -> Option<GenerationFault> {
        match &self.provenance {
            Provenance::Fallback { fault } => Some(*fault),
            Provenance::Agent { defaulted } if !defaulted.is_empty() => {
                Some(GenerationFault::PartialFieldDefaulted)
            }
            Provenance::Agent { .. } => None,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TaskOutcome<U> {
        TaskOutcome {
            value: f(self.value),
            provenance: self.provenance,
        }
    }
}

/// Apply the decision table to a response that has already arrived.
pub fn settle<T>(
    shape: TargetShape,
    response: RawAgentResponse,
    coerce: impl FnOnce(&str) -> Option<Coerced<T>>,
    fallback: impl FnOnce() -> T,
) -> TaskOutcome<T> {
    let text = match response.into_text() {
        Ok(text) => text,
        Err(reason) => {
            let fault = reason.fault();
            warn!(
                shape = %shape,
                fault = fault.as_str(),
                reason = %reason,
                "Agent failed; using fallback"
            );
            return TaskOutcome::fallback(fallback(), fault);
        }
    };
    match coerce(&text) {
        Some(coerced) => {
            if coerced.is_partial() {
                debug!(
                    shape = %shape,
                    fault = GenerationFault::PartialFieldDefaulted.as_str(),
                    fields = ?coerced.defaulted,
                    "Agent output partially defaulted"
                );
            }
            TaskOutcome::from_agent(coerced)
        }
        None => {
            let fault = GenerationFault::UnparseableResponse;
            warn!(
                shape = %shape,
                fault = fault.as_str(),
                chars = text.len(),
                "Agent output unparseable; using fallback"
            );
            TaskOutcome::fallback(fallback(), fault)
        }
    }
}

/// One agent call paired with one coercion
pub struct SingleAgentTask<'a> {
    client: &'a AgentClient,
    request: GenerationRequest,
}

impl<'a> SingleAgentTask<'a> {
    pub fn new(client: &'a AgentClient, request: GenerationRequest) -> Self {
        Self { client, request }
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    pub async fn run<T>(
        self,
        coerce: impl FnOnce(&str) -> Option<Coerced<T>>,
        fallback: impl FnOnce() -> T,
    ) -> TaskOutcome<T> {
        let response = self.client.generate_text(&self.request).await;
        settle(self.request.shape(), response, coerce, fallback)
    }

    /// Free-text task (image prompts). The fallback is `None`.
    pub async fn run_text(self) -> TaskOutcome<Option<String>> {
        self.run(
            |text| {
                extract::plain_text(text).map(|prompt| Coerced {
                    value: Some(prompt),
                    defaulted: Vec::new(),
                })
            },
            || None,
        )
        .await
    }
}
