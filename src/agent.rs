//! Agents: bounded calls to an external generative service.
//!
//! A [`GenerationRequest`] describes one call; the [`AgentClient`] performs it and
//! classifies the outcome into a [`RawAgentResponse`].

pub mod client;
pub mod request;

pub use client::{AgentClient, Payload, RawAgentResponse};
pub use request::{GenerationRequest, TargetShape, Tuning};
