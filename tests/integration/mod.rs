//! Integration tests for the ideagen generation pipeline

mod concept_flow;
mod config_integration;
mod flows;
mod scenarios;
mod streaming;
mod test_utils;
