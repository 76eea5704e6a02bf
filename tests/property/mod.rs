//! Property-based tests for coercion and stream decoding

mod coercion;
mod frames;
