//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map pipeline errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::MissingInput(what) => format!("Missing input: {} (pass --brief <file> or pipe text on stdin)", what),
        ApiError::InvalidInput(message) => format!("Invalid input: {}", message),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_mentions_brief_source() {
        let message = map_error(&ApiError::MissingInput("brief"));
        assert!(message.contains("brief"));
        assert!(message.contains("--brief"));
    }
}
