use thiserror::Error;

/// Wording shown to users when the AI reply could not be turned into a meal.
pub const RETRY_MESSAGE: &str =
    "AI can be temperamental, please try again. The recipe could not be read this time.";

/// Errors that can occur while importing a meal
#[derive(Error, Debug)]
pub enum ImportError {
    /// The AI reply contained neither a fenced JSON block nor a bare object/array
    #[error("No JSON content found in the response")]
    NoJsonFound,

    /// A JSON-looking candidate was found but did not parse
    #[error("JSON decoding failed: {0}")]
    JsonDecode(#[source] serde_json::Error),

    /// The reply parsed, but not into something shaped like a meal
    #[error("Parsed JSON is not a meal document: {0}")]
    NotAMealDocument(String),

    /// Create mode was requested without a target collection
    #[error("A collection is required to create a new meal")]
    MissingCollection,

    /// Update mode was requested for a meal that does not exist
    #[error("Meal {0} not found")]
    MealNotFound(i64),

    /// Failed to fetch a page or reach the AI provider
    #[error("Failed to fetch URL: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The page server answered with a non-success status
    #[error("Fetching {url} failed with status {status}")]
    FetchStatus { url: String, status: u16 },

    /// The AI provider failed or returned an unusable envelope
    #[error("Provider error: {0}")]
    Provider(String),

    /// The relational store rejected a read or write
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    Builder(String),

    /// Caller-supplied input was unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A result could not be written out as JSON
    #[error("Failed to write output: {0}")]
    Output(#[source] serde_json::Error),
}

impl ImportError {
    /// The message to surface to an end user.
    ///
    /// Parser diagnostics never leak through here; they stay in `Display`
    /// and the logs.
    pub fn user_message(&self) -> String {
        match self {
            ImportError::NoJsonFound => {
                "The AI reply did not contain any recipe data. Please try again.".to_string()
            }
            ImportError::JsonDecode(_) | ImportError::NotAMealDocument(_) => {
                RETRY_MESSAGE.to_string()
            }
            ImportError::MissingCollection => {
                "Choose a cook book to add this meal to.".to_string()
            }
            ImportError::MealNotFound(_) => "That meal no longer exists.".to_string(),
            ImportError::Fetch(_) | ImportError::FetchStatus { .. } => {
                "Failed to fetch the recipe page. Check the address and try again.".to_string()
            }
            ImportError::Provider(_) => {
                "The AI service is unavailable right now. Please try again.".to_string()
            }
            ImportError::InvalidInput(msg) => msg.clone(),
            ImportError::Output(_) => "The result could not be printed.".to_string(),
            ImportError::Store(_) | ImportError::Config(_) | ImportError::Builder(_) => {
                "An error occurred while saving the recipe.".to_string()
            }
        }
    }

    /// Whether re-submitting the same request with a fresh AI reply could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ImportError::NoJsonFound
                | ImportError::JsonDecode(_)
                | ImportError::NotAMealDocument(_)
                | ImportError::Fetch(_)
                | ImportError::FetchStatus { .. }
                | ImportError::Provider(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_hides_parser_message() {
        let err = serde_json::from_str::<serde_json::Value>(r#"{"title": "X",}"#).unwrap_err();
        let err = ImportError::JsonDecode(err);

        assert!(err.to_string().starts_with("JSON decoding failed"));
        assert_eq!(err.user_message(), RETRY_MESSAGE);
        assert!(!err.user_message().contains("line"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ImportError::NoJsonFound.is_retryable());
        assert!(ImportError::Provider("down".into()).is_retryable());
        assert!(!ImportError::MissingCollection.is_retryable());
        assert!(!ImportError::MealNotFound(3).is_retryable());
    }

    #[test]
    fn test_output_failure_is_not_blamed_on_the_ai() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ImportError::Output(err);

        assert!(err.to_string().starts_with("Failed to write output"));
        assert_ne!(err.user_message(), RETRY_MESSAGE);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_invalid_input_message_passes_through() {
        let err = ImportError::InvalidInput("Recipe text cannot be empty".into());
        assert_eq!(err.user_message(), "Recipe text cannot be empty");
    }
}
