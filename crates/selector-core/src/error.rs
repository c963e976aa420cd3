use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Missing result field `{field}` in {query} response")]
    MissingField {
        query: &'static str,
        field: &'static str,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Callback failed: {0}")]
    Callback(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SelectorError {
    /// Text recorded in the error map for this failure.
    ///
    /// Fetch failures carry the envelope's own message verbatim; every other
    /// variant falls back to its display form.
    pub fn failure_message(&self) -> String {
        match self {
            SelectorError::Fetch(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SelectorError>;
