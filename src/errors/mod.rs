//! # Error Handling
//!
//! Error types for listener translation, defined with `thiserror`.

/// Custom result type for listener translation
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for listener translation
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Two filter chains would be selected for the same connection
    #[error(
        "Ambiguous filter chain match on transport '{transport_protocol}' for server name '{server_name}': chains '{first}' and '{second}'"
    )]
    AmbiguousMatch { transport_protocol: String, server_name: String, first: String, second: String },

    /// Two distinct secrets derived the same SDS secret name
    #[error("SDS secret name '{name}' is derived from more than one secret")]
    SecretNameCollision { name: String },

    /// Encoding of the assembled listener failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A typed envelope carries a different resource kind than requested
    #[error("Expected resource of type '{expected}', found '{found}'")]
    TypeMismatch { expected: String, found: String },

    /// Decoding a typed envelope failed
    #[error("Decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        if fields.is_empty() {
            // Only nested structs failed
            return Self::validation(format!("Validation failed: {}", errors));
        }
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}
