/// Result alias that carries the custom [`InsoleError`] type.
pub type Result<T> = std::result::Result<T, InsoleError>;

/// Common error type for the core crate.
///
/// Cursor and slice operations never fail; errors only surface at the
/// configuration and file boundaries.
#[derive(Debug, thiserror::Error)]
pub enum InsoleError {
    /// Free-form message for collaborators that have no better taxonomy.
    #[error("{0}")]
    Message(String),
    /// An argument that can never be meaningful, such as a zero playback rate.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl InsoleError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for InsoleError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for InsoleError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_wrapped_messages() {
        let err: InsoleError = "boom".into();
        assert_eq!(format!("{err}"), "boom");

        let err = InsoleError::InvalidInput("rate must be positive");
        assert!(format!("{err}").contains("rate must be positive"));
    }
}
