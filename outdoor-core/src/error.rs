use thiserror::Error;

/// Failure of a single fetch against one of the external endpoints.
///
/// `Stale` never reaches the user: the coordinator drops superseded results
/// before they are applied. It exists so callers that race requests by hand
/// can report the outcome with the same type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport failure or non-success HTTP status.
    #[error("Network failure: {0}")]
    Network(String),

    /// The request went through but the payload is unusable.
    #[error("Invalid data: {0}")]
    Data(String),

    /// A newer request on the same channel replaced this one.
    #[error("Result superseded by a newer request")]
    Stale,

    /// A search matched nothing.
    #[error("No results")]
    Empty,
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }

    /// Short message suitable for the transient notification.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Network(_) | FetchError::Data(_) => "Something went wrong. Please try again.",
            FetchError::Stale => "",
            FetchError::Empty => "No results found.",
        }
    }

    /// Whether this outcome should be shown to the user at all.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, FetchError::Stale)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_stay_generic() {
        let err = FetchError::network("connection refused");
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
        assert!(!err.user_message().contains("refused"));

        assert_eq!(FetchError::Empty.user_message(), "No results found.");
    }

    #[test]
    fn stale_is_never_reported() {
        assert!(!FetchError::Stale.is_reportable());
        assert!(FetchError::data("missing field").is_reportable());
    }

    #[test]
    fn display_includes_detail() {
        let err = FetchError::data("weather payload carried an error field");
        assert!(err.to_string().contains("Invalid data"));
        assert!(err.to_string().contains("error field"));
    }
}
