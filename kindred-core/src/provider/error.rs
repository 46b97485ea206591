use thiserror::Error;

/// Errors from [`crate::provider::PlaceSearchProvider`] calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The query text was empty after planning.
    #[error("search query must contain at least one term")]
    EmptyQuery,
    /// The request could not reach the provider.
    #[error("network error calling {url}: {message}")]
    NetworkError {
        /// Requested URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The provider did not answer within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Timeout that elapsed.
        timeout_secs: u64,
    },
    /// The provider answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}: {message}")]
    HttpError {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response or client error description.
        message: String,
    },
    /// The provider rejected the request (quota, invalid argument, ...).
    #[error("provider returned {code}: {message}")]
    ServiceError {
        /// Provider status code.
        code: String,
        /// Provider message.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse provider response: {message}")]
    ParseError {
        /// Decoder error description.
        message: String,
    },
}

/// Errors from [`crate::provider::ExplanationGenerator::explain`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplanationError {
    /// The generator could not be reached or refused the request.
    #[error("explanation generator unavailable: {message}")]
    Unavailable {
        /// Underlying error description.
        message: String,
    },
    /// The generator answered with something other than a list of strings.
    #[error("explanation response was malformed: {message}")]
    Malformed {
        /// Decoder error description.
        message: String,
    },
}
