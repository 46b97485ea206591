use thiserror::Error;

/// Failure to construct an HTTP collaborator.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// The configured base URL does not parse.
    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        /// Offending URL.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
