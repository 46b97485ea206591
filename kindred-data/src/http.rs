//! Plumbing shared by the HTTP collaborators.

use std::time::Duration;

use kindred_core::ProviderError;
use reqwest::{Client, Response};
use serde::Deserialize;
use url::Url;

use crate::ProviderBuildError;

/// Parse `base_url`, ensuring it ends in `/` so relative joins append.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, ProviderBuildError> {
    let normalised = if base_url.ends_with('/') {
        base_url.to_owned()
    } else {
        format!("{base_url}/")
    };
    Url::parse(&normalised).map_err(|source| ProviderBuildError::InvalidBaseUrl {
        url: base_url.to_owned(),
        source,
    })
}

pub(crate) fn build_client(
    user_agent: &str,
    timeout: Duration,
) -> Result<Client, ProviderBuildError> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
        .map_err(ProviderBuildError::HttpClient)
}

/// Map a transport-level `reqwest` error onto [`ProviderError`].
pub(crate) fn convert_reqwest_error(
    error: &reqwest::Error,
    url: &str,
    timeout: Duration,
) -> ProviderError {
    if error.is_timeout() {
        return ProviderError::Timeout {
            url: url.to_owned(),
            timeout_secs: timeout.as_secs(),
        };
    }
    if let Some(status) = error.status() {
        return ProviderError::HttpError {
            url: url.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }
    ProviderError::NetworkError {
        url: url.to_owned(),
        message: error.to_string(),
    }
}

/// Google-style error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Decode the body of a successful response, or turn a failed one into a
/// [`ProviderError`].
///
/// Non-success responses carrying an error envelope become
/// [`ProviderError::ServiceError`]; anything else keeps its HTTP status.
pub(crate) async fn read_json<T>(response: Response, url: &str) -> Result<T, ProviderError>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|error| ProviderError::NetworkError {
            url: url.to_owned(),
            message: error.to_string(),
        })?;
    if !status.is_success() {
        return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => ProviderError::ServiceError {
                code: envelope
                    .error
                    .status
                    .unwrap_or_else(|| status.as_u16().to_string()),
                message: envelope.error.message,
            },
            Err(_) => ProviderError::HttpError {
                url: url.to_owned(),
                status: status.as_u16(),
                message: body,
            },
        });
    }
    serde_json::from_str(&body).map_err(|error| ProviderError::ParseError {
        message: error.to_string(),
    })
}
