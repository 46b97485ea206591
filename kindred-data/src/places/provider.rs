//! HTTP-based [`PlaceSearchProvider`].
//!
//! # Example
//!
//! ```no_run
//! use kindred_data::places::{HttpPlaceProvider, HttpPlaceProviderConfig};
//! use std::time::Duration;
//!
//! let provider = HttpPlaceProvider::with_config(
//!     HttpPlaceProviderConfig::new("https://places.example.com")
//!         .with_api_key("secret")
//!         .with_timeout(Duration::from_secs(5)),
//! )?;
//! # let _ = provider;
//! # Ok::<(), kindred_data::ProviderBuildError>(())
//! ```

use std::time::Duration;

use async_trait::async_trait;
use geo::Coord;
use kindred_core::{
    AreaRef, GeoConstraint, PlaceDetails, PlaceSearchProvider, ProviderError, ProviderQuery,
    SearchPage,
};
use log::debug;
use reqwest::{Client, RequestBuilder};
use url::Url;

use super::wire::{
    DETAILS_FIELD_MASK, GeocodeResponse, LocationArea, SEARCH_FIELD_MASK, SearchTextRequest,
    SearchTextResponse, WirePlace,
};
use crate::ProviderBuildError;
use crate::http::{build_client, convert_reqwest_error, parse_base_url, read_json};

/// Default user agent for provider requests.
pub const DEFAULT_USER_AGENT: &str = "kindred-places/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

const API_KEY_HEADER: &str = "X-Goog-Api-Key";
const FIELD_MASK_HEADER: &str = "X-Goog-FieldMask";

/// Configuration for [`HttpPlaceProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpPlaceProviderConfig {
    /// Base URL of the places API (e.g. `"https://places.googleapis.com"`).
    pub base_url: String,
    /// Base URL of the reverse-geocoding endpoint. Defaults to `base_url`.
    pub geocode_url: Option<String>,
    /// API key sent with every request.
    pub api_key: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpPlaceProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://places.googleapis.com".to_owned(),
            geocode_url: None,
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpPlaceProviderConfig {
    /// Create a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Use a separate host for reverse geocoding.
    #[must_use]
    pub fn with_geocode_url(mut self, geocode_url: impl Into<String>) -> Self {
        self.geocode_url = Some(geocode_url.into());
        self
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Place search, details and reverse geocoding over HTTP.
///
/// Search uses `POST v1/places:searchText`, details use
/// `GET v1/places/{id}` and reverse geocoding uses
/// `GET maps/api/geocode/json?latlng=..`. Circles become a location bias,
/// rectangles a hard location restriction.
#[derive(Debug)]
pub struct HttpPlaceProvider {
    client: Client,
    config: HttpPlaceProviderConfig,
    base: Url,
    geocode_base: Url,
}

impl HttpPlaceProvider {
    /// Create a provider with default configuration.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpPlaceProviderConfig::new(base_url))
    }

    /// Create a provider with explicit configuration.
    ///
    /// # Errors
    /// Returns an error if a URL is invalid or the HTTP client fails to build.
    pub fn with_config(config: HttpPlaceProviderConfig) -> Result<Self, ProviderBuildError> {
        let base = parse_base_url(&config.base_url)?;
        let geocode_base = match &config.geocode_url {
            Some(url) => parse_base_url(url)?,
            None => base.clone(),
        };
        let client = build_client(&config.user_agent, config.timeout)?;
        Ok(Self {
            client,
            config,
            base,
            geocode_base,
        })
    }

    fn endpoint(base: &Url, path: &str) -> Result<Url, ProviderError> {
        base.join(path).map_err(|error| ProviderError::NetworkError {
            url: format!("{base}{path}"),
            message: error.to_string(),
        })
    }

    fn search_url(&self) -> Result<Url, ProviderError> {
        Self::endpoint(&self.base, "v1/places:searchText")
    }

    fn details_url(&self, place_id: &str) -> Result<Url, ProviderError> {
        let mut url = Self::endpoint(&self.base, "v1/places/")?;
        url.path_segments_mut()
            .map_err(|()| ProviderError::NetworkError {
                url: self.base.to_string(),
                message: "base URL cannot carry a path".to_owned(),
            })?
            .pop_if_empty()
            .push(place_id);
        Ok(url)
    }

    fn geocode_url(&self, location: Coord<f64>) -> Result<Url, ProviderError> {
        let mut url = Self::endpoint(&self.geocode_base, "maps/api/geocode/json")?;
        url.query_pairs_mut()
            .append_pair("latlng", &format!("{},{}", location.y, location.x));
        if let Some(key) = &self.config.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<reqwest::Response, ProviderError> {
        request
            .send()
            .await
            .map_err(|error| convert_reqwest_error(&error, url.as_str(), self.config.timeout))
    }
}

/// Translate the engine's constraint into the request body shape.
fn search_body(query: &ProviderQuery) -> SearchTextRequest {
    let (bias, restriction) = match query.constraint {
        GeoConstraint::Circle { center, radius_km } => (
            Some(LocationArea::Circle {
                center: center.into(),
                radius: radius_km * 1000.0,
            }),
            None,
        ),
        GeoConstraint::Rectangle { bounds } => (
            None,
            Some(LocationArea::Rectangle {
                low: bounds.min().into(),
                high: bounds.max().into(),
            }),
        ),
    };
    SearchTextRequest {
        text_query: query.text.clone(),
        page_size: query.page_size,
        page_token: query.continuation.clone(),
        location_bias: bias,
        location_restriction: restriction,
    }
}

/// Interpret a reverse-geocoding body.
fn geocode_areas(response: GeocodeResponse) -> Result<Vec<AreaRef>, ProviderError> {
    match response.status.as_str() {
        "OK" => Ok(response.results.into_iter().map(AreaRef::from).collect()),
        "ZERO_RESULTS" => Ok(Vec::new()),
        _ => Err(ProviderError::ServiceError {
            code: response.status,
            message: response.error_message.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl PlaceSearchProvider for HttpPlaceProvider {
    async fn search(&self, query: &ProviderQuery) -> Result<SearchPage, ProviderError> {
        if query.text.trim().is_empty() {
            return Err(ProviderError::EmptyQuery);
        }
        let url = self.search_url()?;
        let request = self
            .client
            .post(url.clone())
            .header(FIELD_MASK_HEADER, SEARCH_FIELD_MASK)
            .json(&search_body(query));
        let response = self.send(self.authorised(request), &url).await?;
        let body: SearchTextResponse = read_json(response, url.as_str()).await?;
        let page = body.into_page();
        debug!("{} places for \"{}\"", page.places.len(), query.text);
        Ok(page)
    }

    async fn fetch_details(&self, place_id: &str) -> Result<PlaceDetails, ProviderError> {
        let url = self.details_url(place_id)?;
        let request = self
            .client
            .get(url.clone())
            .header(FIELD_MASK_HEADER, DETAILS_FIELD_MASK);
        let response = self.send(self.authorised(request), &url).await?;
        let body: WirePlace = read_json(response, url.as_str()).await?;
        Ok(body.into_details())
    }

    async fn reverse_geocode(&self, location: Coord<f64>) -> Result<Vec<AreaRef>, ProviderError> {
        let url = self.geocode_url(location)?;
        let response = self.send(self.client.get(url.clone()), &url).await?;
        let body: GeocodeResponse = read_json(response, url.as_str()).await?;
        geocode_areas(body)
    }
}
