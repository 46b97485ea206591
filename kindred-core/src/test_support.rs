//! Test doubles shared by the engine crates' unit and behaviour tests.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use async_trait::async_trait;
use geo::Coord;

use crate::{
    AreaRef, ExplanationError, ExplanationGenerator, ExplanationInput, Place, PlaceDetails,
    PlaceSearchProvider, ProviderError, ProviderQuery, SearchPage, SeenRecord, SeenStore,
    SeenStoreError,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `SeenStore` whose every operation fails.
///
/// Exercises the fail-open and best-effort write paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingSeenStore;

fn unavailable(operation: &'static str) -> SeenStoreError {
    SeenStoreError::Backend {
        operation,
        source: Box::new(io::Error::other("seen store offline")),
    }
}

impl SeenStore for FailingSeenStore {
    fn record_view(
        &self,
        _identity: &str,
        _destination: &str,
        _candidate_id: &str,
        _at: SystemTime,
    ) -> Result<(), SeenStoreError> {
        Err(unavailable("record a view"))
    }

    fn unsaved_seen_ids(
        &self,
        _identity: &str,
        _destination: &str,
    ) -> Result<HashSet<String>, SeenStoreError> {
        Err(unavailable("query seen candidates"))
    }

    fn set_saved(
        &self,
        _identity: &str,
        _destination: &str,
        _candidate_id: &str,
        _saved: bool,
        _at: SystemTime,
    ) -> Result<(), SeenStoreError> {
        Err(unavailable("update the saved flag"))
    }

    fn record(
        &self,
        _identity: &str,
        _destination: &str,
        _candidate_id: &str,
    ) -> Result<Option<SeenRecord>, SeenStoreError> {
        Err(unavailable("read a seen record"))
    }
}

/// A rated café with a primary category and matching category set.
pub fn cafe(id: &str, name: &str, rating: f32, location: Coord<f64>) -> Place {
    Place::new(id, name, location)
        .with_primary_category("cafe")
        .with_categories(["cafe"])
        .with_rating(rating)
}

/// How the stub answers a details request.
#[derive(Debug, Clone)]
pub enum DetailsReply {
    /// Return these details.
    Found(PlaceDetails),
    /// Fail with this error.
    Fail(ProviderError),
    /// Never complete.
    Hang,
}

/// Scripted [`PlaceSearchProvider`].
///
/// Search pages are keyed by continuation token (`None` for the first
/// page). Reverse geocoding answers by exact coordinate. Every search query
/// is recorded.
#[derive(Debug, Default)]
pub struct StubPlaceProvider {
    pages: HashMap<Option<String>, SearchPage>,
    search_error: Option<ProviderError>,
    details: HashMap<String, DetailsReply>,
    areas: Vec<(Coord<f64>, Result<Vec<AreaRef>, ProviderError>)>,
    queries: Mutex<Vec<ProviderQuery>>,
    details_requests: Mutex<Vec<String>>,
}

impl StubPlaceProvider {
    /// Serve `places` as the first page.
    pub fn with_places(places: Vec<Place>) -> Self {
        Self::default().with_page(None, places, None)
    }

    /// Serve a page for `continuation`.
    #[must_use]
    pub fn with_page(
        mut self,
        continuation: Option<&str>,
        places: Vec<Place>,
        next_page_token: Option<&str>,
    ) -> Self {
        self.pages.insert(
            continuation.map(str::to_owned),
            SearchPage {
                places,
                next_page_token: next_page_token.map(str::to_owned),
            },
        );
        self
    }

    /// Fail every search.
    #[must_use]
    pub fn failing_search(mut self, error: ProviderError) -> Self {
        self.search_error = Some(error);
        self
    }

    /// Script the details reply for `place_id`.
    #[must_use]
    pub fn with_details(mut self, place_id: &str, reply: DetailsReply) -> Self {
        self.details.insert(place_id.to_owned(), reply);
        self
    }

    /// Script the reverse-geocode reply at `location`.
    #[must_use]
    pub fn with_areas(
        mut self,
        location: Coord<f64>,
        reply: Result<Vec<AreaRef>, ProviderError>,
    ) -> Self {
        self.areas.push((location, reply));
        self
    }

    /// Search queries received so far.
    pub fn queries(&self) -> Vec<ProviderQuery> {
        lock(&self.queries).clone()
    }

    /// Place ids whose details were requested.
    pub fn details_requests(&self) -> Vec<String> {
        lock(&self.details_requests).clone()
    }
}

#[async_trait]
impl PlaceSearchProvider for StubPlaceProvider {
    async fn search(&self, query: &ProviderQuery) -> Result<SearchPage, ProviderError> {
        lock(&self.queries).push(query.clone());
        if let Some(error) = &self.search_error {
            return Err(error.clone());
        }
        if query.text.trim().is_empty() {
            return Err(ProviderError::EmptyQuery);
        }
        Ok(self
            .pages
            .get(&query.continuation)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_details(&self, place_id: &str) -> Result<PlaceDetails, ProviderError> {
        lock(&self.details_requests).push(place_id.to_owned());
        match self.details.get(place_id) {
            Some(DetailsReply::Found(details)) => Ok(details.clone()),
            Some(DetailsReply::Fail(error)) => Err(error.clone()),
            Some(DetailsReply::Hang) => std::future::pending().await,
            None => Ok(PlaceDetails::default()),
        }
    }

    async fn reverse_geocode(&self, location: Coord<f64>) -> Result<Vec<AreaRef>, ProviderError> {
        self.areas
            .iter()
            .find(|(at, _)| *at == location)
            .map_or_else(|| Ok(Vec::new()), |(_, reply)| reply.clone())
    }
}

/// Scripted [`ExplanationGenerator`].
#[derive(Debug, Default)]
pub struct StubExplanationGenerator {
    failure: Option<ExplanationError>,
    limit: Option<usize>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl StubExplanationGenerator {
    /// Fail every call.
    pub fn failing(error: ExplanationError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Return at most `limit` explanations per call.
    pub fn truncated(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Candidate ids of each call received, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        lock(&self.calls).clone()
    }

    /// Text produced for `candidate_name` relative to `source_name`.
    pub fn sentence(source_name: &str, candidate_name: &str) -> String {
        format!("{candidate_name} feels like {source_name}.")
    }
}

#[async_trait]
impl ExplanationGenerator for StubExplanationGenerator {
    async fn explain(
        &self,
        source: &Place,
        candidates: &[ExplanationInput],
    ) -> Result<Vec<String>, ExplanationError> {
        lock(&self.calls).push(candidates.iter().map(|c| c.id.clone()).collect());
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        let limit = self.limit.unwrap_or(candidates.len());
        Ok(candidates
            .iter()
            .take(limit)
            .map(|candidate| Self::sentence(&source.name, &candidate.name))
            .collect())
    }
}
