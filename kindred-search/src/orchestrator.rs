//! One search, end to end: plan, query, filter, verify, enrich, score, rank.

use std::collections::HashSet;
use std::time::Duration;

use futures_util::future::join_all;
use geo::Coord;
use kindred_core::geo_math::haversine_km;
use kindred_core::{
    DEFAULT_DISPLAY_LIMIT, Place, PlaceSearchProvider, ProviderError, ProviderQuery,
    ScoredCandidate, SearchError, SearchRequest, SearchResultSet,
};
use kindred_scorer::{CandidateScorer, RepeatSuppressor, ScoringContext};
use log::{debug, info, warn};

use crate::query::{QueryBuilder, QueryPlan};

/// Tunables for [`SearchOrchestrator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Results requested per provider page.
    pub page_size: u8,
    /// Length of the displayed slice.
    pub display_limit: usize,
    /// Hard limit on each per-candidate details fetch.
    pub details_timeout: Duration,
    /// Whether area destinations verify candidates by reverse geocoding.
    pub verify_area_membership: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            display_limit: DEFAULT_DISPLAY_LIMIT,
            details_timeout: Duration::from_secs(3),
            verify_area_membership: true,
        }
    }
}

/// Candidate ids handled specially for one search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suppression {
    /// Dropped before scoring.
    pub exclude: HashSet<String>,
    /// Seen but unsaved; penalised after scoring.
    pub seen: HashSet<String>,
}

/// Drives one search against a [`PlaceSearchProvider`].
#[derive(Debug)]
pub struct SearchOrchestrator<P> {
    provider: P,
    query_builder: QueryBuilder,
    scorer: CandidateScorer,
    suppressor: RepeatSuppressor,
    config: OrchestratorConfig,
}

impl<P> SearchOrchestrator<P>
where
    P: PlaceSearchProvider,
{
    /// Construct an orchestrator with default planning, scoring and limits.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            query_builder: QueryBuilder::default(),
            scorer: CandidateScorer::default(),
            suppressor: RepeatSuppressor::default(),
            config: OrchestratorConfig::default(),
        }
    }

    /// Replace the query builder.
    #[must_use]
    pub fn with_query_builder(mut self, query_builder: QueryBuilder) -> Self {
        self.query_builder = query_builder;
        self
    }

    /// Replace the candidate scorer.
    #[must_use]
    pub fn with_scorer(mut self, scorer: CandidateScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Replace the repeat suppressor.
    #[must_use]
    pub const fn with_suppressor(mut self, suppressor: RepeatSuppressor) -> Self {
        self.suppressor = suppressor;
        self
    }

    /// Replace the limits.
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// The orchestrator's limits.
    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// The wrapped provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Run one search.
    ///
    /// # Errors
    /// Returns [`SearchError::InvalidRequest`] for malformed requests and
    /// [`SearchError::Provider`] when the provider search fails or every
    /// area verification lookup fails. Details failures only degrade the
    /// affected candidate.
    pub async fn run(
        &self,
        request: &SearchRequest,
        suppression: &Suppression,
    ) -> Result<SearchResultSet, SearchError> {
        request.validate()?;
        let plan = self.query_builder.build(request);
        debug!(
            "searching {} for \"{}\" ({} refinement keywords)",
            request.destination.key,
            plan.text,
            plan.refinement_keywords.len()
        );

        let page = self
            .provider
            .search(&ProviderQuery {
                text: plan.text.clone(),
                constraint: plan.constraint.clone(),
                page_size: self.config.page_size,
                continuation: request.continuation.clone(),
            })
            .await?;
        let returned = page.places.len();

        let mut places: Vec<Place> = page
            .places
            .into_iter()
            .filter(|place| place.has_identifier() && place.rating.is_some())
            .filter(|place| {
                !suppression.exclude.contains(&place.id) && !request.exclude_ids.contains(&place.id)
            })
            .collect();

        if self.config.verify_area_membership
            && request.destination.is_area()
            && let Some(area_id) = request.destination.area_id.as_deref()
        {
            places = self.verify_area(places, area_id).await?;
        }

        let enriched = self.enrich(places).await;
        let ranked = self.rank(request, &plan, enriched, &suppression.seen);
        info!(
            "ranked {} of {returned} provider results for {}",
            ranked.len(),
            request.destination.key
        );
        Ok(SearchResultSet::from_ranked(
            ranked,
            self.config.display_limit,
            page.next_page_token,
        ))
    }

    async fn verify_area(
        &self,
        places: Vec<Place>,
        area_id: &str,
    ) -> Result<Vec<Place>, ProviderError> {
        if places.is_empty() {
            return Ok(places);
        }
        let lookups = join_all(
            places
                .iter()
                .map(|place| self.provider.reverse_geocode(place.location)),
        )
        .await;

        let mut first_error = None;
        let mut failures = 0_usize;
        let total = places.len();
        let mut kept = Vec::with_capacity(total);
        for (place, lookup) in places.into_iter().zip(lookups) {
            match lookup {
                Ok(areas) if areas.iter().any(|area| area.id == area_id) => kept.push(place),
                Ok(_) => debug!("dropping {} outside area {area_id}", place.id),
                Err(error) => {
                    warn!("area lookup for {} failed, keeping it: {error}", place.id);
                    failures += 1;
                    first_error.get_or_insert(error);
                    kept.push(place);
                }
            }
        }

        match first_error {
            Some(error) if failures == total => Err(error),
            _ => Ok(kept),
        }
    }

    async fn enrich(&self, places: Vec<Place>) -> Vec<Place> {
        let timeout = self.config.details_timeout;
        join_all(places.into_iter().map(|mut place| async move {
            match tokio::time::timeout(timeout, self.provider.fetch_details(&place.id)).await {
                Ok(Ok(details)) => place.merge_details(details),
                Ok(Err(error)) => warn!("details for {} unavailable: {error}", place.id),
                Err(_) => warn!(
                    "details for {} timed out after {}ms",
                    place.id,
                    timeout.as_millis()
                ),
            }
            place
        }))
        .await
    }

    fn rank(
        &self,
        request: &SearchRequest,
        plan: &QueryPlan,
        places: Vec<Place>,
        seen: &HashSet<String>,
    ) -> Vec<ScoredCandidate> {
        let base = ScoringContext::new(&request.references, &request.toggles);
        let context = if request.refine {
            base.refining(&plan.refinement_keywords)
        } else {
            base
        };
        let center: Coord<f64> = request.destination.center;

        let mut ranked: Vec<ScoredCandidate> = places
            .into_iter()
            .map(|place| {
                let scored = self.scorer.score(&place, &context);
                let distance = haversine_km(center, place.location);
                let mut candidate =
                    ScoredCandidate::new(place, scored.score, scored.matched_reasons);
                candidate.category_overlap = scored.category_overlap;
                candidate.distance_km = Some(distance);
                candidate
            })
            .collect();
        self.suppressor.apply(&mut ranked, seen);
        ranked
    }
}
