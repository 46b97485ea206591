//! The exposed search API: orchestration plus seen-store, cache and
//! explanation bookkeeping.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kindred_core::{
    CachedSearch, Clock, ExplanationGenerator, PlaceSearchProvider, ScoredCandidate, SearchApi,
    SearchError, SearchRequest, SearchResultSet, SearchStateCache, SearchStateKey, SeenStore,
    SeenStoreError, SystemClock,
};
use log::{debug, warn};
use tokio::task::JoinHandle;

use crate::explain::{ExplanationCache, explain_candidates};
use crate::orchestrator::{SearchOrchestrator, Suppression};

/// Tunables for [`SearchService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Candidates per "show me more" batch.
    pub batch_size: usize,
    /// Maximum cached explanations.
    pub explanation_capacity: usize,
    /// Lifetime of a cached explanation.
    pub explanation_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            batch_size: kindred_core::DEFAULT_DISPLAY_LIMIT,
            explanation_capacity: 512,
            explanation_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// [`SearchApi`] implementation composing the orchestrator with the seen
/// store, search-state cache and explanation generator.
pub struct SearchService<P, E> {
    orchestrator: SearchOrchestrator<P>,
    explainer: E,
    seen: Arc<dyn SeenStore>,
    state: Arc<dyn SearchStateCache>,
    explanations: ExplanationCache,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

impl<P, E> std::fmt::Debug for SearchService<P, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<P, E> SearchService<P, E>
where
    P: PlaceSearchProvider,
    E: ExplanationGenerator,
{
    /// Construct a service using the system clock and default limits.
    pub fn new(
        orchestrator: SearchOrchestrator<P>,
        explainer: E,
        seen: Arc<dyn SeenStore>,
        state: Arc<dyn SearchStateCache>,
    ) -> Self {
        Self::with_config(
            orchestrator,
            explainer,
            seen,
            state,
            ServiceConfig::default(),
            Arc::new(SystemClock),
        )
    }

    /// Construct a service with explicit limits and clock.
    pub fn with_config(
        orchestrator: SearchOrchestrator<P>,
        explainer: E,
        seen: Arc<dyn SeenStore>,
        state: Arc<dyn SearchStateCache>,
        config: ServiceConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let explanations = ExplanationCache::new(
            config.explanation_capacity,
            config.explanation_ttl,
            Arc::clone(&clock),
        );
        Self {
            orchestrator,
            explainer,
            seen,
            state,
            explanations,
            clock,
            config,
        }
    }

    /// Mark a candidate saved or unsaved for an identity and destination.
    ///
    /// # Errors
    /// Propagates [`SeenStoreError`] from the store.
    pub fn set_saved(
        &self,
        identity: &str,
        destination: &str,
        candidate_id: &str,
        saved: bool,
    ) -> Result<(), SeenStoreError> {
        self.seen
            .set_saved(identity, destination, candidate_id, saved, self.clock.now())
    }

    /// Read unsaved seen ids on a blocking worker. Failures show everything.
    async fn seen_ids(&self, request: &SearchRequest) -> HashSet<String> {
        let store = Arc::clone(&self.seen);
        let identity = request.identity.clone();
        let destination = request.destination.key.clone();
        let lookup = tokio::task::spawn_blocking(move || {
            store.unsaved_seen_ids(&identity, &destination)
        })
        .await;
        match lookup {
            Ok(Ok(ids)) => ids,
            Ok(Err(error)) => {
                warn!(
                    "seen lookup for {} failed, showing everything: {error}",
                    request.destination.key
                );
                HashSet::new()
            }
            Err(error) => {
                warn!(
                    "seen lookup for {} did not complete, showing everything: {error}",
                    request.destination.key
                );
                HashSet::new()
            }
        }
    }

    /// Record views of `candidates` on a blocking worker without waiting.
    fn record_views(
        &self,
        identity: &str,
        destination: &str,
        candidates: &[ScoredCandidate],
    ) -> JoinHandle<()> {
        let store = Arc::clone(&self.seen);
        let at = self.clock.now();
        let identity_owned = identity.to_owned();
        let destination_owned = destination.to_owned();
        let ids: Vec<String> = candidates.iter().map(|c| c.id().to_owned()).collect();
        tokio::task::spawn_blocking(move || {
            for id in ids {
                if let Err(error) = store.record_view(&identity_owned, &destination_owned, &id, at)
                {
                    warn!("failed to record view of {id}: {error}");
                }
            }
        })
    }
}

fn displayed_ids(result: &SearchResultSet) -> Vec<String> {
    result
        .displayed
        .iter()
        .map(|candidate| candidate.id().to_owned())
        .collect()
}

fn copy_explanations(result: &mut SearchResultSet) {
    for shown in &result.displayed {
        if let Some(entry) = result.all.iter_mut().find(|c| c.id() == shown.id()) {
            entry.explanation.clone_from(&shown.explanation);
        }
    }
}

#[async_trait]
impl<P, E> SearchApi for SearchService<P, E>
where
    P: PlaceSearchProvider,
    E: ExplanationGenerator,
{
    async fn search(&self, request: &SearchRequest) -> Result<SearchResultSet, SearchError> {
        request.validate()?;
        let key = SearchStateKey::for_request(request);

        let mut exclude: HashSet<String> = request.exclude_ids.iter().cloned().collect();
        let mut previously_displayed = Vec::new();
        if request.continuation.is_some()
            && let Some(previous) = self.state.load(&key)
        {
            exclude.extend(previous.displayed_ids.iter().cloned());
            previously_displayed = previous.displayed_ids;
        }
        let suppression = Suppression {
            exclude,
            seen: self.seen_ids(request).await,
        };

        let mut result = self.orchestrator.run(request, &suppression).await?;

        if let Some(source) = request.source() {
            explain_candidates(
                &self.explainer,
                &self.explanations,
                source,
                &mut result.displayed,
            )
            .await;
            copy_explanations(&mut result);
        }

        let mut displayed = previously_displayed;
        displayed.extend(displayed_ids(&result));
        self.state.store(
            key.clone(),
            CachedSearch {
                identity: request.identity.clone(),
                destination: request.destination.key.clone(),
                source: request.source().cloned(),
                all: result.all.clone(),
                displayed_ids: displayed,
                continuation_token: result.continuation_token.clone(),
            },
        );
        result.cache_key = Some(key.to_string());

        drop(self.record_views(
            &request.identity,
            &request.destination.key,
            &result.displayed,
        ));
        Ok(result)
    }

    async fn get_next_batch(&self, cache_key: &str) -> Option<Vec<ScoredCandidate>> {
        let key = SearchStateKey::from_raw(cache_key);
        let Some(mut batch) = self.state.next_batch(&key, self.config.batch_size) else {
            debug!("no cached candidates left for {cache_key}");
            return None;
        };
        if let Some(source) = &batch.source {
            explain_candidates(
                &self.explainer,
                &self.explanations,
                source,
                &mut batch.candidates,
            )
            .await;
        }
        drop(self.record_views(&batch.identity, &batch.destination, &batch.candidates));
        Some(batch.candidates)
    }
}
