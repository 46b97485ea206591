//! Batched explanations with a bounded cache and a fixed fallback.

use std::sync::Arc;
use std::time::Duration;

use kindred_core::{
    Clock, ExplanationGenerator, ExplanationInput, Place, ScoredCandidate, TtlCache,
};
use log::warn;

/// Sentence used when the generator fails or omits a candidate.
pub const FALLBACK_EXPLANATION: &str =
    "A well-rated spot that shares the feel of the places you already like.";

/// Cache of generated explanations keyed by source and candidate id.
#[derive(Debug)]
pub struct ExplanationCache {
    entries: TtlCache<(String, String), String>,
}

impl ExplanationCache {
    /// Create a cache with explicit bounds.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: TtlCache::with_clock(capacity, ttl, clock),
        }
    }

    fn key(source: &Place, candidate_id: &str) -> (String, String) {
        (source.id.clone(), candidate_id.to_owned())
    }

    /// Cached text for `candidate_id` relative to `source`.
    #[must_use]
    pub fn get(&self, source: &Place, candidate_id: &str) -> Option<String> {
        self.entries.get(&Self::key(source, candidate_id))
    }

    /// Remember generated text.
    pub fn insert(&self, source: &Place, candidate_id: &str, text: String) {
        self.entries.insert(Self::key(source, candidate_id), text);
    }
}

/// Fill `explanation` on every candidate.
///
/// Cached sentences are reused; the rest are requested in one batched call.
/// A failed call or a missing or blank sentence falls back to
/// [`FALLBACK_EXPLANATION`], which is never cached.
pub async fn explain_candidates<E>(
    generator: &E,
    cache: &ExplanationCache,
    source: &Place,
    candidates: &mut [ScoredCandidate],
) where
    E: ExplanationGenerator + ?Sized,
{
    let mut pending = Vec::new();
    for candidate in candidates.iter_mut() {
        match cache.get(source, candidate.id()) {
            Some(text) => candidate.explanation = Some(text),
            None => pending.push(candidate),
        }
    }
    if pending.is_empty() {
        return;
    }

    let inputs: Vec<ExplanationInput> = pending
        .iter()
        .map(|candidate| ExplanationInput::from(&**candidate))
        .collect();
    let texts = match generator.explain(source, &inputs).await {
        Ok(texts) => texts,
        Err(error) => {
            warn!("explanations for {} candidates failed: {error}", inputs.len());
            Vec::new()
        }
    };
    if !texts.is_empty() && texts.len() < inputs.len() {
        warn!(
            "explanation generator returned {} of {} sentences",
            texts.len(),
            inputs.len()
        );
    }

    let mut generated = texts.into_iter();
    for candidate in pending {
        match generated.next().filter(|text| !text.trim().is_empty()) {
            Some(text) => {
                cache.insert(source, candidate.id(), text.clone());
                candidate.explanation = Some(text);
            }
            None => candidate.explanation = Some(FALLBACK_EXPLANATION.to_owned()),
        }
    }
}
