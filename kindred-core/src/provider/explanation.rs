use async_trait::async_trait;

use crate::{Place, ScoredCandidate};

use super::error::ExplanationError;

/// What the explanation generator is told about one candidate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExplanationInput {
    /// Candidate identifier.
    pub id: String,
    /// Candidate display name.
    pub name: String,
    /// Rating in `0.0..=5.0`.
    pub rating: Option<f32>,
    /// Price tier.
    pub price_level: Option<u8>,
    /// Reasons the ranker matched.
    pub matched_reasons: Vec<String>,
    /// Category overlap narrative.
    pub category_overlap: Option<String>,
    /// Provider editorial summary.
    pub editorial_summary: Option<String>,
}

impl From<&ScoredCandidate> for ExplanationInput {
    fn from(candidate: &ScoredCandidate) -> Self {
        Self {
            id: candidate.place.id.clone(),
            name: candidate.place.name.clone(),
            rating: candidate.place.rating,
            price_level: candidate.place.price_level,
            matched_reasons: candidate.matched_reasons.clone(),
            category_overlap: candidate.category_overlap.clone(),
            editorial_summary: candidate.place.editorial_summary.clone(),
        }
    }
}

/// Batched natural-language explanations.
///
/// One call covers every displayed candidate so the generator can make the
/// sentences distinct from one another. Implementations should return one
/// string per input, in input order; callers tolerate short or failed
/// responses.
#[async_trait]
pub trait ExplanationGenerator: Send + Sync {
    /// Explain why each candidate resembles `source`.
    async fn explain(
        &self,
        source: &Place,
        candidates: &[ExplanationInput],
    ) -> Result<Vec<String>, ExplanationError>;
}

#[async_trait]
impl<T> ExplanationGenerator for std::sync::Arc<T>
where
    T: ExplanationGenerator + ?Sized,
{
    async fn explain(
        &self,
        source: &Place,
        candidates: &[ExplanationInput],
    ) -> Result<Vec<String>, ExplanationError> {
        (**self).explain(source, candidates).await
    }
}
