//! Configuration and output types for candidate scoring.

use kindred_core::{Place, PreferenceToggles};
use thiserror::Error;

/// Point values for each scoring rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Points awarded for a perfect 5-star rating.
    pub rating_scale: f64,
    /// Points for a price tier within [`Self::price_tolerance`] of the source.
    pub similar_price: f64,
    /// Largest tier difference still treated as similar.
    pub price_tolerance: u8,
    /// Flat bonus for listing at least one photo.
    pub photos: f64,
    /// Bonus for outdoor seating.
    pub outdoor_seating: f64,
    /// Bonus for live music.
    pub live_music: f64,
    /// Bonus for being good for groups.
    pub good_for_groups: f64,
    /// Bonus for serving breakfast or brunch.
    pub breakfast_or_brunch: f64,
    /// Bonus per toggled-on preference whose amenity is present.
    pub preference: f64,
    /// Bonus per refinement keyword found in the name or categories.
    pub refinement_keyword: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            rating_scale: 10.0,
            similar_price: 2.0,
            price_tolerance: 1,
            photos: 0.5,
            outdoor_seating: 1.0,
            live_music: 1.0,
            good_for_groups: 0.5,
            breakfast_or_brunch: 0.5,
            preference: 1.5,
            refinement_keyword: 3.0,
        }
    }
}

impl ScoreWeights {
    /// Validate the weights and return a copy.
    ///
    /// # Errors
    /// Returns [`ScoreWeightsError::InvalidWeight`] when any point value is
    /// negative or not finite.
    pub fn validate(self) -> Result<Self, ScoreWeightsError> {
        let named = [
            ("rating_scale", self.rating_scale),
            ("similar_price", self.similar_price),
            ("photos", self.photos),
            ("outdoor_seating", self.outdoor_seating),
            ("live_music", self.live_music),
            ("good_for_groups", self.good_for_groups),
            ("breakfast_or_brunch", self.breakfast_or_brunch),
            ("preference", self.preference),
            ("refinement_keyword", self.refinement_keyword),
        ];
        match named
            .into_iter()
            .find(|(_, value)| !value.is_finite() || value.is_sign_negative())
        {
            Some((name, value)) => Err(ScoreWeightsError::InvalidWeight { name, value }),
            None => Ok(self),
        }
    }
}

/// Errors raised when configuring [`ScoreWeights`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreWeightsError {
    /// A point value was negative, infinite or NaN.
    #[error("score weight `{name}` must be finite and non-negative, got {value}")]
    InvalidWeight {
        /// Field name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
}

/// Inputs shared by every candidate scored within one search.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    /// Place used for price comparison.
    pub source: Option<&'a Place>,
    /// All reference places, for category overlap.
    pub references: &'a [Place],
    /// The user's preference toggles.
    pub toggles: &'a PreferenceToggles,
    /// Keywords boosted when refining.
    pub keywords: &'a [String],
    /// Whether this search is a refinement.
    pub refine: bool,
}

impl<'a> ScoringContext<'a> {
    /// Build a context whose source is the first reference place.
    #[must_use]
    pub fn new(references: &'a [Place], toggles: &'a PreferenceToggles) -> Self {
        Self {
            source: references.first(),
            references,
            toggles,
            keywords: &[],
            refine: false,
        }
    }

    /// Enable refinement boosts for `keywords`.
    #[must_use]
    pub const fn refining(mut self, keywords: &'a [String]) -> Self {
        self.keywords = keywords;
        self.refine = true;
        self
    }
}

/// The outcome of scoring one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    /// Summed contributions.
    pub score: f64,
    /// Human-readable reasons in rule order.
    pub matched_reasons: Vec<String>,
    /// Narrative naming the reference places the candidate resembles.
    pub category_overlap: Option<String>,
}
