//! Multi-signal candidate scoring.
//!
//! Rules are applied in a fixed order and each positive contribution appends
//! its reason, so the reasons read in rule order rather than by magnitude:
//! rating, review volume, category overlap, price proximity, photos, fixed
//! amenity bonuses, toggled-on preferences, then refinement keywords.

use kindred_core::{AmenityField, Place, PreferenceRegistry};
use log::trace;

use crate::overlap::TypeOverlapScorer;
use crate::types::{CandidateScore, ScoreWeights, ScoringContext};

const MAX_RATING: f64 = 5.0;

/// Scores candidates against reference places and user preferences.
#[derive(Debug, Clone)]
pub struct CandidateScorer {
    registry: PreferenceRegistry,
    weights: ScoreWeights,
    overlap: TypeOverlapScorer,
}

impl Default for CandidateScorer {
    fn default() -> Self {
        Self::new(PreferenceRegistry::builtin().clone())
    }
}

struct Reasons(Vec<String>);

impl Reasons {
    fn push(&mut self, reason: impl Into<String>) {
        self.0.push(reason.into());
    }
}

impl CandidateScorer {
    /// Create a scorer using `registry` and default weights.
    #[must_use]
    pub fn new(registry: PreferenceRegistry) -> Self {
        Self {
            registry,
            weights: ScoreWeights::default(),
            overlap: TypeOverlapScorer,
        }
    }

    /// Replace the rule weights.
    #[must_use]
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// The registry consulted for preference bindings.
    #[must_use]
    pub const fn registry(&self) -> &PreferenceRegistry {
        &self.registry
    }

    /// Score one candidate.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use kindred_core::{Place, PreferenceToggles};
    /// use kindred_scorer::{CandidateScorer, ScoringContext};
    ///
    /// let origin = Coord { x: 0.0, y: 0.0 };
    /// let liked = [Place::new("r", "Liked", origin)
    ///     .with_primary_category("cafe")
    ///     .with_price_level(2)];
    /// let candidate = Place::new("c", "Candidate", origin)
    ///     .with_primary_category("cafe")
    ///     .with_rating(4.0)
    ///     .with_review_count(100)
    ///     .with_price_level(2);
    ///
    /// let toggles = PreferenceToggles::new();
    /// let scored = CandidateScorer::default()
    ///     .score(&candidate, &ScoringContext::new(&liked, &toggles));
    /// assert!((scored.score - 22.0).abs() < 1e-9);
    /// assert!(scored.matched_reasons.iter().any(|r| r == "Similar price"));
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "scores are sums of fractional contributions"
    )]
    pub fn score(&self, candidate: &Place, context: &ScoringContext<'_>) -> CandidateScore {
        let w = &self.weights;
        let mut total = 0.0;
        let mut reasons = Reasons(Vec::new());

        if let Some(rating) = candidate.rating {
            let points = f64::from(rating) / MAX_RATING * w.rating_scale;
            if points > 0.0 {
                total += points;
                reasons.push(format!("Rated {rating:.1}"));
            }
        }

        if candidate.review_count > 0 {
            let points = f64::from(candidate.review_count).log10();
            if points > 0.0 {
                total += points;
                reasons.push(format!("{} reviews", candidate.review_count));
            }
        }

        let references = if context.references.is_empty() {
            context.source.map(std::slice::from_ref).unwrap_or_default()
        } else {
            context.references
        };
        let overlap = self.overlap.score(candidate, references);
        let category_overlap = if overlap.score > 0.0 {
            total += overlap.score;
            let names = overlap.matched_references.join(", ");
            reasons.push(format!("Similar type to {names}"));
            Some(format!("Shares its style with {names}"))
        } else {
            None
        };

        if self.similar_price(candidate, context.source) {
            total += w.similar_price;
            reasons.push("Similar price");
        }

        if !candidate.photos.is_empty() {
            total += w.photos;
            reasons.push("Has photos");
        }

        total += self.fixed_bonuses(candidate, &mut reasons);
        total += self.preference_bonuses(candidate, context, &mut reasons);
        if context.refine {
            total += self.refinement_bonus(candidate, context.keywords, &mut reasons);
        }

        trace!(
            "scored candidate {} at {total:.3} ({} reasons)",
            candidate.id,
            reasons.0.len()
        );
        CandidateScore {
            score: total,
            matched_reasons: reasons.0,
            category_overlap,
        }
    }

    fn similar_price(&self, candidate: &Place, source: Option<&Place>) -> bool {
        match (candidate.price_level, source.and_then(|s| s.price_level)) {
            (Some(candidate_tier), Some(source_tier)) => {
                candidate_tier.abs_diff(source_tier) <= self.weights.price_tolerance
            }
            _ => false,
        }
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "fixed bonuses are fractional points"
    )]
    fn fixed_bonuses(&self, candidate: &Place, reasons: &mut Reasons) -> f64 {
        let w = &self.weights;
        let amenities = &candidate.amenities;
        let mut total = 0.0;
        if AmenityField::OutdoorSeating.is_truthy(amenities) {
            total += w.outdoor_seating;
            reasons.push("Outdoor seating");
        }
        if AmenityField::LiveMusic.is_truthy(amenities) {
            total += w.live_music;
            reasons.push("Live music");
        }
        if AmenityField::GoodForGroups.is_truthy(amenities) {
            total += w.good_for_groups;
            reasons.push("Good for groups");
        }
        if AmenityField::ServesBreakfast.is_truthy(amenities)
            || AmenityField::ServesBrunch.is_truthy(amenities)
        {
            total += w.breakfast_or_brunch;
            reasons.push("Serves breakfast or brunch");
        }
        total
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "preference bonuses are fractional points"
    )]
    fn preference_bonuses(
        &self,
        candidate: &Place,
        context: &ScoringContext<'_>,
        reasons: &mut Reasons,
    ) -> f64 {
        let mut total = 0.0;
        for (_, definition) in self.registry.active(context.toggles) {
            let Some(field) = definition.field else {
                continue;
            };
            if field.is_truthy(&candidate.amenities) {
                total += self.weights.preference;
                reasons.push(definition.label.clone());
            }
        }
        total
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "keyword bonuses accumulate per match"
    )]
    fn refinement_bonus(&self, candidate: &Place, keywords: &[String], reasons: &mut Reasons) -> f64 {
        let haystacks: Vec<String> = std::iter::once(candidate.name.as_str())
            .chain(candidate.categories.iter().map(String::as_str))
            .map(normalise)
            .collect();

        let mut seen = Vec::new();
        let mut total = 0.0;
        for keyword in keywords {
            let needle = normalise(keyword);
            if needle.is_empty() || seen.contains(&needle) {
                continue;
            }
            if haystacks.iter().any(|haystack| haystack.contains(&needle)) {
                total += self.weights.refinement_keyword;
                reasons.push(format!("Matches \"{}\"", keyword.trim()));
            }
            seen.push(needle);
        }
        total
    }
}

fn normalise(text: &str) -> String {
    text.trim().to_lowercase().replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use kindred_core::{Amenities, PhotoRef, PreferenceToggles};
    use rstest::{fixture, rstest};

    const ORIGIN: Coord<f64> = Coord { x: 0.0, y: 0.0 };

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[fixture]
    fn source() -> Place {
        Place::new("ref", "Blue Bottle", ORIGIN)
            .with_primary_category("cafe")
            .with_categories(["cafe"])
            .with_rating(4.5)
            .with_price_level(2)
    }

    /// A candidate that shares nothing with the source.
    #[fixture]
    fn bare() -> Place {
        Place::new("c", "Corner Spot", ORIGIN).with_primary_category("laundromat")
    }

    fn score_with(candidate: &Place, source: &Place, toggles: &PreferenceToggles) -> CandidateScore {
        let references = std::slice::from_ref(source);
        CandidateScorer::default().score(candidate, &ScoringContext::new(references, toggles))
    }

    #[rstest]
    fn scenario_exact_match_scores_twenty_two(source: Place) {
        let candidate = Place::new("c", "Sightglass", ORIGIN)
            .with_primary_category("cafe")
            .with_categories(["cafe"])
            .with_rating(4.0)
            .with_review_count(100)
            .with_price_level(2);
        let scored = score_with(&candidate, &source, &PreferenceToggles::new());
        approx(scored.score, 22.0);
        assert_eq!(
            scored.matched_reasons,
            [
                "Rated 4.0",
                "100 reviews",
                "Similar type to Blue Bottle",
                "Similar price",
            ]
        );
        assert_eq!(
            scored.category_overlap.as_deref(),
            Some("Shares its style with Blue Bottle")
        );
    }

    #[rstest]
    fn bare_candidate_scores_zero(source: Place, bare: Place) {
        let scored = score_with(&bare, &source, &PreferenceToggles::new());
        approx(scored.score, 0.0);
        assert!(scored.matched_reasons.is_empty());
        assert!(scored.category_overlap.is_none());
    }

    #[rstest]
    #[case::absent(None, 0.0)]
    #[case::zero(Some(0.0), 0.0)]
    #[case::five(Some(5.0), 10.0)]
    #[case::three(Some(3.0), 6.0)]
    fn rating_rule(source: Place, bare: Place, #[case] rating: Option<f32>, #[case] expected: f64) {
        let candidate = Place { rating, ..bare };
        approx(score_with(&candidate, &source, &PreferenceToggles::new()).score, expected);
    }

    #[rstest]
    #[case::none(0, 0.0)]
    #[case::one(1, 0.0)]
    #[case::ten(10, 1.0)]
    #[case::ten_thousand(10_000, 4.0)]
    fn review_rule(source: Place, bare: Place, #[case] reviews: u32, #[case] expected: f64) {
        let candidate = bare.with_review_count(reviews);
        let scored = score_with(&candidate, &source, &PreferenceToggles::new());
        approx(scored.score, expected);
        assert_eq!(scored.matched_reasons.is_empty(), expected == 0.0);
    }

    #[rstest]
    #[case::equal(Some(2), 2.0)]
    #[case::adjacent(Some(3), 2.0)]
    #[case::far(Some(4), 0.0)]
    #[case::missing(None, 0.0)]
    fn price_rule(source: Place, bare: Place, #[case] tier: Option<u8>, #[case] expected: f64) {
        let candidate = Place {
            price_level: tier,
            ..bare
        };
        approx(score_with(&candidate, &source, &PreferenceToggles::new()).score, expected);
    }

    #[rstest]
    fn price_rule_needs_source_tier(bare: Place) {
        let unpriced = Place::new("ref", "Unpriced", ORIGIN);
        let candidate = bare.with_price_level(2);
        approx(score_with(&candidate, &unpriced, &PreferenceToggles::new()).score, 0.0);
    }

    #[rstest]
    fn photos_and_fixed_amenities(source: Place, bare: Place) {
        let amenities = Amenities {
            outdoor_seating: Some(true),
            live_music: Some(true),
            good_for_groups: Some(true),
            serves_breakfast: Some(false),
            serves_brunch: Some(true),
            ..Amenities::default()
        };
        let candidate = bare
            .with_photo(PhotoRef::new("photos/1"))
            .with_amenities(amenities);
        let scored = score_with(&candidate, &source, &PreferenceToggles::new());
        approx(scored.score, 0.5 + 1.0 + 1.0 + 0.5 + 0.5);
        assert_eq!(
            scored.matched_reasons,
            [
                "Has photos",
                "Outdoor seating",
                "Live music",
                "Good for groups",
                "Serves breakfast or brunch",
            ]
        );
    }

    #[rstest]
    fn bound_preferences_add_their_label(source: Place, bare: Place) {
        let amenities = Amenities {
            allows_dogs: Some(true),
            serves_vegetarian_food: Some(false),
            ..Amenities::default()
        };
        let candidate = bare.with_amenities(amenities);
        let toggles = PreferenceToggles::new()
            .with_toggle("dog_friendly", true)
            .with_toggle("vegetarian", true)
            .with_toggle("quiet", true);
        let scored = score_with(&candidate, &source, &toggles);
        approx(scored.score, 1.5);
        assert_eq!(scored.matched_reasons, ["Dog friendly"]);
    }

    #[rstest]
    fn preference_label_repeats_amenity_reason(source: Place, bare: Place) {
        let amenities = Amenities {
            outdoor_seating: Some(true),
            ..Amenities::default()
        };
        let candidate = bare.with_amenities(amenities);
        let toggles = PreferenceToggles::new().with_toggle("outdoor_seating", true);
        let scored = score_with(&candidate, &source, &toggles);
        approx(scored.score, 2.5);
        assert_eq!(scored.matched_reasons, ["Outdoor seating", "Outdoor seating"]);
    }

    #[rstest]
    fn structured_amenity_counts_when_non_empty(source: Place, bare: Place) {
        let mut amenities = Amenities {
            accessibility_options: Some([("wheelchair_accessible_entrance".to_owned(), true)].into()),
            ..Amenities::default()
        };
        let toggles = PreferenceToggles::new().with_toggle("wheelchair_accessible", true);
        let populated = score_with(&bare.clone().with_amenities(amenities.clone()), &source, &toggles);
        approx(populated.score, 1.5);

        amenities.accessibility_options = Some(Default::default());
        let empty = score_with(&bare.with_amenities(amenities), &source, &toggles);
        approx(empty.score, 0.0);
    }

    #[rstest]
    fn refinement_keyword_counts_once(source: Place) {
        let candidate = Place::new("c", "Dog Friendly Cafe", ORIGIN)
            .with_primary_category("laundromat")
            .with_categories(["dog_friendly", "dog friendly patio"]);
        let keywords = vec!["dog friendly".to_owned(), "Dog Friendly".to_owned()];
        let toggles = PreferenceToggles::new();
        let references = std::slice::from_ref(&source);
        let context = ScoringContext::new(references, &toggles).refining(&keywords);
        let scored = CandidateScorer::default().score(&candidate, &context);
        approx(scored.score, 3.0);
        assert_eq!(scored.matched_reasons, ["Matches \"dog friendly\""]);
    }

    #[rstest]
    fn keywords_ignored_without_refinement(source: Place) {
        let candidate = Place::new("c", "Dog Friendly Cafe", ORIGIN);
        let keywords = vec!["dog friendly".to_owned()];
        let toggles = PreferenceToggles::new();
        let references = std::slice::from_ref(&source);
        let mut context = ScoringContext::new(references, &toggles).refining(&keywords);
        context.refine = false;
        approx(CandidateScorer::default().score(&candidate, &context).score, 0.0);
    }

    #[rstest]
    fn overlap_falls_back_to_source(source: Place) {
        let candidate = Place::new("c", "Other", ORIGIN).with_primary_category("cafe");
        let toggles = PreferenceToggles::new();
        let context = ScoringContext {
            source: Some(&source),
            references: &[],
            toggles: &toggles,
            keywords: &[],
            refine: false,
        };
        let scored = CandidateScorer::default().score(&candidate, &context);
        approx(scored.score, 10.0);
    }

    #[rstest]
    fn custom_weights_apply(source: Place, bare: Place) {
        let weights = ScoreWeights {
            photos: 4.0,
            ..ScoreWeights::default()
        };
        let candidate = bare.with_photo(PhotoRef::new("p"));
        let scored = CandidateScorer::default()
            .with_weights(weights)
            .score(&candidate, &ScoringContext::new(std::slice::from_ref(&source), &PreferenceToggles::new()));
        approx(scored.score, 4.0);
    }
}
