//! Categorical similarity between a candidate and the reference places.
//!
//! Each reference contributes a primary-category bonus (exact primary match,
//! reference primary among the candidate's categories, or candidate primary
//! among the reference's categories, strongest rule only) plus half a point
//! per additional shared, non-generic category, capped. The sum is
//! normalised against the best achievable primary bonus so the score stays
//! within `0.0..=10.0` however many references are supplied.

use kindred_core::Place;

/// Category labels too generic to signal similarity.
pub const GENERIC_CATEGORIES: &[&str] = &[
    "point_of_interest",
    "establishment",
    "store",
    "food",
    "place",
    "premise",
    "political",
    "locality",
    "health",
    "finance",
];

const EXACT_PRIMARY: f64 = 6.0;
const REFERENCE_PRIMARY_IN_CANDIDATE: f64 = 5.0;
const CANDIDATE_PRIMARY_IN_REFERENCE: f64 = 4.0;
const SHARED_CATEGORY: f64 = 0.5;
const SHARED_CATEGORY_CAP: f64 = 3.0;
const MAX_SCORE: f64 = 10.0;

/// Report whether `label` is on the generic denylist.
///
/// Comparison ignores case and treats spaces as underscores.
#[must_use]
pub fn is_generic_category(label: &str) -> bool {
    let normalised = label.trim().to_ascii_lowercase().replace(' ', "_");
    GENERIC_CATEGORIES.contains(&normalised.as_str())
}

/// Result of [`TypeOverlapScorer::score`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypeOverlap {
    /// Normalised score in `0.0..=10.0`.
    pub score: f64,
    /// Display names of references with a positive contribution, in input
    /// order.
    pub matched_references: Vec<String>,
}

/// Scores category similarity against a list of reference places.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeOverlapScorer;

impl TypeOverlapScorer {
    /// Score `candidate` against `references`.
    ///
    /// An empty reference list yields a zero score.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use kindred_core::Place;
    /// use kindred_scorer::TypeOverlapScorer;
    ///
    /// let origin = Coord { x: 0.0, y: 0.0 };
    /// let liked = Place::new("r", "Liked", origin)
    ///     .with_primary_category("cafe")
    ///     .with_categories(["cafe", "bakery"]);
    /// let candidate = Place::new("c", "Candidate", origin)
    ///     .with_primary_category("cafe")
    ///     .with_categories(["cafe", "bakery"]);
    ///
    /// let overlap = TypeOverlapScorer.score(&candidate, &[liked]);
    /// assert!((overlap.score - 10.0).abs() < 1e-9);
    /// assert_eq!(overlap.matched_references, ["Liked"]);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "normalisation divides summed contributions"
    )]
    pub fn score(self, candidate: &Place, references: &[Place]) -> TypeOverlap {
        if references.is_empty() {
            return TypeOverlap {
                score: 0.0,
                matched_references: Vec::new(),
            };
        }

        let mut total = 0.0;
        let mut matched_references = Vec::new();
        for reference in references {
            let contribution = per_reference(candidate, reference);
            if contribution > 0.0 {
                matched_references.push(reference.name.clone());
            }
            total += contribution;
        }

        let best = f64::from(u32::try_from(references.len()).unwrap_or(u32::MAX)) * EXACT_PRIMARY;
        let score = (total / best * MAX_SCORE).min(MAX_SCORE);
        TypeOverlap {
            score,
            matched_references,
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "contributions are fractional points"
)]
fn per_reference(candidate: &Place, reference: &Place) -> f64 {
    primary_bonus(candidate, reference) + shared_bonus(candidate, reference)
}

fn primary_bonus(candidate: &Place, reference: &Place) -> f64 {
    let candidate_primary = candidate.primary_category.as_deref();
    let reference_primary = reference.primary_category.as_deref();

    if candidate_primary.is_some() && candidate_primary == reference_primary {
        return EXACT_PRIMARY;
    }
    if reference_primary.is_some_and(|primary| candidate.categories.contains(primary)) {
        return REFERENCE_PRIMARY_IN_CANDIDATE;
    }
    if candidate_primary.is_some_and(|primary| reference.categories.contains(primary)) {
        return CANDIDATE_PRIMARY_IN_REFERENCE;
    }
    0.0
}

#[expect(
    clippy::float_arithmetic,
    reason = "each shared category is worth half a point"
)]
fn shared_bonus(candidate: &Place, reference: &Place) -> f64 {
    let primaries = [
        candidate.primary_category.as_deref(),
        reference.primary_category.as_deref(),
    ];
    let shared_count = candidate
        .categories
        .intersection(&reference.categories)
        .filter(|label| !is_generic_category(label))
        .filter(|label| !primaries.contains(&Some(label.as_str())))
        .count();
    let shared = u32::try_from(shared_count).unwrap_or(u32::MAX);
    (f64::from(shared) * SHARED_CATEGORY).min(SHARED_CATEGORY_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use proptest::prelude::*;
    use rstest::rstest;

    fn place(name: &str, primary: Option<&str>, categories: &[&str]) -> Place {
        let base = Place::new(name, name, Coord { x: 0.0, y: 0.0 })
            .with_categories(categories.iter().copied());
        Place {
            primary_category: primary.map(str::to_owned),
            ..base
        }
    }

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[rstest]
    #[case::exact_primary(Some("cafe"), &["cafe"], Some("cafe"), &["cafe"], 10.0)]
    #[case::reference_primary_in_candidate(Some("bakery"), &["bakery", "cafe"], Some("cafe"), &["cafe"], 5.0 / 6.0 * 10.0)]
    #[case::candidate_primary_in_reference(Some("bakery"), &["bakery"], Some("cafe"), &["cafe", "bakery"], 4.0 / 6.0 * 10.0)]
    #[case::disjoint(Some("bar"), &["bar"], Some("cafe"), &["cafe"], 0.0)]
    #[case::shared_secondary_only(Some("bar"), &["bar", "wifi", "vegan"], Some("cafe"), &["cafe", "wifi", "vegan"], 1.0 / 6.0 * 10.0)]
    #[case::generic_ignored(Some("bar"), &["bar", "food", "store"], Some("cafe"), &["cafe", "food", "store"], 0.0)]
    fn single_reference_rules(
        #[case] candidate_primary: Option<&str>,
        #[case] candidate_categories: &[&str],
        #[case] reference_primary: Option<&str>,
        #[case] reference_categories: &[&str],
        #[case] expected: f64,
    ) {
        let candidate = place("cand", candidate_primary, candidate_categories);
        let reference = place("ref", reference_primary, reference_categories);
        approx(TypeOverlapScorer.score(&candidate, &[reference]).score, expected);
    }

    #[rstest]
    fn shared_bonus_is_capped() {
        let labels = ["cafe", "a", "b", "c", "d", "e", "f", "g", "h"];
        let candidate = place("cand", Some("cafe"), &labels);
        let reference = place("ref", Some("cafe"), &labels);
        assert_eq!(shared_bonus(&candidate, &reference), 3.0);
        approx(TypeOverlapScorer.score(&candidate, &[reference]).score, 10.0);
    }

    #[rstest]
    fn records_matching_reference_names_in_order() {
        let candidate = place("cand", Some("cafe"), &["cafe"]);
        let refs = [
            place("Alpha", Some("cafe"), &["cafe"]),
            place("Beta", Some("bar"), &["bar"]),
            place("Gamma", Some("bakery"), &["bakery", "cafe"]),
        ];
        let overlap = TypeOverlapScorer.score(&candidate, &refs);
        assert_eq!(overlap.matched_references, ["Alpha", "Gamma"]);
        approx(overlap.score, (6.0 + 4.0) / 18.0 * 10.0);
    }

    #[rstest]
    fn empty_reference_list_scores_zero() {
        let candidate = place("cand", Some("cafe"), &["cafe"]);
        let overlap = TypeOverlapScorer.score(&candidate, &[]);
        approx(overlap.score, 0.0);
        assert!(overlap.matched_references.is_empty());
    }

    #[rstest]
    #[case("point_of_interest", true)]
    #[case("Point of Interest", true)]
    #[case("cafe", false)]
    fn generic_detection(#[case] label: &str, #[case] expected: bool) {
        assert_eq!(is_generic_category(label), expected);
    }

    fn arb_place() -> impl Strategy<Value = Place> {
        let labels = prop::sample::subsequence(
            vec!["cafe", "bar", "bakery", "wifi", "vegan", "food", "brunch"],
            0..=7,
        );
        let primary = prop::option::of(prop::sample::select(vec!["cafe", "bar", "bakery"]));
        (labels, primary).prop_map(|(labels, primary)| place("p", primary, &labels))
    }

    proptest! {
        #[test]
        fn score_stays_within_bounds(
            candidate in arb_place(),
            references in prop::collection::vec(arb_place(), 1..6),
        ) {
            let overlap = TypeOverlapScorer.score(&candidate, &references);
            prop_assert!((0.0..=10.0).contains(&overlap.score));
        }

        #[test]
        fn duplicating_references_preserves_score(
            candidate in arb_place(),
            reference in arb_place(),
            copies in 1_usize..5,
        ) {
            let single = TypeOverlapScorer.score(&candidate, std::slice::from_ref(&reference));
            let many = vec![reference; copies];
            let scaled = TypeOverlapScorer.score(&candidate, &many);
            prop_assert!((single.score - scaled.score).abs() < 1e-9);
        }
    }
}
