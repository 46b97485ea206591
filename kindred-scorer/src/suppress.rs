//! Repeat suppression and final ordering.

use std::collections::HashSet;
use std::hash::BuildHasher;

use kindred_core::ScoredCandidate;

/// Multiplier applied to candidates the identity has already seen.
pub const SEEN_PENALTY: f64 = 0.5;

/// Deprioritises candidates already shown to the identity.
///
/// Seen candidates keep their place in the list with a multiplied score; they
/// are never removed, so destinations with few candidates still return
/// results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatSuppressor {
    penalty: f64,
}

impl Default for RepeatSuppressor {
    fn default() -> Self {
        Self {
            penalty: SEEN_PENALTY,
        }
    }
}

impl RepeatSuppressor {
    /// Create a suppressor with a custom multiplier in `0.0..=1.0`.
    ///
    /// Out-of-range values are clamped.
    #[must_use]
    pub fn with_penalty(penalty: f64) -> Self {
        Self {
            penalty: penalty.clamp(0.0, 1.0),
        }
    }

    /// Penalise every candidate whose id is in `seen`, then re-rank.
    ///
    /// # Examples
    /// ```
    /// use std::collections::HashSet;
    /// use geo::Coord;
    /// use kindred_core::{Place, ScoredCandidate};
    /// use kindred_scorer::RepeatSuppressor;
    ///
    /// let at = Coord { x: 0.0, y: 0.0 };
    /// let mut ranked = vec![
    ///     ScoredCandidate::new(Place::new("a", "A", at), 10.0, Vec::new()),
    ///     ScoredCandidate::new(Place::new("b", "B", at), 8.0, Vec::new()),
    /// ];
    /// let seen = HashSet::from(["a".to_owned()]);
    /// RepeatSuppressor::default().apply(&mut ranked, &seen);
    /// assert_eq!(ranked[0].id(), "b");
    /// assert_eq!(ranked[1].score, 5.0);
    /// assert!(ranked[1].seen_before);
    /// ```
    #[expect(
        clippy::float_arithmetic,
        reason = "suppression multiplies scores"
    )]
    pub fn apply<S: BuildHasher>(
        self,
        candidates: &mut [ScoredCandidate],
        seen: &HashSet<String, S>,
    ) {
        for candidate in candidates.iter_mut() {
            if seen.contains(candidate.id()) {
                candidate.score *= self.penalty;
                candidate.seen_before = true;
            }
        }
        rank(candidates);
    }
}

/// Sort by descending score, keeping input order among equal scores.
pub fn rank(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use kindred_core::Place;
    use proptest::prelude::*;
    use rstest::rstest;

    fn candidate(id: &str, score: f64) -> ScoredCandidate {
        ScoredCandidate::new(Place::new(id, id, Coord { x: 0.0, y: 0.0 }), score, Vec::new())
    }

    fn ids(candidates: &[ScoredCandidate]) -> Vec<&str> {
        candidates.iter().map(ScoredCandidate::id).collect()
    }

    #[rstest]
    fn ties_keep_input_order() {
        let mut list = vec![candidate("a", 1.0), candidate("b", 2.0), candidate("c", 1.0)];
        rank(&mut list);
        assert_eq!(ids(&list), ["b", "a", "c"]);
    }

    #[rstest]
    fn unseen_candidates_are_untouched() {
        let mut list = vec![candidate("a", 4.0), candidate("b", 3.0)];
        RepeatSuppressor::default().apply(&mut list, &HashSet::new());
        assert_eq!(ids(&list), ["a", "b"]);
        assert!(list.iter().all(|c| !c.seen_before));
    }

    #[rstest]
    #[case(-0.5, 0.0)]
    #[case(0.25, 0.25)]
    #[case(3.0, 1.0)]
    fn penalty_is_clamped(#[case] requested: f64, #[case] expected: f64) {
        assert_eq!(RepeatSuppressor::with_penalty(requested).penalty, expected);
    }

    proptest! {
        #[test]
        fn seen_scores_halve_and_nothing_is_dropped(
            scores in prop::collection::vec(0.0_f64..40.0, 0..20),
            seen_mask in prop::collection::vec(any::<bool>(), 20),
        ) {
            let mut list: Vec<_> = scores
                .iter()
                .enumerate()
                .map(|(i, score)| candidate(&format!("p{i}"), *score))
                .collect();
            let seen: HashSet<String> = list
                .iter()
                .zip(&seen_mask)
                .filter(|(_, flagged)| **flagged)
                .map(|(c, _)| c.id().to_owned())
                .collect();
            let before: Vec<(String, f64)> =
                list.iter().map(|c| (c.id().to_owned(), c.score)).collect();

            RepeatSuppressor::default().apply(&mut list, &seen);

            prop_assert_eq!(list.len(), before.len());
            for (id, original) in before {
                let after = list.iter().find(|c| c.id() == id).map(|c| c.score);
                let expected = if seen.contains(&id) { original * 0.5 } else { original };
                prop_assert_eq!(after, Some(expected));
            }
            prop_assert!(list.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }
}
