//! Candidate scoring for the Kindred similar-place engine.
//!
//! - [`TypeOverlapScorer`] measures categorical similarity between a
//!   candidate and the user's reference places on a `0.0..=10.0` scale.
//! - [`CandidateScorer`] combines rating, review volume, category overlap,
//!   price proximity, photos, amenity bonuses, preference matches and
//!   refinement keywords into one score with ordered reasons.
//! - [`RepeatSuppressor`] halves the score of candidates the identity has
//!   already been shown and re-ranks.
//!
//! # Examples
//!
//! ```
//! use std::collections::HashSet;
//! use geo::Coord;
//! use kindred_core::{Place, PreferenceToggles, ScoredCandidate};
//! use kindred_scorer::{CandidateScorer, RepeatSuppressor, ScoringContext};
//!
//! let at = Coord { x: 0.0, y: 0.0 };
//! let liked = [Place::new("r", "Liked", at).with_primary_category("cafe")];
//! let toggles = PreferenceToggles::new();
//! let context = ScoringContext::new(&liked, &toggles);
//! let scorer = CandidateScorer::default();
//!
//! let mut ranked: Vec<_> = ["a", "b"]
//!     .into_iter()
//!     .map(|id| {
//!         let place = Place::new(id, id, at).with_primary_category("cafe").with_rating(4.0);
//!         let scored = scorer.score(&place, &context);
//!         ScoredCandidate::new(place, scored.score, scored.matched_reasons)
//!     })
//!     .collect();
//! RepeatSuppressor::default().apply(&mut ranked, &HashSet::from(["a".to_owned()]));
//! assert_eq!(ranked[0].id(), "b");
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod candidate;
mod overlap;
mod suppress;
mod types;

pub use candidate::CandidateScorer;
pub use overlap::{GENERIC_CATEGORIES, TypeOverlap, TypeOverlapScorer, is_generic_category};
pub use suppress::{RepeatSuppressor, SEEN_PENALTY, rank};
pub use types::{CandidateScore, ScoreWeights, ScoreWeightsError, ScoringContext};
