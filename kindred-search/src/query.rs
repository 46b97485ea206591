//! Query planning: keywords and the geographic constraint.
//!
//! Terms are gathered in a fixed order (base terms, free text, category
//! terms from the reference places, preference keywords), de-duplicated
//! ignoring case and truncated. The constraint is a rectangle for area
//! destinations and a circle for point destinations.

use std::collections::HashSet;

use geo::Rect;
use kindred_core::geo_math::{box_around, diagonal_km};
use kindred_core::{Destination, GeoConstraint, Place, PreferenceRegistry, SearchRequest};
use kindred_scorer::is_generic_category;

/// Tunables for [`QueryBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// Terms used when no override keywords are supplied.
    pub base_terms: Vec<String>,
    /// Maximum terms in the provider text query.
    pub max_terms: usize,
    /// Maximum category-derived terms.
    pub max_category_terms: usize,
    /// Maximum preference-derived terms.
    pub max_preference_terms: usize,
    /// Area diagonal above which the exact bounds are replaced by a box.
    pub max_area_diagonal_km: f64,
    /// Half-width of the box used for oversized areas.
    pub oversized_area_half_width_km: f64,
    /// Largest circle radius the provider accepts.
    pub max_radius_km: f64,
    /// Radius used for point destinations without a usable viewport.
    pub fallback_radius_km: f64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            base_terms: vec!["cafe".to_owned()],
            max_terms: 5,
            max_category_terms: 3,
            max_preference_terms: 2,
            max_area_diagonal_km: 100.0,
            oversized_area_half_width_km: 50.0,
            max_radius_km: 50.0,
            fallback_radius_km: 5.0,
        }
    }
}

/// A planned provider query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Ordered, de-duplicated terms sent to the provider.
    pub terms: Vec<String>,
    /// Terms joined by single spaces.
    pub text: String,
    /// Where to search.
    pub constraint: GeoConstraint,
    /// User-directed keywords boosted when refining: override keywords,
    /// free text and active preference keywords.
    pub refinement_keywords: Vec<String>,
}

/// Turns a search request into a [`QueryPlan`].
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    config: QueryConfig,
    registry: PreferenceRegistry,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(QueryConfig::default(), PreferenceRegistry::builtin().clone())
    }
}

/// Case-insensitive, order-preserving term accumulator.
struct Terms {
    terms: Vec<String>,
    seen: HashSet<String>,
}

impl Terms {
    fn new() -> Self {
        Self {
            terms: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn push(&mut self, term: &str) -> bool {
        let trimmed = term.trim();
        if trimmed.is_empty() || !self.seen.insert(trimmed.to_lowercase()) {
            return false;
        }
        self.terms.push(trimmed.to_owned());
        true
    }

    fn contains(&self, term: &str) -> bool {
        self.seen.contains(&term.trim().to_lowercase())
    }
}

impl QueryBuilder {
    /// Create a builder.
    #[must_use]
    pub const fn new(config: QueryConfig, registry: PreferenceRegistry) -> Self {
        Self { config, registry }
    }

    /// The builder's configuration.
    #[must_use]
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Plan the provider query for `request`.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use kindred_core::{Destination, Place, PreferenceToggles, SearchRequest};
    /// use kindred_search::QueryBuilder;
    ///
    /// let liked = Place::new("r", "Liked", Coord { x: 0.0, y: 0.0 })
    ///     .with_primary_category("coffee_shop")
    ///     .with_categories(["coffee_shop", "point_of_interest"]);
    /// let request = SearchRequest::new(
    ///     "user",
    ///     vec![liked],
    ///     Destination::new("porto", Coord { x: -8.6, y: 41.15 }),
    /// )
    /// .with_toggles(PreferenceToggles::new().with_toggle("outdoor_seating", true));
    ///
    /// let plan = QueryBuilder::default().build(&request);
    /// assert_eq!(plan.text, "cafe coffee shop outdoor seating");
    /// ```
    #[must_use]
    pub fn build(&self, request: &SearchRequest) -> QueryPlan {
        let preference_keywords = self.preference_keywords(request);
        let terms = self.terms(request, &preference_keywords);
        let refinement_keywords = Self::refinement_keywords(request, &preference_keywords);
        QueryPlan {
            text: terms.join(" "),
            terms,
            constraint: self.constraint(&request.destination),
            refinement_keywords,
        }
    }

    fn preference_keywords(&self, request: &SearchRequest) -> Vec<Vec<String>> {
        self.registry
            .active(&request.toggles)
            .map(|(_, definition)| definition.keywords.clone())
            .filter(|keywords| !keywords.is_empty())
            .collect()
    }

    fn terms(&self, request: &SearchRequest, preference_keywords: &[Vec<String>]) -> Vec<String> {
        let mut terms = Terms::new();

        let overrides: Vec<&str> = request
            .override_keywords
            .iter()
            .map(String::as_str)
            .filter(|k| !k.trim().is_empty())
            .collect();
        if overrides.is_empty() {
            for term in &self.config.base_terms {
                terms.push(term);
            }
        } else {
            for term in overrides {
                terms.push(term);
            }
        }

        if let Some(text) = request.free_text() {
            terms.push(text);
        }

        let mut added = 0;
        for label in category_terms(&request.references) {
            if added >= self.config.max_category_terms {
                break;
            }
            if terms.push(&label) {
                added += 1;
            }
        }

        let mut added_preferences = 0;
        for keywords in preference_keywords {
            if added_preferences >= self.config.max_preference_terms {
                break;
            }
            if let Some(first) = keywords.first()
                && !terms.contains(first)
            {
                terms.push(first);
                added_preferences += 1;
            }
        }

        let mut collected = terms.terms;
        collected.truncate(self.config.max_terms);
        collected
    }

    fn refinement_keywords(
        request: &SearchRequest,
        preference_keywords: &[Vec<String>],
    ) -> Vec<String> {
        let mut keywords = Terms::new();
        for keyword in &request.override_keywords {
            keywords.push(keyword);
        }
        if let Some(text) = request.free_text() {
            keywords.push(text);
        }
        for keyword in preference_keywords.iter().flatten() {
            keywords.push(keyword);
        }
        keywords.terms
    }

    /// Choose the geographic constraint for `destination`.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "the circle radius is half the viewport diagonal"
    )]
    pub fn constraint(&self, destination: &Destination) -> GeoConstraint {
        let config = &self.config;
        match (destination.is_area(), destination.viewport) {
            (true, Some(bounds)) => GeoConstraint::Rectangle {
                bounds: self.area_bounds(destination, bounds),
            },
            (_, Some(viewport)) => {
                let radius = (diagonal_km(&viewport) / 2.0).min(config.max_radius_km);
                GeoConstraint::Circle {
                    center: destination.center,
                    radius_km: if radius > 0.0 {
                        radius
                    } else {
                        config.fallback_radius_km
                    },
                }
            }
            (_, None) => GeoConstraint::Circle {
                center: destination.center,
                radius_km: config.fallback_radius_km,
            },
        }
    }

    fn area_bounds(&self, destination: &Destination, bounds: Rect<f64>) -> Rect<f64> {
        if diagonal_km(&bounds) > self.config.max_area_diagonal_km {
            box_around(
                destination.center,
                self.config.oversized_area_half_width_km,
            )
        } else {
            bounds
        }
    }
}

/// Non-generic category labels of `references` as query terms: primaries
/// first in reference order, then the remaining labels.
fn category_terms(references: &[Place]) -> Vec<String> {
    let primaries = references
        .iter()
        .filter_map(|place| place.primary_category.as_deref());
    let others = references
        .iter()
        .flat_map(|place| place.categories.iter().map(String::as_str));
    primaries
        .chain(others)
        .filter(|label| !is_generic_category(label))
        .map(|label| label.replace('_', " "))
        .collect()
}
