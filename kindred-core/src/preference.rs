//! Preference toggles and the registry that gives them meaning.
//!
//! Toggles are an open-ended map from preference id to on/off. The engine
//! never matches on ids directly: it consults a [`PreferenceRegistry`] for a
//! display label, an optional bound [`AmenityField`] (used when scoring) and
//! optional query keywords (used when building the provider query). Adding a
//! preference means adding a registry entry.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::AmenityField;

/// User-selected preference toggles keyed by preference id.
///
/// # Examples
/// ```
/// use kindred_core::PreferenceToggles;
///
/// let toggles = PreferenceToggles::new()
///     .with_toggle("dog_friendly", true)
///     .with_toggle("quiet", false);
/// assert!(toggles.is_enabled("dog_friendly"));
/// assert_eq!(toggles.enabled().collect::<Vec<_>>(), vec!["dog_friendly"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PreferenceToggles {
    toggles: BTreeMap<String, bool>,
}

impl PreferenceToggles {
    /// Construct an empty set of toggles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a toggle while returning `self` for chaining.
    #[must_use]
    pub fn with_toggle(mut self, id: impl Into<String>, enabled: bool) -> Self {
        self.set(id, enabled);
        self
    }

    /// Insert or update a toggle.
    pub fn set(&mut self, id: impl Into<String>, enabled: bool) {
        self.toggles.insert(id.into(), enabled);
    }

    /// Whether `id` is toggled on.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.toggles.get(id).copied().unwrap_or(false)
    }

    /// Ids toggled on, in ascending order.
    pub fn enabled(&self) -> impl Iterator<Item = &str> + '_ {
        self.toggles
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(id, _)| id.as_str())
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for PreferenceToggles {
    fn from_iter<T: IntoIterator<Item = (K, bool)>>(iter: T) -> Self {
        Self {
            toggles: iter.into_iter().map(|(id, on)| (id.into(), on)).collect(),
        }
    }
}

/// What a preference id means to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceDefinition {
    /// Human-readable label, reported as a matched reason.
    pub label: String,
    /// Amenity that earns a bonus when this preference is on.
    pub field: Option<AmenityField>,
    /// Terms added to the provider query when this preference is on.
    pub keywords: Vec<String>,
}

impl PreferenceDefinition {
    /// Define a preference with a label only.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            field: None,
            keywords: Vec::new(),
        }
    }

    /// Bind the preference to an amenity field.
    #[must_use]
    pub fn with_field(mut self, field: AmenityField) -> Self {
        self.field = Some(field);
        self
    }

    /// Add query keywords.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }
}

/// Lookup table from preference id to [`PreferenceDefinition`].
///
/// # Examples
/// ```
/// use kindred_core::{AmenityField, PreferenceDefinition, PreferenceRegistry};
///
/// let registry = PreferenceRegistry::new().with_preference(
///     "sports",
///     PreferenceDefinition::new("Shows the game").with_field(AmenityField::GoodForWatchingSports),
/// );
/// assert_eq!(
///     registry.get("sports").and_then(|p| p.field),
///     Some(AmenityField::GoodForWatchingSports)
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreferenceRegistry {
    entries: BTreeMap<String, PreferenceDefinition>,
}

static BUILTIN: LazyLock<PreferenceRegistry> = LazyLock::new(|| {
    use AmenityField as F;
    let bound = |label: &str, field: F, keywords: &[&str]| {
        PreferenceDefinition::new(label)
            .with_field(field)
            .with_keywords(keywords.iter().copied())
    };
    let unbound = |label: &str, keywords: &[&str]| {
        PreferenceDefinition::new(label).with_keywords(keywords.iter().copied())
    };
    PreferenceRegistry::new()
        .with_preference("dog_friendly", bound("Dog friendly", F::AllowsDogs, &["dog friendly"]))
        .with_preference(
            "outdoor_seating",
            bound("Outdoor seating", F::OutdoorSeating, &["outdoor seating", "patio"]),
        )
        .with_preference("live_music", bound("Live music", F::LiveMusic, &["live music"]))
        .with_preference("good_for_groups", bound("Good for groups", F::GoodForGroups, &[]))
        .with_preference(
            "kid_friendly",
            bound("Kid friendly", F::GoodForChildren, &["kid friendly"]),
        )
        .with_preference(
            "vegetarian",
            bound("Vegetarian options", F::ServesVegetarianFood, &["vegetarian"]),
        )
        .with_preference("brunch", bound("Serves brunch", F::ServesBrunch, &["brunch"]))
        .with_preference("takeout", bound("Takeout", F::Takeout, &[]))
        .with_preference("reservable", bound("Takes reservations", F::Reservable, &[]))
        .with_preference(
            "wheelchair_accessible",
            bound("Wheelchair accessible", F::AccessibilityOptions, &[]),
        )
        .with_preference("parking", bound("Parking available", F::ParkingOptions, &[]))
        .with_preference("laptop_friendly", unbound("Laptop friendly", &["wifi", "laptop"]))
        .with_preference("quiet", unbound("Quiet", &["quiet"]))
        .with_preference("late_night", unbound("Open late", &["open late"]))
});

impl PreferenceRegistry {
    /// Construct an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shipped with the engine.
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Register or replace a preference.
    pub fn insert(&mut self, id: impl Into<String>, definition: PreferenceDefinition) {
        self.entries.insert(id.into(), definition);
    }

    /// Register a preference while returning `self` for chaining.
    #[must_use]
    pub fn with_preference(
        mut self,
        id: impl Into<String>,
        definition: PreferenceDefinition,
    ) -> Self {
        self.insert(id, definition);
        self
    }

    /// Look up a preference.
    pub fn get(&self, id: &str) -> Option<&PreferenceDefinition> {
        self.entries.get(id)
    }

    /// Toggled-on preferences that are registered, in ascending id order.
    ///
    /// Unknown ids are skipped.
    pub fn active<'a>(
        &'a self,
        toggles: &'a PreferenceToggles,
    ) -> impl Iterator<Item = (&'a str, &'a PreferenceDefinition)> + 'a {
        toggles
            .enabled()
            .filter_map(|id| self.get(id).map(|definition| (id, definition)))
    }
}
