use geo::{Coord, Rect};

/// Place kinds that identify an administrative area rather than a single
/// establishment or address.
pub const AREA_KINDS: &[&str] = &[
    "locality",
    "sublocality",
    "sublocality_level_1",
    "neighborhood",
    "administrative_area_level_1",
    "administrative_area_level_2",
    "administrative_area_level_3",
    "postal_code",
    "country",
    "colloquial_area",
];

/// The target area of a search.
///
/// `key` is the stable destination string used to scope seen-candidate
/// suppression and cached result sets. `area_id`, when set, is the
/// provider's identifier for the area and enables reverse-geocode
/// verification of candidates.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use kindred_core::Destination;
///
/// let city = Destination::new("lisbon", Coord { x: -9.14, y: 38.72 })
///     .with_kinds(["locality", "political"]);
/// assert!(city.is_area());
///
/// let venue = Destination::new("time-out-market", Coord { x: -9.146, y: 38.707 })
///     .with_kinds(["establishment"]);
/// assert!(!venue.is_area());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Destination {
    /// Stable destination key.
    pub key: String,
    /// Centre of the destination.
    pub center: Coord<f64>,
    /// Viewport or administrative bounds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub viewport: Option<Rect<f64>>,
    /// Provider place kinds describing the destination.
    #[cfg_attr(feature = "serde", serde(default))]
    pub kinds: Vec<String>,
    /// Provider identifier of the area, used for verification.
    #[cfg_attr(feature = "serde", serde(default))]
    pub area_id: Option<String>,
}

impl Destination {
    /// Construct a destination with a key and centre only.
    pub fn new(key: impl Into<String>, center: Coord<f64>) -> Self {
        Self {
            key: key.into(),
            center,
            viewport: None,
            kinds: Vec::new(),
            area_id: None,
        }
    }

    /// Set the viewport.
    #[must_use]
    pub fn with_viewport(mut self, viewport: Rect<f64>) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Add provider kinds.
    #[must_use]
    pub fn with_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kinds.extend(kinds.into_iter().map(Into::into));
        self
    }

    /// Set the provider area identifier.
    #[must_use]
    pub fn with_area_id(mut self, area_id: impl Into<String>) -> Self {
        self.area_id = Some(area_id.into());
        self
    }

    /// Whether any kind is in [`AREA_KINDS`].
    pub fn is_area(&self) -> bool {
        self.kinds
            .iter()
            .any(|kind| AREA_KINDS.contains(&kind.as_str()))
    }
}
