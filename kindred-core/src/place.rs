use std::collections::BTreeSet;

use geo::Coord;

use crate::Amenities;

/// A place returned by the search provider.
///
/// The same shape serves both as a reference place (one the user already
/// likes) and as a candidate being ranked. Coordinates are WGS84 with
/// `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use kindred_core::Place;
///
/// let place = Place::new("p1", "Blue Bottle", Coord { x: -122.4, y: 37.78 })
///     .with_primary_category("coffee_shop")
///     .with_categories(["coffee_shop", "cafe"])
///     .with_rating(4.5)
///     .with_price_level(2);
///
/// assert_eq!(place.primary_category.as_deref(), Some("coffee_shop"));
/// assert!(place.categories.contains("cafe"));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Place {
    /// Provider identifier, stable and unique within the provider.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Formatted address, when known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub address: Option<String>,
    /// Geospatial position.
    pub location: Coord<f64>,
    /// Unordered category labels.
    #[cfg_attr(feature = "serde", serde(default))]
    pub categories: BTreeSet<String>,
    /// The provider's single best classification. It may or may not also
    /// appear in `categories`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub primary_category: Option<String>,
    /// Average rating in `0.0..=5.0`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rating: Option<f32>,
    /// Number of user reviews.
    #[cfg_attr(feature = "serde", serde(default))]
    pub review_count: u32,
    /// Ordinal price tier, typically `0..=4`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub price_level: Option<u8>,
    /// Opening hours, when known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub opening_hours: Option<OpeningHours>,
    /// Photo references.
    #[cfg_attr(feature = "serde", serde(default))]
    pub photos: Vec<PhotoRef>,
    /// Free-text editorial summary.
    #[cfg_attr(feature = "serde", serde(default))]
    pub editorial_summary: Option<String>,
    /// Amenity attributes.
    #[cfg_attr(feature = "serde", serde(default))]
    pub amenities: Amenities,
}

/// Opening-hours descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpeningHours {
    /// Whether the place was open when the provider answered.
    #[cfg_attr(feature = "serde", serde(default))]
    pub open_now: Option<bool>,
    /// Human-readable hours, one entry per weekday.
    #[cfg_attr(feature = "serde", serde(default))]
    pub weekday_descriptions: Vec<String>,
}

/// Reference to a provider-hosted photo.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhotoRef {
    /// Provider resource name used to fetch the photo.
    pub name: String,
    /// Original width in pixels.
    #[cfg_attr(feature = "serde", serde(default))]
    pub width_px: Option<u32>,
    /// Original height in pixels.
    #[cfg_attr(feature = "serde", serde(default))]
    pub height_px: Option<u32>,
}

impl PhotoRef {
    /// Reference a photo by provider resource name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width_px: None,
            height_px: None,
        }
    }
}

/// Supplementary fields returned by the provider's details call.
///
/// Every field is optional; absent fields leave the base record untouched
/// when merged via [`Place::merge_details`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlaceDetails {
    /// Amenity values to overlay.
    pub amenities: Amenities,
    /// Editorial summary, if the details call supplied one.
    pub editorial_summary: Option<String>,
    /// Opening hours, if the details call supplied them.
    pub opening_hours: Option<OpeningHours>,
    /// Photos, if the details call supplied any.
    pub photos: Option<Vec<PhotoRef>>,
}

impl Place {
    /// Construct a place with the given identity and no optional data.
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: Coord<f64>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: None,
            location,
            categories: BTreeSet::new(),
            primary_category: None,
            rating: None,
            review_count: 0,
            price_level: None,
            opening_hours: None,
            photos: Vec::new(),
            editorial_summary: None,
            amenities: Amenities::default(),
        }
    }

    /// Add category labels while returning `self` for chaining.
    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .extend(categories.into_iter().map(Into::into));
        self
    }

    /// Set the primary category.
    #[must_use]
    pub fn with_primary_category(mut self, category: impl Into<String>) -> Self {
        self.primary_category = Some(category.into());
        self
    }

    /// Set the rating.
    #[must_use]
    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Set the review count.
    #[must_use]
    pub fn with_review_count(mut self, review_count: u32) -> Self {
        self.review_count = review_count;
        self
    }

    /// Set the price tier.
    #[must_use]
    pub fn with_price_level(mut self, price_level: u8) -> Self {
        self.price_level = Some(price_level);
        self
    }

    /// Set the address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Append a photo reference.
    #[must_use]
    pub fn with_photo(mut self, photo: PhotoRef) -> Self {
        self.photos.push(photo);
        self
    }

    /// Replace the amenity set.
    #[must_use]
    pub fn with_amenities(mut self, amenities: Amenities) -> Self {
        self.amenities = amenities;
        self
    }

    /// Whether the provider supplied a usable identifier.
    pub fn has_identifier(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Overlay a supplementary details payload.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use kindred_core::{Amenities, Place, PlaceDetails};
    ///
    /// let mut place = Place::new("p1", "Cafe", Coord { x: 0.0, y: 0.0 });
    /// place.merge_details(PlaceDetails {
    ///     amenities: Amenities { live_music: Some(true), ..Amenities::default() },
    ///     ..PlaceDetails::default()
    /// });
    /// assert_eq!(place.amenities.live_music, Some(true));
    /// ```
    pub fn merge_details(&mut self, details: PlaceDetails) {
        let PlaceDetails {
            amenities,
            editorial_summary,
            opening_hours,
            photos,
        } = details;
        self.amenities.merge(amenities);
        if editorial_summary.is_some() {
            self.editorial_summary = editorial_summary;
        }
        if opening_hours.is_some() {
            self.opening_hours = opening_hours;
        }
        if let Some(photos) = photos.filter(|photos| !photos.is_empty()) {
            self.photos = photos;
        }
    }
}
