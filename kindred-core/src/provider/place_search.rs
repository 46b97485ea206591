use async_trait::async_trait;
use geo::{Coord, Rect};

use crate::{Place, PlaceDetails};

use super::error::ProviderError;

/// Geographic restriction attached to a provider query.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case", tag = "kind"))]
pub enum GeoConstraint {
    /// Bias results to a circle.
    Circle {
        /// Circle centre.
        center: Coord<f64>,
        /// Radius in kilometres.
        radius_km: f64,
    },
    /// Restrict results to a rectangle.
    Rectangle {
        /// South-west and north-east corners.
        bounds: Rect<f64>,
    },
}

/// A single provider text search.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderQuery {
    /// Space-separated query terms.
    pub text: String,
    /// Where to search.
    pub constraint: GeoConstraint,
    /// Maximum results per page.
    pub page_size: u8,
    /// Token returned by a previous page.
    pub continuation: Option<String>,
}

/// One page of provider search results in provider order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchPage {
    /// Places in provider order. Records may lack an id or rating.
    pub places: Vec<Place>,
    /// Token for the next page, when one exists.
    pub next_page_token: Option<String>,
}

/// One level of a reverse-geocoded place hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaRef {
    /// Provider identifier of the area.
    pub id: String,
    /// Provider kind such as `locality` or `neighborhood`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: Option<String>,
    /// Display name of the area.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
}

impl AreaRef {
    /// Reference an area by identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: None,
            name: None,
        }
    }
}

/// Text/geo place search with details and reverse-geocoding.
///
/// Implementations must be `Send + Sync` so a single provider can serve
/// concurrent per-candidate requests.
#[async_trait]
pub trait PlaceSearchProvider: Send + Sync {
    /// Run a text search constrained to an area.
    async fn search(&self, query: &ProviderQuery) -> Result<SearchPage, ProviderError>;

    /// Fetch supplementary fields for one place.
    async fn fetch_details(&self, place_id: &str) -> Result<PlaceDetails, ProviderError>;

    /// Resolve a coordinate to the hierarchy of areas containing it.
    async fn reverse_geocode(&self, location: Coord<f64>) -> Result<Vec<AreaRef>, ProviderError>;
}

#[async_trait]
impl<T> PlaceSearchProvider for std::sync::Arc<T>
where
    T: PlaceSearchProvider + ?Sized,
{
    async fn search(&self, query: &ProviderQuery) -> Result<SearchPage, ProviderError> {
        (**self).search(query).await
    }

    async fn fetch_details(&self, place_id: &str) -> Result<PlaceDetails, ProviderError> {
        (**self).fetch_details(place_id).await
    }

    async fn reverse_geocode(&self, location: Coord<f64>) -> Result<Vec<AreaRef>, ProviderError> {
        (**self).reverse_geocode(location).await
    }
}
