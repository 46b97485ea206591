//! Response bodies of the Places-style API and their domain conversions.

use std::collections::BTreeSet;

use geo::Coord;
use kindred_core::{
    Amenities, AreaRef, OpeningHours, PhotoRef, Place, PlaceDetails, SearchPage,
    StructuredAmenity,
};
use serde::{Deserialize, Serialize};

/// Field mask for text search. Amenities arrive later via details.
pub const SEARCH_FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,\
places.location,places.types,places.primaryType,places.rating,places.userRatingCount,\
places.priceLevel,places.photos,places.regularOpeningHours,nextPageToken";

/// Field mask for the details call.
pub const DETAILS_FIELD_MASK: &str = "editorialSummary,regularOpeningHours,photos,\
outdoorSeating,takeout,delivery,dineIn,reservable,goodForGroups,goodForChildren,liveMusic,\
servesBreakfast,servesBrunch,servesLunch,servesDinner,servesBeer,servesWine,servesCoffee,\
servesDessert,servesVegetarianFood,allowsDogs,restroom,goodForWatchingSports,\
accessibilityOptions,parkingOptions";

/// `POST places:searchText` request body.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchTextRequest {
    pub text_query: String,
    pub page_size: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_bias: Option<LocationArea>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_restriction: Option<LocationArea>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum LocationArea {
    Circle { center: LatLng, radius: f64 },
    Rectangle { low: LatLng, high: LatLng },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coord<f64>> for LatLng {
    fn from(coord: Coord<f64>) -> Self {
        Self {
            latitude: coord.y,
            longitude: coord.x,
        }
    }
}

impl From<LatLng> for Coord<f64> {
    fn from(point: LatLng) -> Self {
        Self {
            x: point.longitude,
            y: point.latitude,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchTextResponse {
    pub places: Vec<WirePlace>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireOpeningHours {
    pub open_now: Option<bool>,
    pub weekday_descriptions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WirePhoto {
    pub name: String,
    pub width_px: Option<u32>,
    pub height_px: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireAmenities {
    pub outdoor_seating: Option<bool>,
    pub takeout: Option<bool>,
    pub delivery: Option<bool>,
    pub dine_in: Option<bool>,
    pub reservable: Option<bool>,
    pub good_for_groups: Option<bool>,
    pub good_for_children: Option<bool>,
    pub live_music: Option<bool>,
    pub serves_breakfast: Option<bool>,
    pub serves_brunch: Option<bool>,
    pub serves_lunch: Option<bool>,
    pub serves_dinner: Option<bool>,
    pub serves_beer: Option<bool>,
    pub serves_wine: Option<bool>,
    pub serves_coffee: Option<bool>,
    pub serves_dessert: Option<bool>,
    pub serves_vegetarian_food: Option<bool>,
    pub allows_dogs: Option<bool>,
    pub restroom: Option<bool>,
    pub good_for_watching_sports: Option<bool>,
    pub accessibility_options: Option<StructuredAmenity>,
    pub parking_options: Option<StructuredAmenity>,
}

impl From<WireAmenities> for Amenities {
    fn from(wire: WireAmenities) -> Self {
        Self {
            outdoor_seating: wire.outdoor_seating,
            takeout: wire.takeout,
            delivery: wire.delivery,
            dine_in: wire.dine_in,
            reservable: wire.reservable,
            good_for_groups: wire.good_for_groups,
            good_for_children: wire.good_for_children,
            live_music: wire.live_music,
            serves_breakfast: wire.serves_breakfast,
            serves_brunch: wire.serves_brunch,
            serves_lunch: wire.serves_lunch,
            serves_dinner: wire.serves_dinner,
            serves_beer: wire.serves_beer,
            serves_wine: wire.serves_wine,
            serves_coffee: wire.serves_coffee,
            serves_dessert: wire.serves_dessert,
            serves_vegetarian_food: wire.serves_vegetarian_food,
            allows_dogs: wire.allows_dogs,
            restroom: wire.restroom,
            good_for_watching_sports: wire.good_for_watching_sports,
            accessibility_options: wire.accessibility_options,
            parking_options: wire.parking_options,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WirePlace {
    pub id: String,
    pub display_name: Option<LocalizedText>,
    pub formatted_address: Option<String>,
    pub location: Option<LatLng>,
    pub types: Vec<String>,
    pub primary_type: Option<String>,
    pub rating: Option<f32>,
    pub user_rating_count: Option<u32>,
    pub price_level: Option<String>,
    pub regular_opening_hours: Option<WireOpeningHours>,
    pub photos: Vec<WirePhoto>,
    pub editorial_summary: Option<LocalizedText>,
    #[serde(flatten)]
    pub amenities: WireAmenities,
}

/// Map the API's enumerated price level onto 0..=4.
pub fn price_level(raw: &str) -> Option<u8> {
    match raw {
        "PRICE_LEVEL_FREE" => Some(0),
        "PRICE_LEVEL_INEXPENSIVE" => Some(1),
        "PRICE_LEVEL_MODERATE" => Some(2),
        "PRICE_LEVEL_EXPENSIVE" => Some(3),
        "PRICE_LEVEL_VERY_EXPENSIVE" => Some(4),
        _ => None,
    }
}

fn opening_hours(wire: WireOpeningHours) -> OpeningHours {
    OpeningHours {
        open_now: wire.open_now,
        weekday_descriptions: wire.weekday_descriptions,
    }
}

fn photo(wire: WirePhoto) -> PhotoRef {
    PhotoRef {
        name: wire.name,
        width_px: wire.width_px,
        height_px: wire.height_px,
    }
}

fn non_empty(text: Option<LocalizedText>) -> Option<String> {
    text.map(|t| t.text).filter(|t| !t.trim().is_empty())
}

impl WirePlace {
    /// Convert to a [`Place`]. Returns `None` for results without a location.
    pub fn into_place(self) -> Option<Place> {
        let location = Coord::from(self.location?);
        let name = self.display_name.map(|n| n.text).unwrap_or_default();
        Some(Place {
            id: self.id,
            name,
            address: self.formatted_address,
            location,
            categories: self.types.into_iter().collect::<BTreeSet<_>>(),
            primary_category: self.primary_type,
            rating: self.rating,
            review_count: self.user_rating_count.unwrap_or_default(),
            price_level: self.price_level.as_deref().and_then(price_level),
            opening_hours: self.regular_opening_hours.map(opening_hours),
            photos: self.photos.into_iter().map(photo).collect(),
            editorial_summary: non_empty(self.editorial_summary),
            amenities: self.amenities.into(),
        })
    }

    /// Convert a details response to [`PlaceDetails`].
    pub fn into_details(self) -> PlaceDetails {
        PlaceDetails {
            amenities: self.amenities.into(),
            editorial_summary: non_empty(self.editorial_summary),
            opening_hours: self.regular_opening_hours.map(opening_hours),
            photos: if self.photos.is_empty() {
                None
            } else {
                Some(self.photos.into_iter().map(photo).collect())
            },
        }
    }
}

impl SearchTextResponse {
    pub fn into_page(self) -> SearchPage {
        let total = self.places.len();
        let places: Vec<Place> = self
            .places
            .into_iter()
            .filter_map(WirePlace::into_place)
            .collect();
        if places.len() < total {
            log::debug!("skipped {} results without a location", total - places.len());
        }
        SearchPage {
            places,
            next_page_token: self.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

/// Reverse-geocoding response: `{"status", "results": [...]}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeocodeResponse {
    pub status: String,
    pub results: Vec<GeocodeResult>,
    pub error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeocodeResult {
    pub place_id: String,
    pub types: Vec<String>,
    pub formatted_address: Option<String>,
}

impl From<GeocodeResult> for AreaRef {
    fn from(result: GeocodeResult) -> Self {
        Self {
            id: result.place_id,
            kind: result.types.into_iter().next(),
            name: result.formatted_address,
        }
    }
}
