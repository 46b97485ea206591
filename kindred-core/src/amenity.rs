//! Optional amenity fields attached to places.
//!
//! Providers return amenities incrementally: a search hit carries a few
//! fields and a follow-up details call fills in the rest. Every field is
//! therefore optional, and [`Amenities::merge`] applies a supplementary
//! payload without erasing values the base record already had.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Structured amenity payload such as accessibility or parking options.
pub type StructuredAmenity = BTreeMap<String, bool>;

/// Amenity attributes of a place. `None` means "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Amenities {
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

impl Amenities {
    /// Overlay `supplementary` onto `self`.
    ///
    /// A field is replaced only when the supplementary payload carries a
    /// value for it.
    ///
    /// # Examples
    /// ```
    /// use kindred_core::Amenities;
    ///
    /// let mut base = Amenities { takeout: Some(true), ..Amenities::default() };
    /// base.merge(Amenities { allows_dogs: Some(true), ..Amenities::default() });
    /// assert_eq!(base.takeout, Some(true));
    /// assert_eq!(base.allows_dogs, Some(true));
    /// ```
    pub fn merge(&mut self, supplementary: Self) {
        let Self {
            outdoor_seating,
            takeout,
            delivery,
            dine_in,
            reservable,
            good_for_groups,
            good_for_children,
            live_music,
            serves_breakfast,
            serves_brunch,
            serves_lunch,
            serves_dinner,
            serves_beer,
            serves_wine,
            serves_coffee,
            serves_dessert,
            serves_vegetarian_food,
            allows_dogs,
            restroom,
            good_for_watching_sports,
            accessibility_options,
            parking_options,
        } = supplementary;

        overlay(&mut self.outdoor_seating, outdoor_seating);
        overlay(&mut self.takeout, takeout);
        overlay(&mut self.delivery, delivery);
        overlay(&mut self.dine_in, dine_in);
        overlay(&mut self.reservable, reservable);
        overlay(&mut self.good_for_groups, good_for_groups);
        overlay(&mut self.good_for_children, good_for_children);
        overlay(&mut self.live_music, live_music);
        overlay(&mut self.serves_breakfast, serves_breakfast);
        overlay(&mut self.serves_brunch, serves_brunch);
        overlay(&mut self.serves_lunch, serves_lunch);
        overlay(&mut self.serves_dinner, serves_dinner);
        overlay(&mut self.serves_beer, serves_beer);
        overlay(&mut self.serves_wine, serves_wine);
        overlay(&mut self.serves_coffee, serves_coffee);
        overlay(&mut self.serves_dessert, serves_dessert);
        overlay(&mut self.serves_vegetarian_food, serves_vegetarian_food);
        overlay(&mut self.allows_dogs, allows_dogs);
        overlay(&mut self.restroom, restroom);
        overlay(&mut self.good_for_watching_sports, good_for_watching_sports);
        overlay(&mut self.accessibility_options, accessibility_options);
        overlay(&mut self.parking_options, parking_options);
    }

    /// Report whether `field` holds a truthy value.
    pub fn is_set(&self, field: AmenityField) -> bool {
        field.is_truthy(self)
    }
}

fn overlay<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

/// Names a single amenity so preferences can bind to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AmenityField {
    OutdoorSeating,
    Takeout,
    Delivery,
    DineIn,
    Reservable,
    GoodForGroups,
    GoodForChildren,
    LiveMusic,
    ServesBreakfast,
    ServesBrunch,
    ServesLunch,
    ServesDinner,
    ServesBeer,
    ServesWine,
    ServesCoffee,
    ServesDessert,
    ServesVegetarianFood,
    AllowsDogs,
    Restroom,
    GoodForWatchingSports,
    AccessibilityOptions,
    ParkingOptions,
}

impl AmenityField {
    /// Every field, in declaration order.
    pub const ALL: [Self; 22] = [
        Self::OutdoorSeating,
        Self::Takeout,
        Self::Delivery,
        Self::DineIn,
        Self::Reservable,
        Self::GoodForGroups,
        Self::GoodForChildren,
        Self::LiveMusic,
        Self::ServesBreakfast,
        Self::ServesBrunch,
        Self::ServesLunch,
        Self::ServesDinner,
        Self::ServesBeer,
        Self::ServesWine,
        Self::ServesCoffee,
        Self::ServesDessert,
        Self::ServesVegetarianFood,
        Self::AllowsDogs,
        Self::Restroom,
        Self::GoodForWatchingSports,
        Self::AccessibilityOptions,
        Self::ParkingOptions,
    ];

    /// Return the field name as a `snake_case` string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OutdoorSeating => "outdoor_seating",
            Self::Takeout => "takeout",
            Self::Delivery => "delivery",
            Self::DineIn => "dine_in",
            Self::Reservable => "reservable",
            Self::GoodForGroups => "good_for_groups",
            Self::GoodForChildren => "good_for_children",
            Self::LiveMusic => "live_music",
            Self::ServesBreakfast => "serves_breakfast",
            Self::ServesBrunch => "serves_brunch",
            Self::ServesLunch => "serves_lunch",
            Self::ServesDinner => "serves_dinner",
            Self::ServesBeer => "serves_beer",
            Self::ServesWine => "serves_wine",
            Self::ServesCoffee => "serves_coffee",
            Self::ServesDessert => "serves_dessert",
            Self::ServesVegetarianFood => "serves_vegetarian_food",
            Self::AllowsDogs => "allows_dogs",
            Self::Restroom => "restroom",
            Self::GoodForWatchingSports => "good_for_watching_sports",
            Self::AccessibilityOptions => "accessibility_options",
            Self::ParkingOptions => "parking_options",
        }
    }

    /// A boolean field is truthy when `Some(true)`; a structured field is
    /// truthy when present and non-empty.
    pub fn is_truthy(self, amenities: &Amenities) -> bool {
        let flag = |value: Option<bool>| value.unwrap_or(false);
        let structured =
            |value: Option<&StructuredAmenity>| value.is_some_and(|map| !map.is_empty());
        match self {
            Self::OutdoorSeating => flag(amenities.outdoor_seating),
            Self::Takeout => flag(amenities.takeout),
            Self::Delivery => flag(amenities.delivery),
            Self::DineIn => flag(amenities.dine_in),
            Self::Reservable => flag(amenities.reservable),
            Self::GoodForGroups => flag(amenities.good_for_groups),
            Self::GoodForChildren => flag(amenities.good_for_children),
            Self::LiveMusic => flag(amenities.live_music),
            Self::ServesBreakfast => flag(amenities.serves_breakfast),
            Self::ServesBrunch => flag(amenities.serves_brunch),
            Self::ServesLunch => flag(amenities.serves_lunch),
            Self::ServesDinner => flag(amenities.serves_dinner),
            Self::ServesBeer => flag(amenities.serves_beer),
            Self::ServesWine => flag(amenities.serves_wine),
            Self::ServesCoffee => flag(amenities.serves_coffee),
            Self::ServesDessert => flag(amenities.serves_dessert),
            Self::ServesVegetarianFood => flag(amenities.serves_vegetarian_food),
            Self::AllowsDogs => flag(amenities.allows_dogs),
            Self::Restroom => flag(amenities.restroom),
            Self::GoodForWatchingSports => flag(amenities.good_for_watching_sports),
            Self::AccessibilityOptions => structured(amenities.accessibility_options.as_ref()),
            Self::ParkingOptions => structured(amenities.parking_options.as_ref()),
        }
    }
}

impl fmt::Display for AmenityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown amenity name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown amenity field '{0}'")]
pub struct UnknownAmenityField(pub String);

impl FromStr for AmenityField {
    type Err = UnknownAmenityField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == wanted)
            .ok_or_else(|| UnknownAmenityField(s.to_owned()))
    }
}
