//! Classification enums for buyer leads.
//!
//! Every enum here is a closed set of choices with a stable wire name (the
//! variant name, e.g. `ThreeMonths`). The same name is used in JSON, in CSV
//! cells, in HTML form values, and as the `PostgreSQL` enum label.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of an enum's wire names.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ChoiceError {
    /// Human name of the enum (e.g. "city").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Every accepted wire name, in declaration order.
    pub expected: &'static [&'static str],
}

/// Macro to define a closed choice enum.
///
/// Generates the enum plus:
/// - `ALL` (every variant) and `NAMES` (every wire name), in declaration order
/// - `as_str()` returning the wire name and `label()` returning display text
/// - `Display` (wire name) and `FromStr` (exact, case-sensitive match)
/// - `sqlx::Type` mapping to the given `PostgreSQL` enum type (with `postgres` feature)
macro_rules! define_choice {
    (
        $(#[$meta:meta])*
        $name:ident, kind = $kind:literal, pg = $pg:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "postgres", derive(sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(type_name = $pg))]
        pub enum $name {
            $(
                #[doc = $label]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Every wire name, in declaration order.
            pub const NAMES: &'static [&'static str] = &[$(stringify!($variant)),+];

            /// The wire name of this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }

            /// Display text for pages.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ChoiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok(Self::$variant),)+
                    _ => Err(ChoiceError {
                        kind: $kind,
                        value: s.to_owned(),
                        expected: Self::NAMES,
                    }),
                }
            }
        }
    };
}

define_choice! {
    /// City the buyer is looking in.
    City, kind = "city", pg = "city" {
        Chandigarh => "Chandigarh",
        Mohali => "Mohali",
        Zirakpur => "Zirakpur",
        Panchkula => "Panchkula",
        Other => "Other",
    }
}

define_choice! {
    /// Kind of property wanted.
    PropertyType, kind = "property type", pg = "property_type" {
        Apartment => "Apartment",
        Villa => "Villa",
        Plot => "Plot",
        Office => "Office",
        Retail => "Retail",
    }
}

define_choice! {
    /// Bedroom-count classification for residential property.
    Bhk, kind = "bhk", pg = "bhk" {
        One => "1 BHK",
        Two => "2 BHK",
        Three => "3 BHK",
        Four => "4 BHK",
        Studio => "Studio",
    }
}

define_choice! {
    /// Whether the buyer wants to buy or rent.
    Purpose, kind = "purpose", pg = "purpose" {
        Buy => "Buy",
        Rent => "Rent",
    }
}

define_choice! {
    /// How soon the buyer expects to close.
    Timeline, kind = "timeline", pg = "timeline" {
        ThreeMonths => "0-3 months",
        SixMonths => "3-6 months",
        MoreThanSixMonths => "More than 6 months",
        Exploring => "Exploring",
    }
}

define_choice! {
    /// Where the lead came from.
    LeadSource, kind = "source", pg = "lead_source" {
        Website => "Website",
        Referral => "Referral",
        WalkIn => "Walk-in",
        Call => "Call",
        Other => "Other",
    }
}

define_choice! {
    /// Pipeline stage of a lead.
    BuyerStatus, kind = "status", pg = "buyer_status" {
        New => "New",
        Qualified => "Qualified",
        Contacted => "Contacted",
        Visited => "Visited",
        Negotiation => "Negotiation",
        Converted => "Converted",
        Dropped => "Dropped",
    }
}

impl PropertyType {
    /// Residential types must carry a bedroom count.
    #[must_use]
    pub const fn is_residential(self) -> bool {
        matches!(self, Self::Apartment | Self::Villa)
    }
}

impl Default for BuyerStatus {
    fn default() -> Self {
        Self::New
    }
}
