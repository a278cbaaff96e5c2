use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Four-colour combination, each a `#rrggbb` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
pub struct Palette {
    pub primary: String,
    pub secondary: String,
    pub background: String,
    pub text: String,
}

impl Palette {
    pub fn new(primary: &str, secondary: &str, background: &str, text: &str) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            background: background.to_string(),
            text: text.to_string(),
        }
    }
}

/// Heading/body font families as named on Google Fonts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
pub struct FontPair {
    pub heading: String,
    pub body: String,
}

impl FontPair {
    pub fn new(heading: &str, body: &str) -> Self {
        Self {
            heading: heading.to_string(),
            body: body.to_string(),
        }
    }
}

/// Layout tightness, controls container padding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Density {
    Cozy,
    Balanced,
    Airy,
}

impl Density {
    pub fn padding(self) -> &'static str {
        match self {
            Density::Airy => "3rem",
            Density::Cozy => "1rem",
            Density::Balanced => "2rem",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
pub struct Layout {
    pub density: Density,
    pub max_width: String,
    pub border_radius: String,
    pub card_shadow: String,
}

/// Everything drawn from the catalogs for a single seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct DesignParams {
    pub palette: Palette,
    pub fonts: FontPair,
    pub layout: Layout,
}
