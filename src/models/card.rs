use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// RawCardRef: a card reference as it appears in a tournament export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawCardRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub set: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub number: String,
    #[serde(default = "one")]
    pub count: u32,
}

fn one() -> u32 {
    1
}

impl RawCardRef {
    pub fn new(name: &str, set: &str, number: &str, count: u32) -> Self {
        Self {
            name: name.to_string(),
            set: set.to_string(),
            number: number.to_string(),
            count,
        }
    }

    /// The (name, set, number) triple the canonicalizer memoizes on.
    pub fn lookup_key(&self) -> (String, String, String) {
        (self.name.clone(), self.set.clone(), self.number.clone())
    }
}

/// Accept collector numbers exported either as JSON strings or integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

// ---------------------------------------------------------------------------
// CardType: normalized card type from the catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardType {
    Pokemon,
    Item,
    Tool,
    Supporter,
    Stadium,
    Energy,
    Unknown,
}

impl CardType {
    /// Normalize a raw catalog type string, falling back to the image-name
    /// prefix (`cPK` Pokémon, `cTR` trainer item) when the type is missing.
    pub fn from_raw(raw: Option<&str>, image: Option<&str>) -> Self {
        let parsed = raw.map(|t| t.trim().to_lowercase()).map(|t| {
            if t.contains("tool") {
                CardType::Tool
            } else if t.contains("pokemon") || t.contains("pokémon") {
                CardType::Pokemon
            } else if t.contains("item") || t.contains("goods") {
                CardType::Item
            } else if t.contains("support") {
                CardType::Supporter
            } else if t.contains("stadium") {
                CardType::Stadium
            } else if t.contains("energy") {
                CardType::Energy
            } else {
                CardType::Unknown
            }
        });

        match parsed {
            Some(t) if t != CardType::Unknown => t,
            _ => match image {
                Some(img) if img.starts_with("cPK") => CardType::Pokemon,
                Some(img) if img.starts_with("cTR") => CardType::Item,
                _ => CardType::Unknown,
            },
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CardType::Pokemon => "Pokemon",
            CardType::Item => "Item",
            CardType::Tool => "Tool",
            CardType::Supporter => "Supporter",
            CardType::Stadium => "Stadium",
            CardType::Energy => "Energy",
            CardType::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// CatalogCard: one row of the `cards` view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCard {
    pub set_code: String,
    pub number: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_field: Option<String>,
    pub image: Option<String>,
}

impl CatalogCard {
    pub fn card_type(&self) -> CardType {
        CardType::from_raw(self.type_field.as_deref(), self.image.as_deref())
    }

    pub fn identity(&self) -> CardIdentity {
        CardIdentity::from_print(
            &self.set_code,
            &self.number,
            self.name.as_deref().unwrap_or("Unknown"),
        )
    }
}

// ---------------------------------------------------------------------------
// CardIdentity: a playable card, independent of cosmetic prints
// ---------------------------------------------------------------------------

/// Ordered by catalog key; the display name never participates in identity
/// beyond being derived from the same catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardIdentity {
    pub key: String,
    pub name: String,
}

impl CardIdentity {
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
        }
    }

    /// Identity keyed by the canonical print, e.g. `A1_33`.
    pub fn from_print(set: &str, number: &str, name: &str) -> Self {
        Self {
            key: format!("{}_{}", set, number),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for CardIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.key)
    }
}
