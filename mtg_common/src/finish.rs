//! Print finishes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical print variant of a card.
///
/// Exports and the catalog share this vocabulary. Anything outside the
/// known set is kept verbatim (lower-cased) in `Other` so it can still be
/// matched exactly against a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Finish {
    Nonfoil,
    Foil,
    Etched,
    /// The export did not say
    Unknown,
    Other(String),
}

impl Finish {
    /// Normalize a raw finish value.
    ///
    /// `normal` is the TCGplayer/ManaBox spelling of `nonfoil`; an empty value
    /// means the row carried no finish.
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "" | "unknown" => Finish::Unknown,
            "normal" | "nonfoil" => Finish::Nonfoil,
            "foil" => Finish::Foil,
            "etched" => Finish::Etched,
            _ => Finish::Other(lower),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Finish::Nonfoil => "nonfoil",
            Finish::Foil => "foil",
            Finish::Etched => "etched",
            Finish::Unknown => "unknown",
            Finish::Other(s) => s,
        }
    }
}

impl fmt::Display for Finish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Finish {
    fn from(raw: String) -> Self {
        Finish::parse(&raw)
    }
}

impl From<Finish> for String {
    fn from(finish: Finish) -> Self {
        finish.as_str().to_string()
    }
}
