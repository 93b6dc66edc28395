use std::str::FromStr;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Browse categories offered next to the search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Music,
    Culture,
    Nature,
    Sports,
    History,
    Tourism,
    Nightlife,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Music,
        Category::Culture,
        Category::Nature,
        Category::Sports,
        Category::History,
        Category::Tourism,
        Category::Nightlife,
    ];

    #[must_use]
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Food => &["comida típica", "gastronomía", "street food", "mercado", "recetas"],
            Self::Music => &["música en vivo", "concierto", "músicos callejeros", "festival"],
            Self::Culture => &["cultura", "tradiciones", "museos", "arte urbano"],
            Self::Nature => &["naturaleza", "senderismo", "paisajes", "parque natural"],
            Self::Sports => &["deportes", "fútbol", "surf", "estadio"],
            Self::History => &["historia", "monumentos", "arqueología", "casco antiguo"],
            Self::Tourism => &["turismo", "qué ver", "guía de viaje", "vlog de viaje"],
            Self::Nightlife => &["vida nocturna", "bares", "discotecas", "de noche"],
        }
    }

    /// Picks one keyword from this category's fixed list.
    pub fn pick_keyword<R: Rng + ?Sized>(self, rng: &mut R) -> &'static str {
        let keywords = self.keywords();
        keywords.choose(rng).copied().unwrap_or(keywords[0])
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Music => "music",
            Self::Culture => "culture",
            Self::Nature => "nature",
            Self::Sports => "sports",
            Self::History => "history",
            Self::Tourism => "tourism",
            Self::Nightlife => "nightlife",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| CoreError::UnknownCategory(s.to_string()))
    }
}
