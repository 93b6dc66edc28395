//! Static deny-list of countries and place names where video search is not
//! offered.
//!
//! [`evaluate`] is pure and recomputed for every search; verdicts are never
//! cached or persisted.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::ResolvedPlace;

/// ISO 3166-1 alpha-2 codes, upper-case.
const RESTRICTED_COUNTRIES: &[&str] = &["CN", "KP", "IR", "TM", "ER"];

/// Country and city names (Spanish and English spellings) matched as whole
/// words, case-insensitively.
const RESTRICTED_NAMES: &[&str] = &[
    "china",
    "beijing",
    "pekín",
    "pekin",
    "shanghai",
    "shanghái",
    "guangzhou",
    "cantón",
    "shenzhen",
    "corea del norte",
    "north korea",
    "pyongyang",
    "pionyang",
    "irán",
    "iran",
    "teherán",
    "tehran",
    "turkmenistán",
    "turkmenistan",
    "asjabad",
    "ashgabat",
    "eritrea",
    "asmara",
];

static RESTRICTED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = RESTRICTED_NAMES
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("deny-list pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictionReason {
    Query,
    Country,
    Location,
}

impl RestrictionReason {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Query => "La búsqueda menciona un lugar donde el contenido no está disponible.",
            Self::Country => "El contenido de video no está disponible en este país.",
            Self::Location => "Esta ubicación no está disponible para búsquedas de video.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionVerdict {
    pub restricted: bool,
    pub reason: Option<RestrictionReason>,
    pub message: Option<String>,
}

impl RestrictionVerdict {
    #[must_use]
    pub fn allowed() -> Self {
        Self {
            restricted: false,
            reason: None,
            message: None,
        }
    }

    #[must_use]
    pub fn blocked(reason: RestrictionReason) -> Self {
        Self {
            restricted: true,
            reason: Some(reason),
            message: Some(reason.message().to_string()),
        }
    }
}

/// `true` when `code` (any case) is a deny-listed country.
#[must_use]
pub fn is_restricted_country(code: &str) -> bool {
    RESTRICTED_COUNTRIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(code.trim()))
}

/// Evaluates a search against the deny-list.
///
/// With a place, its country code is tested first so a deny-listed country
/// always yields [`RestrictionReason::Country`]; then the query text; then
/// the place's display name. Without a place only the query text is tested,
/// which catches explicit mentions before any place is resolved.
#[must_use]
pub fn evaluate(query_text: &str, place: Option<&ResolvedPlace>) -> RestrictionVerdict {
    if let Some(code) = place.and_then(|p| p.country_code.as_deref()) {
        if is_restricted_country(code) {
            return RestrictionVerdict::blocked(RestrictionReason::Country);
        }
    }

    if RESTRICTED_PATTERN.is_match(query_text) {
        return RestrictionVerdict::blocked(RestrictionReason::Query);
    }

    if let Some(place) = place {
        if RESTRICTED_PATTERN.is_match(&place.display_name) {
            return RestrictionVerdict::blocked(RestrictionReason::Location);
        }
    }

    RestrictionVerdict::allowed()
}
