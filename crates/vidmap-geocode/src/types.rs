//! Geocoding provider response types.
//!
//! The provider answers every lookup with a GeoJSON-style feature
//! collection. Only the fields the client reads are modelled; everything
//! else is ignored.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub id: String,
    /// The feature's own name, e.g. `"Sevilla"`.
    #[serde(default)]
    pub text: String,
    /// The fully qualified name, e.g. `"Sevilla, Andalucía, España"`.
    #[serde(default)]
    pub place_name: String,
    #[serde(default)]
    pub place_type: Vec<String>,
    /// `[lng, lat]`.
    #[serde(default)]
    pub center: Vec<f64>,
    #[serde(default)]
    pub properties: FeatureProperties,
    /// Parent features, most specific first.
    #[serde(default)]
    pub context: Vec<ContextEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeatureProperties {
    #[serde(default)]
    pub short_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContextEntry {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub short_code: Option<String>,
}

impl Feature {
    /// ISO country code: the feature's own `short_code` for country
    /// features, otherwise the `country.*` context entry. Upper-cased.
    #[must_use]
    pub fn country_code(&self) -> Option<String> {
        let own = self
            .place_type
            .iter()
            .any(|t| t == "country")
            .then(|| self.properties.short_code.clone())
            .flatten();

        own.or_else(|| {
            self.context
                .iter()
                .find(|c| c.id.starts_with("country."))
                .and_then(|c| c.short_code.clone())
        })
        .map(|code| code.trim().to_uppercase())
        .filter(|code| code.len() == 2)
    }
}
