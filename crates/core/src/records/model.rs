//! Cocktail catalog records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Ingredient {
    pub name: String,
    pub amount: String,
    pub unit: String,
}

/// One catalog record. Field names follow the browser app's JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cocktail {
    pub id: String,
    pub name: String,
    pub base_spirit: String,
    pub ingredients: Vec<Ingredient>,
    pub flavour_profile: Vec<String>,
    pub description: String,
    pub instructions: Vec<String>,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_had: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favourite: Option<bool>,
}

const DEFAULT_CATALOG: &str = include_str!("../../data/cocktails.json");

/// The bundled catalog shown before the user has saved anything.
pub fn default_catalog() -> Vec<Cocktail> {
    match serde_json::from_str(DEFAULT_CATALOG) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(error = %e, "bundled cocktail catalog is malformed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_parses() {
        let catalog = default_catalog();
        assert!(!catalog.is_empty());
        assert_eq!(catalog[0].name, "Negroni");
        assert!(catalog.iter().all(|c| c.image_url.contains("unsplash.com")));
    }

    #[test]
    fn test_camel_case_layout() {
        let json = serde_json::to_value(&default_catalog()[0]).unwrap();
        assert!(json.get("baseSpirit").is_some());
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("rating").is_none());
    }
}
