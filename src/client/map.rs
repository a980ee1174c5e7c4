//! Concept3D campus map client.
//!
//! Every request carries the `map` number and `key`. Some parameters are bare
//! flags (`children`), so query strings are assembled by hand.

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::{Url, form_urlencoded};

use crate::error::{AppError, Result};
use crate::models::{ApiConfig, MapConfig};
use crate::utils::http::create_client;

/// A map category with its child categories and locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default)]
    pub cat_id: Option<u64>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub children: Children,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Children {
    #[serde(default)]
    pub categories: Vec<CategoryRef>,

    #[serde(default)]
    pub locations: Vec<Room>,
}

/// Child category summary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub cat_id: u64,
    pub name: String,
}

/// A room location inside a building interior.
#[derive(Debug, Clone, Deserialize)]
pub struct Room {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub shape: Option<Shape>,
}

/// Outline of a room as stored by the map, in (lat, lng) pairs.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Polygon { paths: Vec<(f64, f64)> },
    Rectangle { bounds: [(f64, f64); 2] },
    #[serde(other)]
    Unsupported,
}

impl Room {
    /// Outline corners in (lat, lng) order; empty for rooms without a usable shape.
    pub fn outline(&self) -> Vec<(f64, f64)> {
        match &self.shape {
            Some(Shape::Polygon { paths }) => paths.clone(),
            Some(Shape::Rectangle { bounds }) => {
                let [(y1, x1), (y2, x2)] = *bounds;
                vec![(y1, x1), (y2, x1), (y2, x2), (y1, x2)]
            }
            Some(Shape::Unsupported) | None => Vec::new(),
        }
    }
}

/// Client for the Concept3D map API.
pub struct MapClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    map_number: u32,
    interior_category: u64,
}

impl MapClient {
    /// Create a map client; HTTP settings come from the catalog API config.
    pub fn new(config: &MapConfig, http: &ApiConfig) -> Result<Self> {
        let api_key = config.api_key();
        if api_key.is_none() {
            log::warn!("{} is not set; map requests may be rejected", config.api_key_env);
        }
        Ok(Self {
            client: create_client(http)?,
            base_url: Url::parse(&config.base_url)?,
            api_key,
            map_number: config.map_number,
            interior_category: config.interior_category,
        })
    }

    /// Build a request URL. `None` values are sent as bare flags.
    fn url(&self, path: &str, params: &[(&str, Option<&str>)]) -> Result<Url> {
        let mut url = self.base_url.join(path)?;

        let map = self.map_number.to_string();
        let mut pairs: Vec<(&str, Option<&str>)> = vec![("map", Some(map.as_str()))];
        if let Some(key) = &self.api_key {
            pairs.push(("key", Some(key.as_str())));
        }
        pairs.extend_from_slice(params);

        url.set_query(Some(&encode_query(&pairs)));
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, Option<&str>)],
    ) -> Result<T> {
        let url = self.url(path, params)?;
        log::debug!("GET {}", url.path());

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| AppError::map(format!("undecodable response from {path}: {e}")))
    }

    /// Fetch a category with its children.
    pub async fn find_category(&self, category_id: u64) -> Result<Category> {
        self.get_json(&format!("categories/{category_id}"), &[("children", None)])
            .await
    }

    /// Find the interior category of a building by its code, e.g. `ECSS`.
    pub async fn building_interior(&self, building_code: &str) -> Result<Option<Category>> {
        let interiors = self.find_category(self.interior_category).await?;
        let needle = format!("({building_code})");

        match interiors
            .children
            .categories
            .iter()
            .find(|category| category.name.contains(&needle))
        {
            Some(category) => Ok(Some(self.find_category(category.cat_id).await?)),
            None => Ok(None),
        }
    }
}

/// Encode `k=v` pairs, leaving `None` values as bare keys.
fn encode_query(pairs: &[(&str, Option<&str>)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| {
            let key: String = form_urlencoded::byte_serialize(key.as_bytes()).collect();
            match value {
                Some(value) => {
                    let value: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
                    format!("{key}={value}")
                }
                None => key,
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_encode_query_with_flags() {
        let query = encode_query(&[("map", Some("1772")), ("children", None), ("q", Some("JO 1"))]);
        assert_eq!(query, "map=1772&children&q=JO+1");
    }

    #[test]
    fn test_url_carries_map_and_key() {
        let client = MapClient {
            client: Client::new(),
            base_url: Url::parse("https://api.concept3d.com").unwrap(),
            api_key: Some("k".into()),
            map_number: 1772,
            interior_category: 52264,
        };
        let url = client.url("categories/52264", &[("children", None)]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.concept3d.com/categories/52264?map=1772&key=k&children"
        );
    }

    #[test]
    fn test_decode_category() {
        let category: Category = serde_json::from_value(json!({
            "catId": 1,
            "name": "Interiors",
            "children": {
                "categories": [{"catId": 2, "name": "Jonsson (JO)"}],
                "locations": []
            }
        }))
        .unwrap();
        assert_eq!(category.children.categories[0].cat_id, 2);
    }

    #[test]
    fn test_room_outline_shapes() {
        let polygon: Room = serde_json::from_value(json!({
            "name": "JO 1.102", "lat": 1.0, "lng": 2.0,
            "shape": {"type": "polygon", "paths": [[1.0, 2.0], [1.5, 2.0], [1.5, 2.5]]}
        }))
        .unwrap();
        assert_eq!(polygon.outline().len(), 3);

        let rectangle: Room = serde_json::from_value(json!({
            "name": "JO 1.104", "lat": 1.0, "lng": 2.0,
            "shape": {"type": "rectangle", "bounds": [[1.0, 2.0], [3.0, 4.0]]}
        }))
        .unwrap();
        assert_eq!(
            rectangle.outline(),
            vec![(1.0, 2.0), (3.0, 2.0), (3.0, 4.0), (1.0, 4.0)]
        );

        let circle: Room = serde_json::from_value(json!({
            "name": "JO 1.106", "lat": 1.0, "lng": 2.0,
            "shape": {"type": "circle", "radius": 3}
        }))
        .unwrap();
        assert!(circle.outline().is_empty());
    }
}
