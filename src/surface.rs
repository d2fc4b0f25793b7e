//! Road surface lookup via the Overpass API
//!
//! The mud estimation only applies to unpaved roads, so the dashboard
//! checks the OSM `surface` tag of the nearest highway before making a
//! verdict. Results are cached for a long time; road surfaces rarely
//! change.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cache;
use crate::config::MudcastConfig;
use crate::models::Location;

/// Surface classification of the road nearest to a coordinate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoadSurface {
    /// Dirt-like surface where rain turns the road to mud
    Unpaved,
    /// Sealed or otherwise firm surface (the tag value is kept)
    Paved(String),
    /// No tagged highway near the coordinate
    NoRoad,
}

impl RoadSurface {
    /// Whether the mud estimation applies to this surface
    #[must_use]
    pub fn needs_estimate(&self) -> bool {
        matches!(self, RoadSurface::Unpaved)
    }

    /// Build a surface classification from an OSM `surface` tag value
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "unpaved" | "dirt" | "ground" | "earth" | "mud" => RoadSurface::Unpaved,
            other => RoadSurface::Paved(other.to_string()),
        }
    }
}

impl std::fmt::Display for RoadSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoadSurface::Unpaved => write!(f, "unpaved"),
            RoadSurface::Paved(tag) => write!(f, "{tag}"),
            RoadSurface::NoRoad => write!(f, "no road found"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Look up the surface of the road nearest to the location.
#[instrument(skip(client, config, location), fields(name = %location.name))]
pub async fn get_road_surface(
    client: &reqwest::Client,
    config: &MudcastConfig,
    location: &Location,
) -> Result<RoadSurface> {
    let key = location.surface_cache_key();

    if let Some(cached) = cache::get::<RoadSurface>(&key).await? {
        tracing::debug!("Surface served from cache");
        return Ok(cached);
    }

    let surface = query_overpass(client, config, location).await?;

    let ttl = Duration::from_secs(u64::from(config.cache.surface_ttl_days) * 24 * 60 * 60);
    cache::put(&key, surface.clone(), ttl).await?;

    Ok(surface)
}

async fn query_overpass(
    client: &reqwest::Client,
    config: &MudcastConfig,
    location: &Location,
) -> Result<RoadSurface> {
    tracing::debug!("Querying Overpass for road surface");

    let query = format!(
        "[out:json];way(around:{},{},{})[highway][surface];out tags;",
        config.road.surface_radius_m, location.latitude, location.longitude
    );

    let response = client
        .post(&config.road.overpass_url)
        .form(&[("data", query.as_str())])
        .send()
        .await
        .with_context(|| "Overpass request failed")?
        .error_for_status()
        .with_context(|| "Overpass returned an error status")?;

    let response: OverpassResponse = response
        .json()
        .await
        .with_context(|| "Failed to parse Overpass response")?;

    Ok(parse_surface(&response))
}

fn parse_surface(response: &OverpassResponse) -> RoadSurface {
    response
        .elements
        .first()
        .and_then(|element| element.tags.get("surface"))
        .map_or(RoadSurface::NoRoad, |tag| RoadSurface::from_tag(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_from_tag() {
        assert_eq!(RoadSurface::from_tag("unpaved"), RoadSurface::Unpaved);
        assert_eq!(RoadSurface::from_tag("dirt"), RoadSurface::Unpaved);
        assert_eq!(
            RoadSurface::from_tag("asphalt"),
            RoadSurface::Paved("asphalt".to_string())
        );
    }

    #[test]
    fn test_needs_estimate() {
        assert!(RoadSurface::Unpaved.needs_estimate());
        assert!(!RoadSurface::Paved("asphalt".to_string()).needs_estimate());
        assert!(!RoadSurface::NoRoad.needs_estimate());
    }

    #[test]
    fn test_parse_overpass_response() {
        let fixture = r#"{
            "elements": [
                {"tags": {"highway": "track", "surface": "dirt"}},
                {"tags": {"highway": "residential", "surface": "asphalt"}}
            ]
        }"#;

        let response: OverpassResponse = serde_json::from_str(fixture).unwrap();
        assert_eq!(parse_surface(&response), RoadSurface::Unpaved);
    }

    #[test]
    fn test_parse_overpass_empty_elements() {
        let fixture = r#"{"elements": []}"#;
        let response: OverpassResponse = serde_json::from_str(fixture).unwrap();
        assert_eq!(parse_surface(&response), RoadSurface::NoRoad);
    }

    #[test]
    fn test_parse_overpass_missing_surface_tag() {
        let fixture = r#"{"elements": [{"tags": {"highway": "track"}}]}"#;
        let response: OverpassResponse = serde_json::from_str(fixture).unwrap();
        assert_eq!(parse_surface(&response), RoadSurface::NoRoad);
    }

    #[test]
    fn test_display() {
        assert_eq!(RoadSurface::Unpaved.to_string(), "unpaved");
        assert_eq!(
            RoadSurface::Paved("gravel".to_string()).to_string(),
            "gravel"
        );
        assert_eq!(RoadSurface::NoRoad.to_string(), "no road found");
    }
}
