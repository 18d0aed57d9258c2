//! services/api/src/adapters/image_search.rs
//!
//! Finds an existing, freely licensed picture on Wikimedia Commons.
//! It implements the `ImageSearchService` port from the `core` crate.

use async_trait::async_trait;
use medha_core::ports::{ImageSearchService, PortError, PortResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

const COMMONS_API: &str = "https://commons.wikimedia.org/w/api.php";
const USER_AGENT: &str = "medha-tutor/0.1 (educational image lookup)";
const MAX_CANDIDATES: &str = "8";
const THUMB_WIDTH: &str = "1024";

//=========================================================================================
// Commons API Response Structs
//=========================================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    pages: HashMap<String, SearchPage>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: Option<String>,
    thumburl: Option<String>,
    mime: Option<String>,
}

/// Picks the best-ranked raster picture from a Commons search response.
fn best_image(response: SearchResponse) -> Option<String> {
    let mut pages: Vec<SearchPage> = response.query?.pages.into_values().collect();
    pages.sort_by_key(|p| p.index);
    pages.into_iter().find_map(|page| {
        page.imageinfo.into_iter().find_map(|info| {
            let raster = info
                .mime
                .as_deref()
                .is_some_and(|m| matches!(m, "image/jpeg" | "image/png" | "image/gif"));
            if raster {
                info.thumburl.or(info.url)
            } else {
                None
            }
        })
    })
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct CommonsImageSearchAdapter {
    client: reqwest::Client,
    endpoint: String,
}

impl CommonsImageSearchAdapter {
    pub fn new(timeout: Duration) -> PortResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PortError::Unexpected(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: COMMONS_API.to_string(),
        })
    }
}

#[async_trait]
impl ImageSearchService for CommonsImageSearchAdapter {
    async fn find_image(&self, query: &str) -> PortResult<Option<String>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrnamespace", "6"),
                ("gsrlimit", MAX_CANDIDATES),
                ("prop", "imageinfo"),
                ("iiprop", "url|mime"),
                ("iiurlwidth", THUMB_WIDTH),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Image search request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| PortError::Unexpected(format!("Image search failed: {}", e)))?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Unreadable image search response: {}", e)))?;

        let found = best_image(body);
        if found.is_none() {
            info!("No suitable image found for '{}'.", query);
        }
        Ok(found)
    }
}
