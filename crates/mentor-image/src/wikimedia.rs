//! Wikimedia Commons image search.
//!
//! Two keyword searches over the File namespace (restricted to images first,
//! then unrestricted), followed by one `imageinfo` lookup per candidate until
//! one is large enough.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use mentor_core::config::ImageConfig;

use crate::{ImageError, ImageLookup, ImageSize};

/// MediaWiki namespace holding `File:` pages.
const FILE_NAMESPACE: &str = "6";

pub struct WikimediaClient {
    client: Client,
    api_base: String,
    search_limit: u32,
    last_error: Mutex<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ImageInfoResponse {
    query: Option<PagesQuery>,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: BTreeMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

impl WikimediaClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
            search_limit: 10,
            last_error: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ImageConfig) -> Self {
        Self::new(&config.api_base).with_search_limit(config.search_limit)
    }

    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit;
        self
    }

    fn set_error(&self, error: Option<String>) {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = error;
        }
    }

    async fn lookup(&self, query: &str, preferred: ImageSize) -> Result<String, ImageError> {
        let query = normalize_query(query);
        if query.is_empty() {
            return Err(ImageError::EmptyQuery);
        }

        let mut hits = self.search(&format!("{} filetype:image", query)).await?;
        if hits.is_empty() {
            debug!(query = %query, "No image-typed hits, retrying unrestricted search");
            hits = self.search(&query).await?;
            if hits.is_empty() {
                return Err(ImageError::NoResults(query));
            }
        }

        for hit in &hits {
            match self.image_info(&hit.title).await {
                Ok(Some(info)) if info.width >= preferred.width && info.height >= preferred.height => {
                    info!(title = %hit.title, url = %info.url, "Found suitable image");
                    return Ok(info.url);
                }
                Ok(Some(info)) => {
                    debug!(
                        title = %hit.title,
                        width = info.width,
                        height = info.height,
                        "Image dimensions not suitable"
                    );
                }
                Ok(None) => debug!(title = %hit.title, "No image info for candidate"),
                Err(e) => debug!(title = %hit.title, error = %e, "Image info lookup failed"),
            }
        }

        Err(ImageError::NoSuitableImage {
            width: preferred.width,
            height: preferred.height,
        })
    }

    async fn search(&self, srsearch: &str) -> Result<Vec<SearchHit>, ImageError> {
        let limit = self.search_limit.to_string();
        let response = self
            .client
            .get(&self.api_base)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("origin", "*"),
                ("list", "search"),
                ("srsearch", srsearch),
                ("srlimit", limit.as_str()),
                ("srnamespace", FILE_NAMESPACE),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ImageError::Status(response.status().as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.query.map(|q| q.search).unwrap_or_default())
    }

    async fn image_info(&self, title: &str) -> Result<Option<ImageInfo>, ImageError> {
        let response = self
            .client
            .get(&self.api_base)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("origin", "*"),
                ("prop", "imageinfo"),
                ("iiprop", "url|size|dimensions"),
                ("titles", title),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ImageError::Status(response.status().as_u16()));
        }

        let body: ImageInfoResponse = response.json().await?;
        Ok(body
            .query
            .and_then(|q| q.pages.into_values().next())
            .and_then(|page| page.imageinfo.into_iter().next()))
    }
}

#[async_trait]
impl ImageLookup for WikimediaClient {
    async fn fetch_image(&self, query: &str, preferred: ImageSize) -> Option<String> {
        self.set_error(None);
        match self.lookup(query, preferred).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(query = %query, error = %e, "Image lookup failed");
                self.set_error(Some(e.to_string()));
                None
            }
        }
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|e| e.clone())
    }
}

/// Trim and collapse internal whitespace runs to single spaces.
fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}
