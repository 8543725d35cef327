use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CatalogApi, CatalogError, ListKind};
use crate::config::Config;
use crate::models::{CastMember, Genre, Item, ItemDetail, ItemId, Video};

#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let user_agent = format!("streamverse/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build catalog HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.catalog_url.clone(), config.api_key.clone())
    }

    pub async fn fetch_list(&self, kind: &ListKind) -> Result<Vec<Item>, CatalogError> {
        #[derive(Deserialize)]
        struct ListResponse {
            results: Vec<Item>,
        }

        let (path, params) = kind.endpoint();
        let url = self.url(path, &params);
        let data: ListResponse = self.get_json(&url).await?;
        debug!("Fetched {} {}", data.results.len(), kind);
        Ok(data.results)
    }

    pub async fn fetch_genres(&self) -> Result<Vec<Genre>, CatalogError> {
        #[derive(Deserialize)]
        struct GenreResponse {
            genres: Vec<Genre>,
        }

        let url = self.url("/genre/movie/list", &[]);
        let data: GenreResponse = self.get_json(&url).await?;
        Ok(data.genres)
    }

    /// A 404 from the catalog means the item does not exist, not a fault.
    pub async fn fetch_detail(&self, id: ItemId) -> Result<Option<Item>, CatalogError> {
        let url = self.url(
            &format!("/movie/{id}"),
            &[("append_to_response", "videos,credits".to_string())],
        );
        match self.get_json::<DetailResponse>(&url).await {
            Ok(detail) => Ok(Some(detail.into_item())),
            Err(CatalogError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}{path}?api_key={}", self.base_url, self.api_key);
        for (name, value) in params {
            url.push('&');
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, CatalogError> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn list(&self, kind: ListKind) -> Vec<Item> {
        match self.fetch_list(&kind).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Error fetching {}: {}", kind, e);
                Vec::new()
            }
        }
    }

    async fn genres(&self) -> Vec<Genre> {
        match self.fetch_genres().await {
            Ok(genres) => genres,
            Err(e) => {
                warn!("Error fetching genres: {}", e);
                Vec::new()
            }
        }
    }

    async fn detail(&self, id: ItemId) -> Option<Item> {
        match self.fetch_detail(id).await {
            Ok(item) => item,
            Err(e) => {
                warn!("Error fetching details for item {}: {}", id, e);
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    #[serde(flatten)]
    item: Item,
    runtime: Option<u32>,
    tagline: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    credits: Option<Credits>,
    videos: Option<Videos>,
}

#[derive(Debug, Deserialize)]
struct Credits {
    #[serde(default)]
    cast: Vec<CastMember>,
}

#[derive(Debug, Deserialize)]
struct Videos {
    #[serde(default)]
    results: Vec<Video>,
}

impl DetailResponse {
    fn into_item(self) -> Item {
        let DetailResponse {
            mut item,
            runtime,
            tagline,
            genres,
            credits,
            videos,
        } = self;
        if item.genre_ids.is_empty() {
            item.genre_ids = genres.iter().map(|g| g.id).collect();
        }
        item.detail = Some(ItemDetail {
            runtime,
            tagline: tagline.filter(|t| !t.trim().is_empty()),
            genres,
            cast: credits.map(|c| c.cast).unwrap_or_default(),
            videos: videos.map(|v| v.results).unwrap_or_default(),
        });
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detail_payload_maps_credits_and_videos() {
        let value = json!({
            "id": 550,
            "title": "Fight Club",
            "overview": "An insomniac office worker...",
            "vote_average": 8.4,
            "release_date": "1999-10-15",
            "poster_path": "/pB8.jpg",
            "backdrop_path": "/hZk.jpg",
            "runtime": 139,
            "tagline": "Mischief. Mayhem. Soap.",
            "genres": [{ "id": 18, "name": "Drama" }],
            "credits": {
                "cast": [
                    { "name": "Edward Norton", "character": "The Narrator" },
                    { "name": "Brad Pitt", "character": "Tyler Durden" }
                ]
            },
            "videos": {
                "results": [
                    { "key": "qtRKdVHc-cE", "site": "YouTube", "type": "Trailer", "name": "Trailer" }
                ]
            }
        });
        let detail: DetailResponse = serde_json::from_value(value).expect("detail deserialize");
        let item = detail.into_item();
        assert_eq!(item.id, 550);
        assert_eq!(item.genre_ids, vec![18]);
        let extra = item.detail.expect("detail payload");
        assert_eq!(extra.runtime, Some(139));
        assert_eq!(extra.cast.len(), 2);
        assert_eq!(
            extra.trailer_url().as_deref(),
            Some("https://www.youtube.com/watch?v=qtRKdVHc-cE")
        );
    }

    #[test]
    fn blank_tagline_is_dropped() {
        let value = json!({ "id": 1, "title": "X", "tagline": "  ", "runtime": null });
        let detail: DetailResponse = serde_json::from_value(value).unwrap();
        let extra = detail.into_item().detail.unwrap();
        assert_eq!(extra.tagline, None);
        assert_eq!(extra.runtime, None);
    }

    #[test]
    fn url_carries_credential_and_encoded_params() {
        let client = CatalogClient::new("http://catalog.test/3/", "k3y").unwrap();
        let url = client.url("/search/movie", &[("query", "the thing & co".to_string())]);
        assert_eq!(
            url,
            "http://catalog.test/3/search/movie?api_key=k3y&query=the%20thing%20%26%20co"
        );
    }
}
