//! Read models assembled from catalog calls, one per page of the front end.

use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, warn};

use crate::catalog::images::SizeTier;
use crate::catalog::CatalogApi;
use crate::filter::SearchFilter;
use crate::models::{format_runtime, CastMember, Item, ItemId};

/// The hero is drawn from the head of the trending list.
pub const HERO_CANDIDATES: usize = 5;
pub const DETAIL_CAST: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Failed to load content from the catalog")]
    CatalogUnavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub key: &'static str,
    pub title: &'static str,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Landing {
    pub hero: Option<Item>,
    pub rows: Vec<Row>,
}

/// Fetches every row concurrently. Each row already degrades to empty on
/// failure, so only a landing page with nothing at all is an error.
pub async fn load_landing(catalog: &dyn CatalogApi, hero_seed: usize) -> Result<Landing, ViewError> {
    let (trending, popular, top_rated, upcoming, tv_popular) = tokio::join!(
        catalog.trending(),
        catalog.popular(),
        catalog.top_rated(),
        catalog.upcoming(),
        catalog.tv_popular(),
    );

    let hero = pick_hero(&trending, hero_seed);
    let rows = vec![
        Row { key: "trending", title: "Trending Now", items: trending },
        Row { key: "popular", title: "Popular Movies", items: popular },
        Row { key: "top_rated", title: "Top Rated", items: top_rated },
        Row { key: "upcoming", title: "Coming Soon", items: upcoming },
        Row { key: "tv_popular", title: "Popular TV Shows", items: tv_popular },
    ];

    if rows.iter().all(|r| r.items.is_empty()) {
        warn!("Every landing row came back empty");
        return Err(ViewError::CatalogUnavailable);
    }
    Ok(Landing { hero, rows })
}

pub fn pick_hero(trending: &[Item], seed: usize) -> Option<Item> {
    let pool = trending.len().min(HERO_CANDIDATES);
    if pool == 0 {
        return None;
    }
    trending.get(seed % pool).cloned()
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    pub item: Item,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub rating: String,
    pub year: Option<String>,
    pub runtime: Option<String>,
    pub trailer_url: Option<String>,
    pub cast: Vec<CastMember>,
    pub in_watchlist: bool,
}

impl DetailView {
    pub fn new(item: Item, in_watchlist: bool) -> Self {
        let detail = item.detail.clone().unwrap_or_default();
        Self {
            poster_url: item.poster_url(SizeTier::Large),
            backdrop_url: item.backdrop_url(SizeTier::Large),
            rating: format!("{}/10", item.rating_label()),
            year: item.year().map(str::to_string),
            runtime: detail.runtime.map(format_runtime),
            trailer_url: detail.trailer_url(),
            cast: detail.top_cast(DETAIL_CAST).to_vec(),
            in_watchlist,
            item,
        }
    }
}

/// `None` means the catalog has no such item.
pub async fn load_detail(catalog: &dyn CatalogApi, id: ItemId) -> Option<DetailView> {
    catalog.detail(id).await.map(|item| DetailView::new(item, false))
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub query: String,
    /// Result count before filtering.
    pub total: usize,
    pub items: Vec<Item>,
}

pub async fn run_search(catalog: &dyn CatalogApi, query: &str, filter: &SearchFilter) -> SearchPage {
    let query = query.trim();
    let results = catalog.search(query).await;
    SearchPage {
        query: query.to_string(),
        total: results.len(),
        items: filter.apply(&results),
    }
}

/// Details for each watchlisted id, in watchlist order. Ids the catalog no
/// longer knows are dropped.
pub async fn load_watchlist(catalog: Arc<dyn CatalogApi>, ids: &[ItemId]) -> Vec<Item> {
    let mut tasks = JoinSet::new();
    for (index, &id) in ids.iter().enumerate() {
        let catalog = Arc::clone(&catalog);
        tasks.spawn(async move { (index, catalog.detail(id).await) });
    }

    let mut slots: Vec<Option<Item>> = vec![None; ids.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, item)) => slots[index] = item,
            Err(e) => error!("Watchlist detail task failed: {}", e),
        }
    }
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(n: i64) -> Vec<Item> {
        (1..=n)
            .map(|id| serde_json::from_value(json!({ "id": id, "title": format!("T{id}") })).unwrap())
            .collect()
    }

    #[test]
    fn hero_comes_from_first_five_trending() {
        let trending = items(8);
        for seed in 0..20 {
            let hero = pick_hero(&trending, seed).unwrap();
            assert!(hero.id <= 5);
        }
        assert_eq!(pick_hero(&trending, 7).unwrap().id, 3);
        assert_eq!(pick_hero(&items(2), 3).unwrap().id, 2);
        assert!(pick_hero(&[], 0).is_none());
    }

    #[test]
    fn detail_view_formats_fields() {
        let cast: Vec<serde_json::Value> =
            (0..8).map(|i| json!({ "name": format!("Actor {i}") })).collect();
        let item: Item = serde_json::from_value(json!({
            "id": 550,
            "title": "Fight Club",
            "vote_average": 8.43,
            "release_date": "1999-10-15",
            "poster_path": "/p.jpg",
            "detail": {
                "runtime": 139,
                "cast": cast,
                "videos": []
            }
        }))
        .unwrap();
        let view = DetailView::new(item, true);
        assert_eq!(view.rating, "8.4/10");
        assert_eq!(view.year.as_deref(), Some("1999"));
        assert_eq!(view.runtime.as_deref(), Some("2h 19m"));
        assert_eq!(view.cast.len(), 6);
        assert_eq!(
            view.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/p.jpg")
        );
        assert!(view.backdrop_url.is_none());
        assert!(view.trailer_url.is_none());
        assert!(view.in_watchlist);
    }
}
