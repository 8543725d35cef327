use async_trait::async_trait;
use std::fmt;

use crate::models::{Genre, GenreId, Item, ItemId};

mod client;
pub mod images;

pub use client::CatalogClient;

/// Read access to the remote catalog.
///
/// Implementations never surface faults: a failed list is empty and a failed
/// detail lookup is `None`. Callers that need to tell the two apart use the
/// fallible methods on [`CatalogClient`] directly.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list(&self, kind: ListKind) -> Vec<Item>;
    async fn genres(&self) -> Vec<Genre>;
    async fn detail(&self, id: ItemId) -> Option<Item>;

    async fn trending(&self) -> Vec<Item> {
        self.list(ListKind::Trending).await
    }

    async fn popular(&self) -> Vec<Item> {
        self.list(ListKind::Popular).await
    }

    async fn top_rated(&self) -> Vec<Item> {
        self.list(ListKind::TopRated).await
    }

    async fn upcoming(&self) -> Vec<Item> {
        self.list(ListKind::Upcoming).await
    }

    async fn tv_popular(&self) -> Vec<Item> {
        self.list(ListKind::TvPopular).await
    }

    async fn by_genre(&self, genre: GenreId) -> Vec<Item> {
        self.list(ListKind::ByGenre(genre)).await
    }

    /// Blank queries short-circuit without touching the network.
    async fn search(&self, query: &str) -> Vec<Item> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        self.list(ListKind::Search(query.to_string())).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListKind {
    Trending,
    Popular,
    TopRated,
    Upcoming,
    TvPopular,
    ByGenre(GenreId),
    Search(String),
}

impl ListKind {
    /// Path template and extra query parameters for this list.
    pub(crate) fn endpoint(&self) -> (&'static str, Vec<(&'static str, String)>) {
        match self {
            ListKind::Trending => ("/trending/movie/week", Vec::new()),
            ListKind::Popular => ("/movie/popular", Vec::new()),
            ListKind::TopRated => ("/movie/top_rated", Vec::new()),
            ListKind::Upcoming => ("/movie/upcoming", Vec::new()),
            ListKind::TvPopular => ("/tv/popular", Vec::new()),
            ListKind::ByGenre(id) => ("/discover/movie", vec![("with_genres", id.to_string())]),
            ListKind::Search(query) => ("/search/movie", vec![("query", query.clone())]),
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListKind::Trending => write!(f, "trending movies"),
            ListKind::Popular => write!(f, "popular movies"),
            ListKind::TopRated => write!(f, "top rated movies"),
            ListKind::Upcoming => write!(f, "upcoming movies"),
            ListKind::TvPopular => write!(f, "popular TV shows"),
            ListKind::ByGenre(id) => write!(f, "movies for genre {id}"),
            ListKind::Search(query) => write!(f, "search results for '{query}'"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("catalog returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parse failed: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCatalog {
        calls: Mutex<Vec<ListKind>>,
    }

    #[async_trait]
    impl CatalogApi for RecordingCatalog {
        async fn list(&self, kind: ListKind) -> Vec<Item> {
            self.calls.lock().unwrap().push(kind);
            Vec::new()
        }
        async fn genres(&self) -> Vec<Genre> {
            Vec::new()
        }
        async fn detail(&self, _id: ItemId) -> Option<Item> {
            None
        }
    }

    #[tokio::test]
    async fn blank_search_never_reaches_the_catalog() {
        let catalog = RecordingCatalog::default();
        assert!(catalog.search("").await.is_empty());
        assert!(catalog.search("   \t").await.is_empty());
        assert!(catalog.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_trims_the_query() {
        let catalog = RecordingCatalog::default();
        catalog.search("  dune ").await;
        assert_eq!(
            *catalog.calls.lock().unwrap(),
            vec![ListKind::Search("dune".to_string())]
        );
    }

    #[test]
    fn endpoints_follow_catalog_paths() {
        assert_eq!(ListKind::Trending.endpoint().0, "/trending/movie/week");
        assert_eq!(ListKind::TvPopular.endpoint().0, "/tv/popular");
        let (path, params) = ListKind::ByGenre(28).endpoint();
        assert_eq!(path, "/discover/movie");
        assert_eq!(params, vec![("with_genres", "28".to_string())]);
    }
}
