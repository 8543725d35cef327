use serde::{Deserialize, Serialize};

use crate::catalog::images::{ImageKind, SizeTier};

pub type ItemId = i64;
pub type GenreId = i64;

/// A movie or TV show as returned by the catalog service.
///
/// TV records carry `name` and `first_air_date`; the aliases fold them into
/// `title` and `release_date` so both kinds share one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default, alias = "first_air_date")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
    /// Only present on single-item fetches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ItemDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub runtime: Option<u32>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Item {
    pub fn year(&self) -> Option<&str> {
        self.release_date.as_deref().and_then(extract_year)
    }

    pub fn rating_label(&self) -> String {
        format!("{:.1}", self.vote_average)
    }

    pub fn has_genre(&self, genre: GenreId) -> bool {
        self.genre_ids.contains(&genre)
            || self
                .detail
                .as_ref()
                .is_some_and(|d| d.genres.iter().any(|g| g.id == genre))
    }

    pub fn poster_url(&self, tier: SizeTier) -> Option<String> {
        self.poster_path
            .as_deref()
            .map(|p| ImageKind::Poster.url(tier, p))
    }

    pub fn backdrop_url(&self, tier: SizeTier) -> Option<String> {
        self.backdrop_path
            .as_deref()
            .map(|p| ImageKind::Backdrop.url(tier, p))
    }
}

impl ItemDetail {
    /// First YouTube trailer, falling back to a teaser.
    pub fn trailer_url(&self) -> Option<String> {
        let youtube = |kind: &str| {
            self.videos
                .iter()
                .find(|v| v.site.eq_ignore_ascii_case("YouTube") && v.video_type == kind)
        };
        youtube("Trailer")
            .or_else(|| youtube("Teaser"))
            .map(|v| format!("https://www.youtube.com/watch?v={}", v.key))
    }

    pub fn top_cast(&self, max: usize) -> &[CastMember] {
        &self.cast[..self.cast.len().min(max)]
    }
}

pub fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

fn extract_year(date: &str) -> Option<&str> {
    date.split('-').next().filter(|y| !y.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tv_records_fold_into_item_fields() {
        let value = json!({
            "id": 1399,
            "name": "Game of Thrones",
            "first_air_date": "2011-04-17",
            "vote_average": 8.4,
            "genre_ids": [18, 10765]
        });
        let item: Item = serde_json::from_value(value).expect("tv item");
        assert_eq!(item.title, "Game of Thrones");
        assert_eq!(item.release_date.as_deref(), Some("2011-04-17"));
        assert_eq!(item.year(), Some("2011"));
        assert!(item.detail.is_none());
    }

    #[test]
    fn missing_or_empty_dates_have_no_year() {
        let mut item: Item = serde_json::from_value(json!({ "id": 1, "title": "X" })).unwrap();
        assert_eq!(item.year(), None);
        item.release_date = Some(String::new());
        assert_eq!(item.year(), None);
    }

    #[test]
    fn rating_label_has_one_decimal() {
        let item: Item =
            serde_json::from_value(json!({ "id": 1, "title": "X", "vote_average": 7.26 }))
                .unwrap();
        assert_eq!(item.rating_label(), "7.3");
    }

    #[test]
    fn runtime_formats_hours_and_minutes() {
        assert_eq!(format_runtime(139), "2h 19m");
        assert_eq!(format_runtime(45), "0h 45m");
    }

    #[test]
    fn trailer_prefers_youtube_trailer_then_teaser() {
        let video = |site: &str, kind: &str, key: &str| Video {
            key: key.to_string(),
            site: site.to_string(),
            video_type: kind.to_string(),
            name: None,
        };
        let mut detail = ItemDetail {
            videos: vec![
                video("Vimeo", "Trailer", "vimeo"),
                video("YouTube", "Teaser", "teaser"),
                video("YouTube", "Trailer", "trailer"),
            ],
            ..Default::default()
        };
        assert_eq!(
            detail.trailer_url().as_deref(),
            Some("https://www.youtube.com/watch?v=trailer")
        );
        detail.videos.pop();
        assert_eq!(
            detail.trailer_url().as_deref(),
            Some("https://www.youtube.com/watch?v=teaser")
        );
    }

    #[test]
    fn genre_matches_ids_or_detail_genres() {
        let mut item: Item =
            serde_json::from_value(json!({ "id": 1, "title": "X", "genre_ids": [5] })).unwrap();
        assert!(item.has_genre(5));
        assert!(!item.has_genre(6));
        item.detail = Some(ItemDetail {
            genres: vec![Genre {
                id: 6,
                name: "Drama".to_string(),
            }],
            ..Default::default()
        });
        assert!(item.has_genre(6));
    }
}
