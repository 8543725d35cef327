//! Size tiers for catalog image paths.
//!
//! The catalog returns relative paths such as `/abc.jpg`; a display context
//! picks a kind and tier and the path is appended to that tier's base URL.

use serde::Deserialize;

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Poster,
    Backdrop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTier {
    Small,
    Medium,
    #[default]
    Large,
    Original,
}

impl ImageKind {
    fn segment(self, tier: SizeTier) -> &'static str {
        match (self, tier) {
            (ImageKind::Poster, SizeTier::Small) => "w185",
            (ImageKind::Poster, SizeTier::Medium) => "w300",
            (ImageKind::Poster, SizeTier::Large) => "w500",
            (ImageKind::Backdrop, SizeTier::Small) => "w300",
            (ImageKind::Backdrop, SizeTier::Medium) => "w780",
            (ImageKind::Backdrop, SizeTier::Large) => "w1280",
            (_, SizeTier::Original) => "original",
        }
    }

    pub fn base_url(self, tier: SizeTier) -> String {
        format!("{IMAGE_BASE}/{}", self.segment(tier))
    }

    pub fn url(self, tier: SizeTier, path: &str) -> String {
        let base = self.base_url(tier);
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poster_tiers_map_to_fixed_widths() {
        assert_eq!(
            ImageKind::Poster.url(SizeTier::Small, "/a.jpg"),
            "https://image.tmdb.org/t/p/w185/a.jpg"
        );
        assert_eq!(
            ImageKind::Poster.url(SizeTier::Large, "/a.jpg"),
            "https://image.tmdb.org/t/p/w500/a.jpg"
        );
        assert_eq!(
            ImageKind::Poster.base_url(SizeTier::Original),
            "https://image.tmdb.org/t/p/original"
        );
    }

    #[test]
    fn backdrop_tiers_map_to_fixed_widths() {
        assert_eq!(
            ImageKind::Backdrop.url(SizeTier::Medium, "/b.jpg"),
            "https://image.tmdb.org/t/p/w780/b.jpg"
        );
        assert_eq!(
            ImageKind::Backdrop.url(SizeTier::Large, "b.jpg"),
            "https://image.tmdb.org/t/p/w1280/b.jpg"
        );
    }
}
