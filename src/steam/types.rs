//! Serde models for the CheapShark and Steam web APIs.
//!
//! Steam's store endpoints are loosely typed: most fields may be missing and
//! `pc_requirements` flips between an object and an empty array, so the raw
//! JSON is kept and parsed on demand.

use serde::Deserialize;

/// One deal row from the CheapShark `/deals` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CheapSharkDeal {
    /// Deal title (usually the game name)
    pub title: String,
    /// Unique deal identifier, the dedup key
    #[serde(rename = "dealID")]
    pub deal_id: String,
    /// Discounted price in USD
    #[serde(rename = "salePrice")]
    pub sale_price: String,
    /// Regular price in USD
    #[serde(rename = "normalPrice")]
    pub normal_price: String,
    /// Steam review blurb, e.g. "Very Positive"
    #[serde(rename = "steamRatingText", default)]
    pub steam_rating: Option<String>,
    /// Steam app ID; absent for bundles and non-Steam entries
    #[serde(rename = "steamAppID", default)]
    pub steam_app_id: Option<String>,
}

/// Envelope of `store.steampowered.com/api/appdetails`, keyed by app ID.
#[derive(Debug, Clone, Deserialize)]
pub struct AppDetailsEnvelope {
    /// Whether the store knows this app
    pub success: bool,
    /// Payload, present only on success
    #[serde(default)]
    pub data: Option<AppDetails>,
}

/// A category tag such as "Single-player".
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    /// Human-readable tag
    #[serde(default)]
    pub description: String,
}

/// A genre tag such as "Action".
#[derive(Debug, Clone, Deserialize)]
pub struct Genre {
    /// Human-readable genre
    #[serde(default)]
    pub description: String,
}

/// Metacritic score block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metacritic {
    /// Score out of 100
    #[serde(default)]
    pub score: i64,
}

/// Release date block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseDate {
    /// Formatted date, or "To be announced" / "Coming soon"
    #[serde(default)]
    pub date: String,
}

/// Price block with the store-formatted final price.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceOverview {
    /// Final price as rendered by the store, e.g. "₹ 1,299"
    #[serde(default)]
    pub final_formatted: String,
}

/// Supported platform flags.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Platforms {
    /// Runs on Windows
    #[serde(default)]
    pub windows: bool,
    /// Runs on macOS
    #[serde(default)]
    pub mac: bool,
    /// Runs on Linux
    #[serde(default)]
    pub linux: bool,
}

/// Minimum and recommended PC requirements as HTML fragments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PcRequirements {
    /// Minimum requirements HTML
    #[serde(default)]
    pub minimum: String,
    /// Recommended requirements HTML
    #[serde(default)]
    pub recommended: String,
}

/// Full app details from the Steam store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppDetails {
    /// Game name
    #[serde(default)]
    pub name: String,
    /// Short store description
    #[serde(default)]
    pub short_description: String,
    /// Free-to-play flag
    #[serde(default)]
    pub is_free: bool,
    /// Header image URL
    #[serde(default)]
    pub header_image: String,
    /// Price block; missing for unreleased or free games
    #[serde(default)]
    pub price_overview: PriceOverview,
    /// Raw requirements JSON (object, or `[]` when unknown)
    #[serde(default)]
    pub pc_requirements: serde_json::Value,
    /// Metacritic block, when the game has a score
    #[serde(default)]
    pub metacritic: Option<Metacritic>,
    /// Category tags
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Genre tags
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Developer names
    #[serde(default)]
    pub developers: Vec<String>,
    /// Publisher names
    #[serde(default)]
    pub publishers: Vec<String>,
    /// Release date block
    #[serde(default)]
    pub release_date: ReleaseDate,
    /// Platform flags
    #[serde(default)]
    pub platforms: Platforms,
}

impl AppDetails {
    /// Category description strings.
    #[must_use]
    pub fn category_names(&self) -> Vec<&str> {
        self.categories
            .iter()
            .map(|c| c.description.as_str())
            .collect()
    }

    /// Genre description strings.
    #[must_use]
    pub fn genre_names(&self) -> Vec<&str> {
        self.genres.iter().map(|g| g.description.as_str()).collect()
    }

    /// Supported platform names.
    #[must_use]
    pub fn platform_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        if self.platforms.windows {
            names.push("Windows");
        }
        if self.platforms.mac {
            names.push("macOS");
        }
        if self.platforms.linux {
            names.push("Linux");
        }
        names
    }

    /// Store price handling free games and unreleased titles.
    #[must_use]
    pub fn formatted_price(&self) -> String {
        if self.is_free {
            return "Free".to_string();
        }

        let price = &self.price_overview.final_formatted;
        let release = &self.release_date.date;
        if price.is_empty() && release.is_empty() {
            "N/A".to_string()
        } else if release == "To be announced" || release == "Coming soon" {
            release.clone()
        } else {
            price.replace(' ', "")
        }
    }

    /// Parses the raw requirements JSON; an empty struct when Steam sent `[]`.
    #[must_use]
    pub fn requirements(&self) -> PcRequirements {
        serde_json::from_value(self.pc_requirements.clone()).unwrap_or_default()
    }
}

/// Envelope of the store review summary endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewSummaryEnvelope {
    /// 1 on success
    #[serde(default)]
    pub success: i64,
    /// Aggregated review numbers
    #[serde(default)]
    pub query_summary: ReviewSummary,
}

/// Aggregated review counts for an app.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewSummary {
    /// Blurb such as "Overwhelmingly Positive"
    #[serde(default)]
    pub review_score_desc: String,
    /// Positive review count
    #[serde(default)]
    pub total_positive: i64,
    /// Negative review count
    #[serde(default)]
    pub total_negative: i64,
    /// Total review count
    #[serde(default)]
    pub total_reviews: i64,
}

/// Store search response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Matching items, best first
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

/// One store search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    /// Steam app ID
    pub id: i64,
    /// Game name
    pub name: String,
    /// Thumbnail URL
    #[serde(default)]
    pub tiny_image: String,
    /// Price in minor units; absent for free games
    #[serde(default)]
    pub price: Option<SearchPrice>,
}

/// Price block inside a search hit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPrice {
    /// Final price in cents
    #[serde(default)]
    pub r#final: i64,
}

impl SearchItem {
    /// Final price in dollars, `None` for free or unpriced items.
    #[must_use]
    pub fn price_usd(&self) -> Option<f64> {
        self.price.as_ref().map(|p| p.r#final as f64 / 100.0)
    }
}

/// Envelope of `ResolveVanityURL`.
#[derive(Debug, Clone, Deserialize)]
pub struct VanityUrlEnvelope {
    /// Inner response
    pub response: VanityUrlResponse,
}

/// Result of resolving a vanity name.
#[derive(Debug, Clone, Deserialize)]
pub struct VanityUrlResponse {
    /// 64-bit Steam ID, present on success
    #[serde(rename = "steamid", default)]
    pub steam_id: Option<String>,
    /// 1 on success
    #[serde(default)]
    pub success: i64,
}

/// Envelope of `GetPlayerSummaries`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSummariesEnvelope {
    /// Inner response
    pub response: PlayerSummariesResponse,
}

/// Player list wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSummariesResponse {
    /// Matching players; empty when the ID is unknown
    #[serde(default)]
    pub players: Vec<PlayerSummary>,
}

/// Public profile summary of one player.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerSummary {
    /// 64-bit Steam ID
    #[serde(rename = "steamid", default)]
    pub steam_id: String,
    /// Display name
    #[serde(rename = "personaname", default)]
    pub persona_name: String,
    /// Profile URL
    #[serde(rename = "profileurl", default)]
    pub profile_url: String,
    /// Online status: 0 offline, 1 online, ...
    #[serde(rename = "personastate", default)]
    pub persona_state: i64,
    /// Account creation time (unix), hidden on private profiles
    #[serde(rename = "timecreated", default)]
    pub time_created: Option<i64>,
    /// ISO country code, when shared
    #[serde(rename = "loccountrycode", default)]
    pub country_code: Option<String>,
}

/// Envelope of `GetSteamLevel`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerLevelEnvelope {
    /// Inner response
    #[serde(default)]
    pub response: PlayerLevelResponse,
}

/// Player level wrapper.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerLevelResponse {
    /// Steam level, hidden on private profiles
    #[serde(default)]
    pub player_level: Option<i64>,
}

/// Envelope of `GetOwnedGames`.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnedGamesEnvelope {
    /// Inner response
    #[serde(default)]
    pub response: OwnedGamesResponse,
}

/// Owned games wrapper.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnedGamesResponse {
    /// Number of owned games
    #[serde(default)]
    pub game_count: i64,
}

/// Aggregated user profile assembled from several API calls.
#[derive(Debug, Clone)]
pub struct UserInfo {
    /// 64-bit Steam ID
    pub steam_id: String,
    /// Profile summary
    pub summary: PlayerSummary,
    /// Steam level; 0 when hidden
    pub level: i64,
    /// Owned game count; 0 when hidden
    pub game_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirements_tolerates_empty_array() {
        let details = AppDetails {
            pc_requirements: serde_json::json!([]),
            ..AppDetails::default()
        };
        let reqs = details.requirements();
        assert!(reqs.minimum.is_empty());
        assert!(reqs.recommended.is_empty());
    }

    #[test]
    fn test_requirements_parses_object() {
        let details = AppDetails {
            pc_requirements: serde_json::json!({
                "minimum": "<b>Minimum:</b> 8 GB RAM",
                "recommended": "<b>Recommended:</b> 16 GB RAM"
            }),
            ..AppDetails::default()
        };
        let reqs = details.requirements();
        assert!(reqs.minimum.contains("8 GB RAM"));
        assert!(reqs.recommended.contains("16 GB RAM"));
    }

    #[test]
    fn test_formatted_price() {
        let free = AppDetails {
            is_free: true,
            ..AppDetails::default()
        };
        assert_eq!(free.formatted_price(), "Free");

        let unreleased = AppDetails {
            release_date: ReleaseDate {
                date: "Coming soon".to_string(),
            },
            ..AppDetails::default()
        };
        assert_eq!(unreleased.formatted_price(), "Coming soon");

        let priced = AppDetails {
            price_overview: PriceOverview {
                final_formatted: "₹ 1,299".to_string(),
            },
            ..AppDetails::default()
        };
        assert_eq!(priced.formatted_price(), "₹1,299");

        assert_eq!(AppDetails::default().formatted_price(), "N/A");
    }

    #[test]
    fn test_deal_deserializes_with_null_app_id() {
        let deal: CheapSharkDeal = serde_json::from_str(
            r#"{"title":"Some Bundle","dealID":"abc","salePrice":"4.99",
                "normalPrice":"19.99","steamAppID":null}"#,
        )
        .expect("deal should parse");
        assert_eq!(deal.deal_id, "abc");
        assert!(deal.steam_app_id.is_none());
        assert!(deal.steam_rating.is_none());
    }

    #[test]
    fn test_search_item_price() {
        let item: SearchItem = serde_json::from_str(
            r#"{"id":440,"name":"Team Fortress 2","tiny_image":"","price":{"final":499}}"#,
        )
        .expect("item should parse");
        assert_eq!(item.price_usd(), Some(4.99));

        let free: SearchItem =
            serde_json::from_str(r#"{"id":570,"name":"Dota 2"}"#).expect("item should parse");
        assert_eq!(free.price_usd(), None);
    }
}
