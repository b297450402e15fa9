//! HTTP client for the CheapShark and Steam web APIs.
//!
//! All calls are idempotent reads. App details are served through the shared
//! [`TtlCache`], so redundant concurrent fetches are cheap and the callback
//! "back" navigation can be answered from cache without a network round trip.

use super::types::{
    AppDetails, AppDetailsEnvelope, CheapSharkDeal, OwnedGamesEnvelope, PlayerLevelEnvelope,
    PlayerSummariesEnvelope, PlayerSummary, ReviewSummary, ReviewSummaryEnvelope, SearchItem,
    SearchResponse, UserInfo, VanityUrlEnvelope,
};
use crate::cache::TtlCache;
use crate::config;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by upstream catalog and pricing APIs.
///
/// All variants are expected, transient conditions at the system boundary;
/// callers convert them to "no data this cycle" or a short user-visible
/// message, never a crash.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure (timeout, DNS, connection reset).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Upstream answered with a non-success status.
    #[error("unexpected status {status} from {endpoint}")]
    Status {
        /// Endpoint that was called.
        endpoint: &'static str,
        /// HTTP status received.
        status: StatusCode,
    },
    /// The store has no record of the requested app.
    #[error("no details found for app {0}")]
    AppNotFound(String),
    /// Reviews exist but the summary endpoint declined the request.
    #[error("reviews unavailable for app {0}")]
    ReviewsUnavailable(String),
    /// The vanity name did not resolve to a Steam ID.
    #[error("steam user not found: {0}")]
    UserNotFound(String),
    /// A Steam Web API call was attempted without an API key.
    #[error("STEAM_API_KEY is not configured")]
    MissingApiKey,
}

/// Client over CheapShark and the Steam store / web APIs.
///
/// Owns the app-details cache; constructed once at startup and shared behind
/// an `Arc`.
pub struct SteamClient {
    http: reqwest::Client,
    api_key: Option<String>,
    details_cache: TtlCache<String, AppDetails>,
}

impl SteamClient {
    /// Creates a client with a 10 second request timeout and the standard
    /// details cache sizing from [`crate::config`].
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest` error when the HTTP client cannot be
    /// built (TLS backend initialization).
    pub fn new(api_key: Option<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            api_key,
            details_cache: TtlCache::new(
                Duration::from_secs(config::DETAILS_CACHE_TTL_SECS),
                config::DETAILS_CACHE_MAX_SIZE,
                config::DETAILS_CACHE_EVICTION_BATCH,
            ),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
    ) -> Result<T, ApiError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { endpoint, status });
        }
        Ok(response.json().await?)
    }

    /// Fetches the current CheapShark deal feed (Steam store, under $30).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on network failure or a non-success status.
    pub async fn fetch_deals(&self) -> Result<Vec<CheapSharkDeal>, ApiError> {
        let url = "https://www.cheapshark.com/api/1.0/deals?storeID=1&upperPrice=30&pageSize=10";
        self.get_json("cheapshark/deals", url).await
    }

    /// Returns app details, served from cache when live.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AppNotFound`] when the store has no such app, or a
    /// transport error. Failures are never cached.
    pub async fn app_details(&self, app_id: &str) -> Result<AppDetails, ApiError> {
        self.details_cache
            .get_or_fetch(app_id.to_string(), || self.fetch_app_details(app_id))
            .await
    }

    /// Cache-only lookup of app details; `None` when absent or expired.
    pub async fn cached_app_details(&self, app_id: &str) -> Option<AppDetails> {
        self.details_cache.get(&app_id.to_string()).await
    }

    /// Number of entries currently in the details cache.
    pub async fn details_cache_len(&self) -> usize {
        self.details_cache.len().await
    }

    async fn fetch_app_details(&self, app_id: &str) -> Result<AppDetails, ApiError> {
        let url =
            format!("https://store.steampowered.com/api/appdetails?appids={app_id}&cc=in");
        let response: HashMap<String, AppDetailsEnvelope> =
            self.get_json("steam/appdetails", &url).await?;

        response
            .remove_entry_success(app_id)
            .ok_or_else(|| ApiError::AppNotFound(app_id.to_string()))
    }

    /// Fetches the review summary for an app.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ReviewsUnavailable`] when the endpoint declines, or
    /// a transport error.
    pub async fn app_reviews(&self, app_id: &str) -> Result<ReviewSummary, ApiError> {
        let url =
            format!("https://store.steampowered.com/appreviews/{app_id}?json=1&num_per_page=0");
        let envelope: ReviewSummaryEnvelope = self.get_json("steam/appreviews", &url).await?;

        if envelope.success != 1 {
            return Err(ApiError::ReviewsUnavailable(app_id.to_string()));
        }
        Ok(envelope.query_summary)
    }

    /// Searches the Steam store, returning at most
    /// [`config::MAX_SEARCH_RESULTS`] items.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on network failure or a non-success status.
    pub async fn search(&self, term: &str) -> Result<Vec<SearchItem>, ApiError> {
        let url = search_url(term);
        let mut response: SearchResponse = self.get_json("steam/storesearch", &url).await?;
        response.items.truncate(config::MAX_SEARCH_RESULTS);
        Ok(response.items)
    }

    /// Light price refresh for an already-known app: a store search by name,
    /// matched back by app ID. `None` when the search fails, misses the app,
    /// or the app is free.
    pub async fn current_price(&self, app_id: &str, name: &str) -> Option<f64> {
        let items = self.search(name).await.ok()?;
        price_for(&items, app_id)
    }

    fn api_key(&self) -> Result<&str, ApiError> {
        self.api_key.as_deref().ok_or(ApiError::MissingApiKey)
    }

    /// Resolves a profile vanity name to a 64-bit Steam ID.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UserNotFound`] when the name does not resolve,
    /// [`ApiError::MissingApiKey`] without a configured key, or a transport
    /// error.
    pub async fn resolve_vanity_url(&self, name: &str) -> Result<String, ApiError> {
        let url = format!(
            "https://api.steampowered.com/ISteamUser/ResolveVanityURL/v0001/?key={}&vanityurl={}",
            self.api_key()?,
            urlencoding::encode(name)
        );
        let envelope: VanityUrlEnvelope = self.get_json("steam/resolve_vanity", &url).await?;

        match envelope.response.steam_id {
            Some(id) if envelope.response.success == 1 => Ok(id),
            _ => Err(ApiError::UserNotFound(name.to_string())),
        }
    }

    /// Fetches the public profile summary for a Steam ID.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UserNotFound`] when the ID is unknown,
    /// [`ApiError::MissingApiKey`] without a key, or a transport error.
    pub async fn player_summary(&self, steam_id: &str) -> Result<PlayerSummary, ApiError> {
        let url = format!(
            "https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v0002/?key={}&steamids={steam_id}",
            self.api_key()?
        );
        let envelope: PlayerSummariesEnvelope =
            self.get_json("steam/player_summaries", &url).await?;

        envelope
            .response
            .players
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::UserNotFound(steam_id.to_string()))
    }

    async fn player_level(&self, steam_id: &str) -> Result<i64, ApiError> {
        let url = format!(
            "https://api.steampowered.com/IPlayerService/GetSteamLevel/v1/?key={}&steamid={steam_id}",
            self.api_key()?
        );
        let envelope: PlayerLevelEnvelope = self.get_json("steam/player_level", &url).await?;
        Ok(envelope.response.player_level.unwrap_or(0))
    }

    async fn owned_games_count(&self, steam_id: &str) -> Result<i64, ApiError> {
        let url = format!(
            "https://api.steampowered.com/IPlayerService/GetOwnedGames/v1/?key={}&steamid={steam_id}&include_played_free_games=true",
            self.api_key()?
        );
        let envelope: OwnedGamesEnvelope = self.get_json("steam/owned_games", &url).await?;
        Ok(envelope.response.game_count)
    }

    /// Fetches a complete user profile by vanity name.
    ///
    /// Level and game count degrade to 0 when hidden or unavailable; only the
    /// vanity resolution and the summary itself are required to succeed.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the user cannot be resolved or the
    /// summary fetch fails.
    pub async fn user_info(&self, name: &str) -> Result<UserInfo, ApiError> {
        let steam_id = self.resolve_vanity_url(name).await?;
        let summary = self.player_summary(&steam_id).await?;
        let level = self.player_level(&steam_id).await.unwrap_or(0);
        let game_count = self.owned_games_count(&steam_id).await.unwrap_or(0);

        Ok(UserInfo {
            steam_id,
            summary,
            level,
            game_count,
        })
    }
}

fn price_for(items: &[SearchItem], app_id: &str) -> Option<f64> {
    items
        .iter()
        .find(|item| item.id.to_string() == app_id)
        .and_then(SearchItem::price_usd)
}

fn search_url(term: &str) -> String {
    format!(
        "https://store.steampowered.com/api/storesearch/?term={}&l=english&cc=US",
        urlencoding::encode(term)
    )
}

/// Extension to pull the successful payload out of the appdetails envelope.
trait EnvelopeMap {
    fn remove_entry_success(self, app_id: &str) -> Option<AppDetails>;
}

impl EnvelopeMap for HashMap<String, AppDetailsEnvelope> {
    fn remove_entry_success(mut self, app_id: &str) -> Option<AppDetails> {
        match self.remove(app_id) {
            Some(AppDetailsEnvelope {
                success: true,
                data: Some(details),
            }) => Some(details),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_the_term() {
        assert!(search_url("half life 2").contains("term=half%20life%202"));
        assert!(search_url("héllo").contains("term=h%C3%A9llo"));
        assert!(search_url("portal").contains("term=portal&"));
    }

    #[test]
    fn test_price_refresh_matches_by_app_id() {
        let payload = r#"{"total":2,"items":[
            {"id":620,"name":"Portal 2","price":{"final":999}},
            {"id":400,"name":"Portal","price":{"final":499}}
        ]}"#;
        let response: SearchResponse = serde_json::from_str(payload).expect("should parse");

        assert_eq!(price_for(&response.items, "400"), Some(4.99));
        assert_eq!(price_for(&response.items, "620"), Some(9.99));
        // Unrelated hits never contribute a price.
        assert_eq!(price_for(&response.items, "570"), None);
    }

    #[test]
    fn test_envelope_success_extraction() {
        let payload = r#"{"440":{"success":true,"data":{"name":"Team Fortress 2"}}}"#;
        let map: HashMap<String, AppDetailsEnvelope> =
            serde_json::from_str(payload).expect("envelope should parse");
        let details = map.remove_entry_success("440").expect("success entry");
        assert_eq!(details.name, "Team Fortress 2");
    }

    #[test]
    fn test_envelope_failure_yields_none() {
        let payload = r#"{"999":{"success":false}}"#;
        let map: HashMap<String, AppDetailsEnvelope> =
            serde_json::from_str(payload).expect("envelope should parse");
        assert!(map.remove_entry_success("999").is_none());
        let empty: HashMap<String, AppDetailsEnvelope> = HashMap::new();
        assert!(empty.remove_entry_success("440").is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_reported() {
        let client = SteamClient::new(None).expect("client should build");
        let err = client
            .resolve_vanity_url("gaben")
            .await
            .expect_err("should fail without key");
        assert!(matches!(err, ApiError::MissingApiKey));
    }
}
