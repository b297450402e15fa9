//! Periodic deal ingestion: poll, dedup, announce.
//!
//! The deal feed changes at most hourly, so a failed cycle simply waits for
//! the next tick instead of retrying. Deliveries are throttled and spaced
//! out; a deal is marked seen only after its announcement actually went
//! through, so failures are retried on the next cycle.

use super::dedup::DedupTracker;
use super::views;
use crate::config;
use crate::steam::api::SteamClient;
use crate::steam::types::CheapSharkDeal;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use tracing::{info, warn};

/// Runs the ingestion loop forever: one poll immediately, then one per
/// [`config::DEALS_POLL_INTERVAL_SECS`].
pub async fn deals_loop(
    bot: Bot,
    channel: ChatId,
    client: Arc<SteamClient>,
    tracker: Arc<DedupTracker>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(config::DEALS_POLL_INTERVAL_SECS));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        announce_new_deals(&bot, channel, &client, &tracker).await;
    }
}

/// One ingestion cycle. Upstream failure means "no new data this cycle" and
/// leaves all state untouched.
async fn announce_new_deals(
    bot: &Bot,
    channel: ChatId,
    client: &SteamClient,
    tracker: &DedupTracker,
) {
    info!("Checking for deals...");
    let deals = match client.fetch_deals().await {
        Ok(deals) => deals,
        Err(err) => {
            warn!("Failed to fetch deals: {}", err);
            return;
        }
    };
    if deals.is_empty() {
        return;
    }

    // First successful poll: the current feed is backlog, not news.
    if !tracker.is_initialized().await {
        let recorded = tracker
            .initialize(deals.into_iter().map(|deal| deal.deal_id))
            .await;
        info!("Initialized seen-deals tracker with {} entries", recorded);
        return;
    }

    let removed = tracker.cleanup_if_needed().await;
    if removed > 0 {
        info!(
            "Cleaned up {} old tracker entries, {} remaining",
            removed,
            tracker.len().await
        );
    }

    for deal in deals {
        if tracker.contains(&deal.deal_id).await {
            continue;
        }
        announce_deal(bot, channel, client, tracker, deal).await;
        tokio::time::sleep(Duration::from_secs(config::DEAL_SEND_THROTTLE_SECS)).await;
    }
}

async fn announce_deal(
    bot: &Bot,
    channel: ChatId,
    client: &SteamClient,
    tracker: &DedupTracker,
    deal: CheapSharkDeal,
) {
    // Enrichment is best-effort: a bundle without an app ID, or a failed
    // detail fetch, still gets announced from the feed data alone.
    let details = match deal.steam_app_id.as_deref() {
        Some(app_id) => match client.app_details(app_id).await {
            Ok(details) => Some(details),
            Err(err) => {
                warn!("No details for app {}: {}", app_id, err);
                None
            }
        },
        None => None,
    };

    let (text, keyboard) = views::deal_view(&deal, details.as_ref());
    match bot
        .send_message(channel, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await
    {
        Ok(_) => {
            info!("Announced deal: {}", deal.title);
            tracker.mark(&deal.deal_id).await;
        }
        // Not marked seen: eligible again next cycle.
        Err(err) => warn!("Failed to announce {:?}: {}", deal.title, err),
    }
}
