//! Command and inline query handlers.

use super::dedup::DedupTracker;
use super::views;
use crate::config;
use crate::fanout::fanout;
use crate::steam::api::SteamClient;
use crate::steam::types::{AppDetails, SearchItem};
use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{
    InlineQuery, InlineQueryResult, InlineQueryResultArticle, InputMessageContent,
    InputMessageContentText, ParseMode, UserId,
};
use teloxide::utils::command::BotCommands;
use tracing::warn;

/// Supported bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Greeting and usage hint
    #[command(description = "Start the bot.")]
    Start,
    /// Command list
    #[command(description = "Show available commands.")]
    Help,
    /// Steam profile lookup by vanity name
    #[command(description = "Look up a Steam user profile.")]
    User(String),
    /// Operational counters
    #[command(description = "Show cache statistics.")]
    Stats,
}

/// Extracts the sender's user ID, zero when the message has no sender.
#[must_use]
pub fn get_user_id_safe(msg: &Message) -> UserId {
    msg.from.as_ref().map_or(UserId(0), |user| user.id)
}

/// Handles `/start`.
///
/// # Errors
///
/// Returns an error when Telegram rejects the reply.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(
        msg.chat.id,
        "👋 I announce Steam deals and answer store lookups.\n\
         Use me inline: type my name and a game title in any chat.\n\
         Try /user <vanity name> for Steam profiles.",
    )
    .await?;
    Ok(())
}

/// Handles `/help`.
///
/// # Errors
///
/// Returns an error when Telegram rejects the reply.
pub async fn help(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

/// Handles `/user <vanity>`: resolves and renders a Steam profile.
///
/// # Errors
///
/// Returns an error when Telegram rejects the reply.
pub async fn user_lookup(
    bot: Bot,
    msg: Message,
    vanity: String,
    client: Arc<SteamClient>,
) -> Result<()> {
    let vanity = vanity.trim();
    if vanity.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /user <vanity name>")
            .await?;
        return Ok(());
    }

    match client.user_info(vanity).await {
        Ok(info) => {
            let (text, keyboard) = views::user_view(vanity, &info, get_user_id_safe(&msg));
            bot.send_message(msg.chat.id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard)
                .await?;
        }
        Err(err) => {
            warn!("User lookup {:?} failed: {}", vanity, err);
            bot.send_message(msg.chat.id, format!("😿 {err}")).await?;
        }
    }
    Ok(())
}

/// Handles `/stats`: cache and tracker counters.
///
/// # Errors
///
/// Returns an error when Telegram rejects the reply.
pub async fn stats(
    bot: Bot,
    msg: Message,
    client: Arc<SteamClient>,
    tracker: Arc<DedupTracker>,
) -> Result<()> {
    let text = format!(
        "📊 <b>Stats</b>\n\
         Details cache: {} entries\n\
         Seen deals: {} entries (initialized: {})",
        client.details_cache_len().await,
        tracker.len().await,
        tracker.is_initialized().await,
    );
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handles an inline query: store search, then a bounded fan-out of detail
/// fetches so a burst of five lookups does not trip Steam's rate limits.
///
/// # Errors
///
/// Returns an error when answering the inline query fails.
pub async fn handle_inline_query(
    bot: Bot,
    q: InlineQuery,
    client: Arc<SteamClient>,
) -> Result<()> {
    let term = q.query.trim().to_string();
    if term.is_empty() {
        return Ok(());
    }
    let user_id = q.from.id;

    let items = match client.search(&term).await {
        Ok(items) => items,
        Err(err) => {
            warn!("Steam search {:?} failed: {}", term, err);
            return Ok(());
        }
    };

    let fetcher = Arc::clone(&client);
    let enriched = fanout(
        items,
        config::SEARCH_FANOUT_CONCURRENCY,
        move |item: SearchItem| {
            let client = Arc::clone(&fetcher);
            async move {
                // Enrichment failure degrades to a bare search hit.
                let details = client.app_details(&item.id.to_string()).await.ok();
                Ok((item, details))
            }
        },
    )
    .await;

    let results: Vec<InlineQueryResult> = enriched
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(index, (item, details))| search_result_article(index, &item, details, user_id))
        .collect();

    bot.answer_inline_query(q.id, results)
        .cache_time(100)
        .await?;
    Ok(())
}

fn search_result_article(
    index: usize,
    item: &SearchItem,
    details: Option<AppDetails>,
    user_id: UserId,
) -> InlineQueryResult {
    let app_id = item.id.to_string();
    let details = details.unwrap_or_else(|| AppDetails {
        name: item.name.clone(),
        header_image: item.tiny_image.clone(),
        ..AppDetails::default()
    });
    let (text, keyboard) = views::summary_view(&app_id, &details, item.price_usd(), user_id);

    let description = match item.price_usd() {
        Some(price) => format!("Price: ${price:.2}"),
        None => "Free / unpriced".to_string(),
    };

    let mut article = InlineQueryResultArticle::new(
        index.to_string(),
        item.name.clone(),
        InputMessageContent::Text(InputMessageContentText::new(text).parse_mode(ParseMode::Html)),
    )
    .description(description)
    .reply_markup(keyboard);

    if let Ok(thumb) = reqwest::Url::parse(&item.tiny_image) {
        article = article.thumbnail_url(thumb);
    }

    InlineQueryResult::Article(article)
}
