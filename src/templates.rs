//! HTML message formatting for Telegram.
//!
//! Regex patterns are compiled through `lazy-regex`, validated at compile
//! time and initialized on first use, matching the rest of the codebase.

use crate::steam::types::{AppDetails, CheapSharkDeal, ReviewSummary, UserInfo};
use chrono::DateTime;
use std::fmt::Write as _;

/// Match `<br>` and `<br/>` tags
static RE_BR: lazy_regex::Lazy<regex::Regex> = lazy_regex::lazy_regex!(r"(?i)<br\s*/?>");
/// Match opening `<li>` tags
static RE_LI_OPEN: lazy_regex::Lazy<regex::Regex> = lazy_regex::lazy_regex!(r"(?i)<li[^>]*>");
/// Match `<strong>` open tags (mapped to Telegram `<b>`)
static RE_STRONG_OPEN: lazy_regex::Lazy<regex::Regex> =
    lazy_regex::lazy_regex!(r"(?i)<strong[^>]*>");
/// Match `</strong>` close tags
static RE_STRONG_CLOSE: lazy_regex::Lazy<regex::Regex> =
    lazy_regex::lazy_regex!(r"(?i)</strong[^>]*>");
/// Match structural tags Telegram does not render
static RE_STRIP: lazy_regex::Lazy<regex::Regex> =
    lazy_regex::lazy_regex!(r"(?i)</?(ul|p|div|span|font)[^>]*>|</li[^>]*>");
/// Match heading tags
static RE_HEADING: lazy_regex::Lazy<regex::Regex> =
    lazy_regex::lazy_regex!(r"(?i)</?h[1-6][^>]*>");
/// Match the "Minimum:" / "Recommended:" headers Steam embeds in the blob
static RE_REQ_HEADER: lazy_regex::Lazy<regex::Regex> =
    lazy_regex::lazy_regex!(r"(?i)<b>\s*(Minimum|Recommended):?\s*</b>|(Minimum|Recommended):");
/// Collapse blank-line runs
static RE_MULTI_NEWLINE: lazy_regex::Lazy<regex::Regex> = lazy_regex::lazy_regex!(r"\n\s*\n");

/// Truncates `text` to at most `limit` characters, appending an ellipsis when
/// something was cut. Splits on a char boundary, never mid-codepoint.
#[must_use]
pub fn truncate_description(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{cut}...")
}

/// Strips a Steam requirements HTML blob down to Telegram-renderable text.
#[must_use]
pub fn clean_requirements(raw: &str) -> String {
    let mut text = RE_BR.replace_all(raw, "\n").into_owned();
    text = RE_LI_OPEN.replace_all(&text, "\n• ").into_owned();
    text = RE_STRONG_OPEN.replace_all(&text, "<b>").into_owned();
    text = RE_STRONG_CLOSE.replace_all(&text, "</b>").into_owned();
    text = RE_STRIP.replace_all(&text, "").into_owned();
    text = RE_HEADING.replace_all(&text, "\n").into_owned();
    text = RE_REQ_HEADER.replace_all(&text, "").into_owned();
    text = RE_MULTI_NEWLINE.replace_all(&text, "\n").into_owned();
    text.trim().to_string()
}

/// Renders the channel announcement / inline summary for a deal or search
/// hit. `sale_price` empty means no discount line, as with search results.
#[must_use]
pub fn format_summary(
    title: &str,
    normal_price: &str,
    sale_price: &str,
    store_price: &str,
    rating: Option<&str>,
    description: &str,
    image_url: &str,
) -> String {
    let mut msg = String::with_capacity(512);
    let _ = writeln!(msg, "🎮 <b>{}</b>", html_escape::encode_text(title));

    if !sale_price.is_empty() {
        let _ = writeln!(
            msg,
            "💸 <b>Price:</b> <code>${sale_price} (was ${normal_price})</code> / <code>{store_price}</code>"
        );
    } else if !normal_price.is_empty() {
        let _ = writeln!(
            msg,
            "💸 <b>Price:</b> <code>${normal_price}</code> / <code>{store_price}</code>"
        );
    } else {
        let _ = writeln!(msg, "💸 <b>Price:</b> <code>{store_price}</code>");
    }

    if let Some(rating) = rating.filter(|r| !r.is_empty()) {
        let _ = writeln!(msg, "⭐ <b>Steam Rating:</b> <code>{rating}</code>");
    }

    // Zero-width link smuggles the header image into the message preview.
    if !image_url.is_empty() {
        let _ = writeln!(msg, "<a href='{image_url}'>&#xad;</a>");
    }
    let _ = write!(
        msg,
        "<i>{}</i>",
        html_escape::encode_text(&truncate_description(
            description,
            crate::config::DESCRIPTION_LIMIT
        ))
    );

    msg
}

/// Summary text for a deal announcement, enriched with store details when
/// the deal maps to a Steam app.
#[must_use]
pub fn format_deal(deal: &CheapSharkDeal, details: Option<&AppDetails>) -> String {
    let (store_price, description, image) = match details {
        Some(d) => (
            d.formatted_price(),
            d.short_description.clone(),
            d.header_image.clone(),
        ),
        None => ("N/A".to_string(), String::new(), String::new()),
    };
    format_summary(
        &deal.title,
        &deal.normal_price,
        &deal.sale_price,
        &store_price,
        deal.steam_rating.as_deref(),
        &description,
        &image,
    )
}

/// Detail view body: tags, genres, scores and credits.
#[must_use]
pub fn format_details(details: &AppDetails) -> String {
    let mut msg = String::with_capacity(512);
    let _ = write!(
        msg,
        "🎮 <b>{} - Details</b>\n\n",
        html_escape::encode_text(&details.name)
    );

    let categories = details.category_names();
    if !categories.is_empty() {
        let _ = write!(msg, "🏷️ <b>Tags:</b> {}\n\n", categories.join(", "));
    }

    let genres = details.genre_names();
    if !genres.is_empty() {
        let _ = write!(msg, "🎯 <b>Genres:</b> {}\n\n", genres.join(", "));
    }

    if let Some(score) = details.metacritic.as_ref().map(|m| m.score).filter(|s| *s > 0) {
        let _ = write!(msg, "🎖️ <b>Metacritic:</b> {score}/100\n\n");
    }

    let platforms = details.platform_names();
    if !platforms.is_empty() {
        let _ = writeln!(msg, "🖥️ <b>Platforms:</b> {}", platforms.join(", "));
    }

    if !details.developers.is_empty() {
        let _ = writeln!(
            msg,
            "👨‍💻 <b>Developers:</b> {}",
            html_escape::encode_text(&details.developers.join(", "))
        );
    }

    if !details.publishers.is_empty() {
        let _ = writeln!(
            msg,
            "🏢 <b>Publishers:</b> {}",
            html_escape::encode_text(&details.publishers.join(", "))
        );
    }

    if !details.release_date.date.is_empty() {
        let _ = writeln!(msg, "📅 <b>Release Date:</b> {}", details.release_date.date);
    }

    let _ = write!(msg, "💸 <b>Price:</b> <code>{}</code>", details.formatted_price());

    msg
}

/// Requirements view body.
#[must_use]
pub fn format_requirements(title: &str, minimum: &str, recommended: &str) -> String {
    let mut msg = String::with_capacity(512);
    let _ = write!(
        msg,
        "🎮 <b>{} - Requirements</b>\n\n",
        html_escape::encode_text(title)
    );

    if !minimum.is_empty() {
        let _ = write!(
            msg,
            "💻 <b>Minimum Requirements:</b>\n{}\n\n",
            clean_requirements(minimum)
        );
    }

    if !recommended.is_empty() {
        let _ = writeln!(
            msg,
            "🚀 <b>Recommended Requirements:</b>\n{}",
            clean_requirements(recommended)
        );
    }

    if minimum.is_empty() && recommended.is_empty() {
        msg.push_str("No requirements information available.");
    }

    msg
}

/// Extended info view body: the review score breakdown.
#[must_use]
pub fn format_extended_info(title: &str, reviews: &ReviewSummary) -> String {
    let mut msg = String::with_capacity(256);
    let _ = write!(
        msg,
        "🎮 <b>{} - Reviews</b>\n\n",
        html_escape::encode_text(title)
    );

    if reviews.total_reviews == 0 {
        msg.push_str("No review data available.");
        return msg;
    }

    if !reviews.review_score_desc.is_empty() {
        let _ = writeln!(msg, "📊 <b>Verdict:</b> {}", reviews.review_score_desc);
    }
    let _ = write!(
        msg,
        "👍 {} | 👎 {} (Total: {})",
        reviews.total_positive, reviews.total_negative, reviews.total_reviews
    );

    msg
}

/// User profile view body.
#[must_use]
pub fn format_user(info: &UserInfo) -> String {
    let mut msg = String::with_capacity(512);
    let _ = write!(
        msg,
        "👤 <b>{}</b>\n\n",
        html_escape::encode_text(&info.summary.persona_name)
    );
    let _ = writeln!(msg, "🆔 <b>Steam ID:</b> <code>{}</code>", info.steam_id);
    let _ = writeln!(msg, "🏅 <b>Level:</b> {}", info.level);
    let _ = writeln!(msg, "🕹️ <b>Games Owned:</b> {}", info.game_count);

    let status = match info.summary.persona_state {
        0 => "Offline",
        1 => "Online",
        2 => "Busy",
        3 => "Away",
        4 => "Snooze",
        5 => "Looking to trade",
        6 => "Looking to play",
        _ => "Unknown",
    };
    let _ = writeln!(msg, "💡 <b>Status:</b> {status}");

    if let Some(country) = info.summary.country_code.as_deref() {
        let _ = writeln!(msg, "🌍 <b>Country:</b> {country}");
    }

    if let Some(created) = info
        .summary
        .time_created
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
    {
        let _ = writeln!(
            msg,
            "📅 <b>Member Since:</b> {}",
            created.format("%d %B %Y")
        );
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steam::types::PlayerSummary;

    #[test]
    fn test_truncate_description() {
        assert_eq!(truncate_description("short", 10), "short");
        assert_eq!(truncate_description("0123456789abc", 10), "0123456789...");
        // Multibyte input must not split a codepoint.
        let cut = truncate_description("日本語のテキスト", 3);
        assert_eq!(cut, "日本語...");
    }

    #[test]
    fn test_clean_requirements() {
        let raw = "<strong>Minimum:</strong><br><ul class=\"bb_ul\">\
                   <li>OS: Windows 10<br></li><li>RAM: 8 GB</li></ul>";
        let cleaned = clean_requirements(raw);
        assert!(cleaned.contains("• OS: Windows 10"));
        assert!(cleaned.contains("• RAM: 8 GB"));
        assert!(!cleaned.contains("<ul"));
        assert!(!cleaned.contains("<li"));
        assert!(!cleaned.to_lowercase().contains("minimum"));
    }

    #[test]
    fn test_format_summary_with_and_without_sale() {
        let with_sale = format_summary("Portal 2", "9.99", "1.99", "₹99", None, "Великолепно", "");
        assert!(with_sale.contains("$1.99 (was $9.99)"));

        let no_sale = format_summary("Portal 2", "9.99", "", "₹99", Some("Very Positive"), "", "");
        assert!(no_sale.contains("<code>$9.99</code>"));
        assert!(no_sale.contains("Very Positive"));
    }

    #[test]
    fn test_format_summary_escapes_html_in_title() {
        let msg = format_summary("<script>x</script>", "1", "", "₹1", None, "a < b", "");
        assert!(!msg.contains("<script>"));
        assert!(msg.contains("&lt;script&gt;"));
        assert!(msg.contains("a &lt; b"));
    }

    #[test]
    fn test_format_requirements_fallback() {
        let msg = format_requirements("Dota 2", "", "");
        assert!(msg.contains("No requirements information available."));
    }

    #[test]
    fn test_format_user_includes_profile_fields() {
        let info = UserInfo {
            steam_id: "7656119".to_string(),
            summary: PlayerSummary {
                persona_name: "gaben".to_string(),
                persona_state: 1,
                country_code: Some("US".to_string()),
                time_created: Some(1_063_407_600),
                ..PlayerSummary::default()
            },
            level: 12,
            game_count: 300,
        };
        let msg = format_user(&info);
        assert!(msg.contains("gaben"));
        assert!(msg.contains("Online"));
        assert!(msg.contains("US"));
        assert!(msg.contains("2003"));
        assert!(msg.contains("300"));
    }
}
