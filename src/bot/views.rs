//! View builders for interactive messages.
//!
//! Each builder is a pure function from fetched data to display text plus an
//! inline keyboard; every callback button embeds the subject and the
//! requesting user so the router can re-authorize the next press.

use super::callback::{CallbackAction, CallbackRequest};
use crate::steam::types::{AppDetails, CheapSharkDeal, ReviewSummary, UserInfo};
use crate::templates;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, UserId};

fn url_button(text: &str, url: &str) -> Option<InlineKeyboardButton> {
    reqwest::Url::parse(url)
        .ok()
        .map(|url| InlineKeyboardButton::url(text.to_string(), url))
}

fn action_button(
    text: &str,
    action: CallbackAction,
    subject: &str,
    user_id: UserId,
) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(
        text.to_string(),
        CallbackRequest::new(action, subject, user_id).encode(),
    )
}

/// Keyboard for a channel deal announcement: a single store link.
#[must_use]
pub fn deal_keyboard(app_id: Option<&str>) -> InlineKeyboardMarkup {
    let row: Vec<InlineKeyboardButton> = app_id
        .and_then(|id| {
            url_button(
                "Claim Deal",
                &format!("https://store.steampowered.com/app/{id}"),
            )
        })
        .into_iter()
        .collect();
    InlineKeyboardMarkup::new(vec![row])
}

/// Channel announcement for a deal.
#[must_use]
pub fn deal_view(
    deal: &CheapSharkDeal,
    details: Option<&AppDetails>,
) -> (String, InlineKeyboardMarkup) {
    (
        templates::format_deal(deal, details),
        deal_keyboard(deal.steam_app_id.as_deref()),
    )
}

fn store_links(app_id: &str) -> Vec<InlineKeyboardButton> {
    [
        url_button(
            "View on Steam",
            &format!("https://store.steampowered.com/app/{app_id}"),
        ),
        url_button("SteamDB", &format!("https://steamdb.info/app/{app_id}/")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Summary view: the entry point from an inline search result and the target
/// of the Back action. `usd_price` comes from the search hit when available;
/// the Back path rebuilds without it and shows only the store price.
#[must_use]
pub fn summary_view(
    app_id: &str,
    details: &AppDetails,
    usd_price: Option<f64>,
    user_id: UserId,
) -> (String, InlineKeyboardMarkup) {
    let normal_price = usd_price.map(|p| format!("{p:.2}")).unwrap_or_default();
    let text = templates::format_summary(
        &details.name,
        &normal_price,
        "",
        &details.formatted_price(),
        None,
        &details.short_description,
        &details.header_image,
    );
    (text, summary_keyboard(app_id, user_id))
}

/// Keyboard attached to summaries: store links plus the details drill-down.
#[must_use]
pub fn summary_keyboard(app_id: &str, user_id: UserId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        store_links(app_id),
        vec![action_button(
            "More details",
            CallbackAction::Details,
            app_id,
            user_id,
        )],
    ])
}

/// Detail view with drill-downs into requirements and reviews.
#[must_use]
pub fn details_view(
    app_id: &str,
    details: &AppDetails,
    user_id: UserId,
) -> (String, InlineKeyboardMarkup) {
    let keyboard = InlineKeyboardMarkup::new(vec![
        vec![
            action_button("Requirements", CallbackAction::Requirements, app_id, user_id),
            action_button("Reviews", CallbackAction::ExtendedInfo, app_id, user_id),
        ],
        vec![action_button("« Back", CallbackAction::Back, app_id, user_id)],
    ]);
    (templates::format_details(details), keyboard)
}

/// PC requirements view.
#[must_use]
pub fn requirements_view(
    app_id: &str,
    details: &AppDetails,
    user_id: UserId,
) -> (String, InlineKeyboardMarkup) {
    let reqs = details.requirements();
    let text = templates::format_requirements(&details.name, &reqs.minimum, &reqs.recommended);
    (text, back_keyboard(app_id, user_id))
}

/// Review breakdown view.
#[must_use]
pub fn extended_info_view(
    app_id: &str,
    title: &str,
    reviews: &ReviewSummary,
    user_id: UserId,
) -> (String, InlineKeyboardMarkup) {
    (
        templates::format_extended_info(title, reviews),
        back_keyboard(app_id, user_id),
    )
}

fn back_keyboard(app_id: &str, user_id: UserId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![action_button(
        "« Back",
        CallbackAction::Back,
        app_id,
        user_id,
    )]])
}

/// Steam user profile view with a refresh button.
#[must_use]
pub fn user_view(
    vanity: &str,
    info: &UserInfo,
    user_id: UserId,
) -> (String, InlineKeyboardMarkup) {
    let mut rows = Vec::new();
    if let Some(profile) = url_button("Open Profile", &info.summary.profile_url) {
        rows.push(vec![profile]);
    }
    rows.push(vec![action_button(
        "Refresh",
        CallbackAction::UserLookup,
        vanity,
        user_id,
    )]);
    (templates::format_user(info), InlineKeyboardMarkup::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steam::types::PlayerSummary;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callback_data(button: &InlineKeyboardButton) -> Option<&str> {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_summary_keyboard_mints_details_token() {
        let keyboard = summary_keyboard("620", UserId(7));
        let details_row = &keyboard.inline_keyboard[1];
        assert_eq!(callback_data(&details_row[0]), Some("details:620_7"));
    }

    #[test]
    fn test_details_view_buttons_embed_subject_and_user() {
        let details = AppDetails {
            name: "Portal 2".to_string(),
            ..AppDetails::default()
        };
        let (text, keyboard) = details_view("620", &details, UserId(7));
        assert!(text.contains("Portal 2"));

        let data: Vec<&str> = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(callback_data)
            .collect();
        assert_eq!(data, vec!["reqs:620_7", "info:620_7", "back:620_7"]);
    }

    #[test]
    fn test_deal_keyboard_without_app_id_has_no_buttons() {
        let keyboard = deal_keyboard(None);
        assert!(keyboard.inline_keyboard.iter().all(Vec::is_empty));
    }

    #[test]
    fn test_user_view_refresh_token_preserves_vanity() {
        let info = UserInfo {
            steam_id: "765".to_string(),
            summary: PlayerSummary::default(),
            level: 1,
            game_count: 2,
        };
        let (_, keyboard) = user_view("some_vanity_name", &info, UserId(9));
        let data: Vec<&str> = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(callback_data)
            .collect();
        assert_eq!(data, vec!["user:some_vanity_name_9"]);
    }
}
