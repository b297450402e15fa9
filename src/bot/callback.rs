//! Callback token decoding, authorization and dispatch.
//!
//! Every interactive button carries an opaque token of the form
//! `prefix:subject_userid`. The token is the capability: it embeds the user
//! the button was minted for, and any other user pressing it gets a soft
//! "not for you" rejection. Tokens are never stored; each press is decoded
//! from scratch.

use super::views;
use crate::steam::api::{ApiError, SteamClient};
use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, InlineKeyboardMarkup, ParseMode, UserId};
use thiserror::Error;
use tracing::{debug, warn};

/// Actions a callback button can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Full detail view for an app
    Details,
    /// PC requirements view for an app
    Requirements,
    /// Review breakdown view for an app
    ExtendedInfo,
    /// Steam user profile lookup (subject is the vanity name)
    UserLookup,
    /// Return to the summary view, rebuilt from cache when possible
    Back,
}

/// Prefix table mapping wire prefixes to actions. `more_details` is a legacy
/// alias kept so buttons minted by older builds keep working; encoding always
/// uses the canonical (first-listed) prefix for an action.
const PREFIXES: &[(&str, CallbackAction)] = &[
    ("details", CallbackAction::Details),
    ("more_details", CallbackAction::Details),
    ("reqs", CallbackAction::Requirements),
    ("info", CallbackAction::ExtendedInfo),
    ("user", CallbackAction::UserLookup),
    ("back", CallbackAction::Back),
];

fn canonical_prefix(action: CallbackAction) -> &'static str {
    PREFIXES
        .iter()
        .find(|(_, a)| *a == action)
        .map_or("details", |(prefix, _)| prefix)
}

/// A decoded, typed callback request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackRequest {
    /// Requested action
    pub action: CallbackAction,
    /// Subject identifier: an app ID, or a vanity name for user lookups
    pub subject: String,
    /// User the button was minted for
    pub user_id: UserId,
}

impl CallbackRequest {
    /// Builds a request to embed into a freshly minted button.
    #[must_use]
    pub fn new(action: CallbackAction, subject: impl Into<String>, user_id: UserId) -> Self {
        Self {
            action,
            subject: subject.into(),
            user_id,
        }
    }

    /// Encodes to the wire form `prefix:subject_userid`.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}:{}_{}",
            canonical_prefix(self.action),
            self.subject,
            self.user_id
        )
    }
}

/// Decode failures for tokens with a recognized prefix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackError {
    /// Payload does not split into subject and user ID.
    #[error("malformed callback payload: {0:?}")]
    MalformedPayload(String),
    /// The embedded user ID is not numeric.
    #[error("invalid user id in callback: {0:?}")]
    InvalidUserId(String),
}

/// Decodes a raw callback token.
///
/// `Ok(None)` means the prefix is unknown: a stale or foreign button that
/// the router ignores silently.
///
/// # Errors
///
/// Returns a [`CallbackError`] when the prefix is recognized but the payload
/// is malformed.
pub fn decode(raw: &str) -> Result<Option<CallbackRequest>, CallbackError> {
    let Some((prefix, payload)) = raw.split_once(':') else {
        return Ok(None);
    };
    let Some(&(_, action)) = PREFIXES.iter().find(|(p, _)| *p == prefix) else {
        return Ok(None);
    };

    let Some((subject, user)) = payload.rsplit_once('_') else {
        return Err(CallbackError::MalformedPayload(payload.to_string()));
    };
    if subject.is_empty() {
        return Err(CallbackError::MalformedPayload(payload.to_string()));
    }
    let id: u64 = user
        .parse()
        .map_err(|_| CallbackError::InvalidUserId(user.to_string()))?;

    Ok(Some(CallbackRequest {
        action,
        subject: subject.to_string(),
        user_id: UserId(id),
    }))
}

/// A press is authorized only when the acting user is the one the button was
/// minted for; no action bypasses this check.
#[must_use]
pub fn authorized(request: &CallbackRequest, actor: UserId) -> bool {
    request.user_id == actor
}

/// Routes one callback query: decode, authorize, dispatch.
///
/// Every outcome short of an internal bug is non-fatal: undecodable and
/// unauthorized presses get a soft notice, upstream fetch failures a short
/// apology, unknown prefixes silence.
///
/// # Errors
///
/// Returns an error only for unexpected Telegram API failures while
/// delivering the response.
pub async fn handle_callback(bot: Bot, q: CallbackQuery, client: Arc<SteamClient>) -> Result<()> {
    let Some(raw) = q.data.as_deref() else {
        return Ok(());
    };

    let request = match decode(raw) {
        Ok(Some(request)) => request,
        // Unknown prefix: stale or foreign button, nothing to do.
        Ok(None) => return Ok(()),
        Err(err) => {
            debug!("Undecodable callback {:?}: {}", raw, err);
            let _ = bot
                .answer_callback_query(q.id.clone())
                .text("This button no longer works, run the search again.")
                .await;
            return Ok(());
        }
    };

    if !authorized(&request, q.from.id) {
        let _ = bot
            .answer_callback_query(q.id.clone())
            .text("This is not for you")
            .show_alert(true)
            .await;
        return Ok(());
    }

    let _ = bot
        .answer_callback_query(q.id.clone())
        .text("Fetching...")
        .await;

    match build_view(&client, &request).await {
        Ok((text, keyboard)) => deliver_view(&bot, &q, text, Some(keyboard)).await,
        Err(err) => {
            warn!("Callback {:?} for {} failed: {}", request.action, request.subject, err);
            deliver_view(
                &bot,
                &q,
                "😿 Couldn't fetch that right now, try again later.".to_string(),
                None,
            )
            .await
        }
    }
}

/// Builds the response view for an authorized request.
async fn build_view(
    client: &SteamClient,
    request: &CallbackRequest,
) -> Result<(String, InlineKeyboardMarkup), ApiError> {
    let subject = request.subject.as_str();
    let user_id = request.user_id;

    match request.action {
        CallbackAction::Details => {
            let details = client.app_details(subject).await?;
            Ok(views::details_view(subject, &details, user_id))
        }
        CallbackAction::Requirements => {
            let details = client.app_details(subject).await?;
            Ok(views::requirements_view(subject, &details, user_id))
        }
        CallbackAction::ExtendedInfo => {
            let details = client.app_details(subject).await?;
            let reviews = client.app_reviews(subject).await.unwrap_or_default();
            Ok(views::extended_info_view(subject, &details.name, &reviews, user_id))
        }
        CallbackAction::UserLookup => {
            let info = client.user_info(subject).await?;
            Ok(views::user_view(subject, &info, user_id))
        }
        // Back avoids re-running the expensive detail fetch: a cache hit
        // rebuilds the summary from cached data plus a light price refresh,
        // a miss falls through to the full fetch path.
        CallbackAction::Back => match client.cached_app_details(subject).await {
            Some(details) => {
                let price = client.current_price(subject, &details.name).await;
                Ok(views::summary_view(subject, &details, price, user_id))
            }
            None => {
                let details = client.app_details(subject).await?;
                Ok(views::summary_view(subject, &details, None, user_id))
            }
        },
    }
}

/// Edits the originating message in place, whether it came from an inline
/// result or a regular chat. Dropped silently when Telegram rejects the edit
/// (message deleted, content unchanged).
async fn deliver_view(
    bot: &Bot,
    q: &CallbackQuery,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    if let Some(inline_id) = q.inline_message_id.as_deref() {
        let mut edit = bot
            .edit_message_text_inline(inline_id, text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            edit = edit.reply_markup(keyboard);
        }
        if let Err(err) = edit.await {
            debug!("Inline edit skipped: {}", err);
        }
        return Ok(());
    }

    if let Some(message) = q.message.as_ref() {
        let mut edit = bot
            .edit_message_text(message.chat().id, message.id(), text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            edit = edit.reply_markup(keyboard);
        }
        if let Err(err) = edit.await {
            debug!("Edit skipped: {}", err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_roundtrip() {
        let request = CallbackRequest::new(CallbackAction::Details, "620", UserId(42));
        let decoded = decode(&request.encode()).expect("decode").expect("request");
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_decode_every_action() {
        for (raw, action) in [
            ("details:620_1", CallbackAction::Details),
            ("reqs:620_1", CallbackAction::Requirements),
            ("info:620_1", CallbackAction::ExtendedInfo),
            ("user:gaben_1", CallbackAction::UserLookup),
            ("back:620_1", CallbackAction::Back),
        ] {
            let decoded = decode(raw).expect("decode").expect("request");
            assert_eq!(decoded.action, action, "prefix for {raw}");
        }
    }

    #[test]
    fn test_legacy_prefix_aliases_to_details() {
        let decoded = decode("more_details:620_42").expect("decode").expect("request");
        assert_eq!(decoded.action, CallbackAction::Details);
        assert_eq!(decoded.subject, "620");
        assert_eq!(decoded.user_id, UserId(42));

        // Encoding always uses the canonical prefix, not the alias.
        assert!(decoded.encode().starts_with("details:"));
    }

    #[test]
    fn test_unknown_prefix_is_silently_ignored() {
        assert_eq!(decode("emoji_party:620_42"), Ok(None));
        assert_eq!(decode("no-delimiter"), Ok(None));
        assert_eq!(decode(""), Ok(None));
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(matches!(
            decode("details:620"),
            Err(CallbackError::MalformedPayload(_))
        ));
        assert!(matches!(
            decode("details:_42"),
            Err(CallbackError::MalformedPayload(_))
        ));
        assert!(matches!(
            decode("details:620_notanumber"),
            Err(CallbackError::InvalidUserId(_))
        ));
    }

    #[test]
    fn test_mismatched_actor_is_never_authorized() {
        // Valid subject and action are irrelevant; only the minted user may
        // press the button.
        for (raw, actor, allowed) in [
            ("details:620_42", 42, true),
            ("details:620_42", 43, false),
            ("reqs:620_42", 7, false),
            ("info:620_42", 42, true),
            ("user:some_vanity_name_42", 41, false),
            ("back:620_1", u64::MAX, false),
        ] {
            let request = decode(raw).expect("decode").expect("request");
            assert_eq!(
                authorized(&request, UserId(actor)),
                allowed,
                "actor {actor} pressing {raw}"
            );
        }
    }

    #[test]
    fn test_subject_may_contain_underscores() {
        // Vanity names can carry underscores; the user ID is the last field.
        let decoded = decode("user:some_vanity_name_42").expect("decode").expect("request");
        assert_eq!(decoded.subject, "some_vanity_name");
        assert_eq!(decoded.user_id, UserId(42));
    }

    #[test]
    fn test_encode_fits_telegram_callback_limit() {
        // Telegram caps callback data at 64 bytes.
        let request = CallbackRequest::new(
            CallbackAction::Requirements,
            "2147483647",
            UserId(u64::MAX),
        );
        assert!(request.encode().len() <= 64);
    }
}
