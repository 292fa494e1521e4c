//! Telegram update handlers.
//!
//! Each message is translated into a transport-agnostic `Inbound`, matched to
//! its conversation context, and handed to the core command interpreter.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::error;

use kcb_core::{
    domain::{ChatId, UserId},
    messaging::types::{Inbound, InboundPayload, PhotoRef},
    session::ConversationKey,
};

use crate::router::AppState;

/// `None` for message kinds the gallery does not care about (stickers, voice, ...).
pub fn inbound_from_message(msg: &Message) -> Option<Inbound> {
    let payload = if let Some(text) = msg.text() {
        InboundPayload::Text(text.to_string())
    } else if let Some(photos) = msg.photo() {
        InboundPayload::Photo(
            photos
                .iter()
                .map(|p| PhotoRef {
                    file_id: p.file.id.clone(),
                    width: p.width,
                    height: p.height,
                })
                .collect(),
        )
    } else {
        return None;
    };

    Some(Inbound {
        chat_id: ChatId(msg.chat.id.0),
        sender: msg.from().map(|u| UserId(u.id.0 as i64)),
        payload,
    })
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(inbound) = inbound_from_message(&msg) else {
        return Ok(());
    };

    let key = ConversationKey {
        chat_id: inbound.chat_id,
        user_id: inbound.sender.unwrap_or(UserId(0)),
    };

    // One event at a time: the registry lock also serializes gallery mutations.
    // It stays held across the photo download, so the idle sweep in the binary
    // waits behind a slow upload instead of evicting the session mid-event.
    let mut sessions = state.sessions.lock().await;
    let session = sessions.session_mut(key);
    if let Err(e) = state
        .interpreter
        .handle(session, &inbound, state.channel.as_ref())
        .await
    {
        error!(chat = inbound.chat_id.0, error = %e, "Failed to deliver reply");
    }

    Ok(())
}
