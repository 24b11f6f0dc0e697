//! Telegram update handlers.
//!
//! Each text message is converted into an `InboundMessage` and handed to the
//! core dispatcher together with a reply sink bound to that message.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{Chat, Message},
};

use orb_core::{
    domain::{ConversationId, ConversationKind, SelfIdentity, UserId},
    messaging::types::InboundMessage,
};

use crate::router::AppState;
use crate::TelegramReply;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(inbound) = to_inbound(&msg, state.dispatcher.identity()) else {
        return Ok(());
    };

    let sink = TelegramReply::new(bot, inbound.conversation_id, msg.id);
    state.dispatcher.handle(&inbound, &sink).await;
    Ok(())
}

/// Convert a Bot API message; `None` for channels and messages without text.
pub fn to_inbound(msg: &Message, me: &SelfIdentity) -> Option<InboundMessage> {
    let kind = conversation_kind(&msg.chat)?;
    let text = message_text(msg.text(), msg.caption())?;

    let sender = msg.from().map(|u| UserId(u.id.0 as i64));
    // Senders of channel-forwarded or anonymous-admin messages are not resolvable.
    let reply_to = msg
        .reply_to_message()
        .map(|r| r.from().map(|u| UserId(u.id.0 as i64)));

    Some(build_inbound(
        sender,
        ConversationId(msg.chat.id.0),
        kind,
        text,
        reply_to,
        me,
    ))
}

// Media captions count as the message text.
fn message_text<'a>(text: Option<&'a str>, caption: Option<&'a str>) -> Option<&'a str> {
    text.or(caption)
}

fn conversation_kind(chat: &Chat) -> Option<ConversationKind> {
    if chat.is_private() {
        return Some(ConversationKind::Private);
    }
    let title = chat.title().unwrap_or_default().to_string();
    if chat.is_group() || chat.is_supergroup() {
        return Some(ConversationKind::Group { title });
    }
    // Channels are not conversations we take part in.
    None
}

fn build_inbound(
    sender: Option<UserId>,
    conversation_id: ConversationId,
    conversation_kind: ConversationKind,
    text: &str,
    reply_to: Option<Option<UserId>>,
    me: &SelfIdentity,
) -> InboundMessage {
    InboundMessage {
        sender_id: sender,
        conversation_id,
        conversation_kind,
        text: text.to_string(),
        is_reply: reply_to.is_some(),
        replied_to_sender_id: reply_to.flatten(),
        is_from_self: sender == Some(me.user_id),
    }
}
