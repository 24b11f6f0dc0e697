use crate::domain::{ConversationId, ConversationKind, UserId};

/// Cross-messenger inbound text message.
///
/// Built by the transport adapter once per event; Telegram-specific fields stay
/// in the adapter.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub sender_id: Option<UserId>,
    pub conversation_id: ConversationId,
    pub conversation_kind: ConversationKind,
    pub text: String,
    pub is_reply: bool,
    /// Author of the replied-to message, when it could be resolved.
    pub replied_to_sender_id: Option<UserId>,
    pub is_from_self: bool,
}

impl InboundMessage {
    /// Plain message with no reply context.
    pub fn new(
        sender_id: UserId,
        conversation_id: ConversationId,
        conversation_kind: ConversationKind,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: Some(sender_id),
            conversation_id,
            conversation_kind,
            text: text.into(),
            is_reply: false,
            replied_to_sender_id: None,
            is_from_self: false,
        }
    }

    pub fn replying_to(mut self, sender: Option<UserId>) -> Self {
        self.is_reply = true;
        self.replied_to_sender_id = sender;
        self
    }

    pub fn from_self(mut self) -> Self {
        self.is_from_self = true;
        self
    }
}
