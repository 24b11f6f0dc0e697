use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    allowlist::AllowList,
    classify::{classify, Classification},
    domain::{ConversationId, SelfIdentity},
    messaging::{port::ReplySink, types::InboundMessage},
    model::{
        client::CompletionClient,
        types::{CompletionOutcome, FailureReason},
    },
    utils::preview,
};

pub const ALLOWED_REPLY: &str =
    "Hello everyone! I'm now allowed to chat in this group. Ask me anything!";
pub const ALREADY_ALLOWED_REPLY: &str = "I am already allowed to chat in this group.";
pub const UNALLOWED_REPLY: &str =
    "Okay, I will no longer chat in this group unless re-allowed with /allow.";
pub const NOT_ALLOWED_REPLY: &str = "I am not currently allowed to chat in this group.";
pub const STORE_FAILED_REPLY: &str =
    "Sorry, I couldn't confirm the allow-list change was saved. Send the command again in a moment.";

const LOG_PREVIEW_CHARS: usize = 50;

/// What the dispatcher did with one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Handled {
    Ignored,
    Command { reply: &'static str },
    Completion(CompletionOutcome),
}

/// Per-event orchestrator: classify, act, reply.
///
/// The allow-list is the only state kept between events. It sits behind a
/// mutex because the transport may run different chats concurrently; the lock
/// is never held across a completion call.
pub struct MessageDispatcher {
    me: SelfIdentity,
    allow: Mutex<AllowList>,
    completion: Arc<dyn CompletionClient>,
}

impl MessageDispatcher {
    pub fn new(me: SelfIdentity, allow: AllowList, completion: Arc<dyn CompletionClient>) -> Self {
        Self {
            me,
            allow: Mutex::new(allow),
            completion,
        }
    }

    pub fn identity(&self) -> &SelfIdentity {
        &self.me
    }

    pub async fn is_allowed(&self, id: ConversationId) -> bool {
        self.allow.lock().await.contains(id)
    }

    /// Handle one inbound message. Never fails: every problem ends up as a
    /// fallback reply or a log line.
    pub async fn handle(&self, msg: &InboundMessage, sink: &dyn ReplySink) -> Handled {
        let chat = msg.conversation_id;
        let label = msg.conversation_kind.label();

        let decision = {
            let mut allow = self.allow.lock().await;
            allow.reconcile().await;
            classify(msg, allow.chats(), &self.me)
        };

        match decision {
            Classification::Ignore => {
                tracing::debug!(chat = %chat, "[{label}:{chat}] ignoring message");
                Handled::Ignored
            }
            Classification::AllowCommand => {
                tracing::info!(chat = %chat, "[{label}:{chat}] /allow");
                let reply = self.allow_chat(chat).await;
                send(sink, chat, reply).await;
                Handled::Command { reply }
            }
            Classification::UnallowCommand => {
                tracing::info!(chat = %chat, "[{label}:{chat}] /unallow");
                let reply = self.unallow_chat(chat).await;
                send(sink, chat, reply).await;
                Handled::Command { reply }
            }
            Classification::Respond(prompt) => {
                tracing::info!(
                    chat = %chat,
                    "[{label}:{chat}] Received message: {}",
                    preview(&prompt, LOG_PREVIEW_CHARS)
                );
                let outcome = match self.completion.complete(&prompt).await {
                    CompletionOutcome::Success(text) if text.trim().is_empty() => {
                        tracing::warn!(chat = %chat, "completion returned empty text");
                        CompletionOutcome::Failure(FailureReason::MalformedResponse)
                    }
                    other => other,
                };
                if let CompletionOutcome::Failure(reason) = &outcome {
                    tracing::warn!(chat = %chat, %reason, "completion failed, sending fallback");
                }

                let text = outcome.reply_text();
                send(sink, chat, text).await;
                tracing::info!(
                    chat = %chat,
                    "[{chat}] Sent AI response: {}",
                    preview(text, LOG_PREVIEW_CHARS)
                );
                Handled::Completion(outcome)
            }
        }
    }

    // The lock is held across check + save so commands apply in arrival order.
    async fn allow_chat(&self, chat: ConversationId) -> &'static str {
        let mut allow = self.allow.lock().await;
        match allow.add(chat).await {
            Ok(true) => {
                tracing::info!(chat = %chat, "allowed chat");
                ALLOWED_REPLY
            }
            Ok(false) => {
                tracing::info!(chat = %chat, "chat already allowed");
                ALREADY_ALLOWED_REPLY
            }
            Err(e) => {
                tracing::error!(chat = %chat, error = %e, "failed to persist /allow");
                STORE_FAILED_REPLY
            }
        }
    }

    async fn unallow_chat(&self, chat: ConversationId) -> &'static str {
        let mut allow = self.allow.lock().await;
        match allow.remove(chat).await {
            Ok(true) => {
                tracing::info!(chat = %chat, "unallowed chat");
                UNALLOWED_REPLY
            }
            Ok(false) => {
                tracing::info!(chat = %chat, "chat already not allowed");
                NOT_ALLOWED_REPLY
            }
            Err(e) => {
                tracing::error!(chat = %chat, error = %e, "failed to persist /unallow");
                STORE_FAILED_REPLY
            }
        }
    }
}

async fn send(sink: &dyn ReplySink, chat: ConversationId, text: &str) {
    if let Err(e) = sink.reply(text).await {
        tracing::error!(chat = %chat, error = %e, "failed to send reply");
    }
}
