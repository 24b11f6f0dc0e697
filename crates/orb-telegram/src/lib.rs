//! Telegram adapter (teloxide).
//!
//! This crate turns Bot API updates into `orb-core` inbound messages and
//! implements the `ReplySink` port over `sendMessage`.

use async_trait::async_trait;

use teloxide::prelude::*;

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use orb_core::{domain::ConversationId, errors::Error, messaging::port::ReplySink, Result};

/// Telegram hard limit for a single text message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Reply sink bound to one incoming Telegram message.
#[derive(Clone)]
pub struct TelegramReply {
    bot: Bot,
    chat_id: ConversationId,
    reply_to: teloxide::types::MessageId,
}

impl TelegramReply {
    pub fn new(bot: Bot, chat_id: ConversationId, reply_to: teloxide::types::MessageId) -> Self {
        Self {
            bot,
            chat_id,
            reply_to,
        }
    }

    fn tg_chat(&self) -> teloxide::types::ChatId {
        teloxide::types::ChatId(self.chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl ReplySink for TelegramReply {
    async fn reply(&self, text: &str) -> Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            self.with_retry(|| {
                self.bot
                    .send_message(self.tg_chat(), chunk.clone())
                    .reply_to_message_id(self.reply_to)
                    .allow_sending_without_reply(true)
            })
            .await?;
        }
        Ok(())
    }
}

/// Split `text` into pieces of at most `max_chars` characters, preferring
/// newline boundaries.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > max_chars {
            // Hard-split a single oversized line.
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                let piece: String = piece.iter().collect();
                if piece.chars().count() == max_chars {
                    chunks.push(piece);
                } else {
                    current_len = piece.chars().count();
                    current = piece;
                }
            }
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
