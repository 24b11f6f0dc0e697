use std::sync::Arc;

use anyhow::Context;
use teloxide::{dispatching::Dispatcher, dptree, error_handlers::LoggingErrorHandler, prelude::*};

use orb_core::{
    allowlist::AllowList,
    config::Config,
    dispatcher::MessageDispatcher,
    domain::{SelfIdentity, UserId},
    model::client::CompletionClient,
};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<MessageDispatcher>,
}

/// Resolve our identity, load the allow-list and long-poll until Ctrl-C.
///
/// On Ctrl-C teloxide stops fetching updates and waits for in-flight handlers,
/// so a running completion or allow-list save finishes before this returns.
pub async fn run_polling(
    cfg: Arc<Config>,
    completion: Arc<dyn CompletionClient>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = bot
        .get_me()
        .await
        .context("failed to resolve bot identity (getMe)")?;
    let identity = SelfIdentity {
        user_id: UserId(me.id.0 as i64),
        username: Some(me.username().to_string()).filter(|u| !u.is_empty()),
    };
    tracing::info!(
        user_id = identity.user_id.0,
        username = identity.username.as_deref().unwrap_or("-"),
        "telegram client connected"
    );

    let allow = AllowList::load(cfg.allowed_chats_file.clone(), cfg.store_write_timeout);
    tracing::info!(count = allow.len(), "allowed chats ready");

    let state = Arc::new(AppState {
        dispatcher: Arc::new(MessageDispatcher::new(identity, allow, completion)),
    });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    tracing::info!("listening for messages");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|_upd| async {})
        .error_handler(LoggingErrorHandler::with_custom_text(
            "an error occurred in the telegram update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("bot stopped");
    Ok(())
}
