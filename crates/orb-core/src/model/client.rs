use async_trait::async_trait;

use super::types::CompletionOutcome;

/// Text-completion backend used by the dispatcher.
///
/// `complete` never fails: every transport or protocol problem is folded into
/// `CompletionOutcome::Failure`. One call is at most one network request.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> CompletionOutcome;
}
