use async_trait::async_trait;

use crate::Result;

/// Reply channel bound to one inbound message.
///
/// Implementations deliver `text` into the originating conversation, threaded
/// to the originating message where the messenger supports it.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn reply(&self, text: &str) -> Result<()>;
}
