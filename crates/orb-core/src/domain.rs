use serde::{Deserialize, Serialize};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric). Serialized as a bare integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of chat a message arrived in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConversationKind {
    Private,
    Group { title: String },
    Channel { title: String },
}

impl ConversationKind {
    pub fn has_title(&self) -> bool {
        self.title().is_some()
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            ConversationKind::Private => None,
            ConversationKind::Group { title } | ConversationKind::Channel { title } => {
                Some(title.as_str())
            }
        }
    }

    /// Human-readable label used in log lines.
    pub fn label(&self) -> &str {
        self.title().unwrap_or("Private Chat")
    }
}

/// The bot's own account, resolved once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelfIdentity {
    pub user_id: UserId,
    pub username: Option<String>,
}
