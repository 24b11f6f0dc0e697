//! Authorization policy: decides what to do with one inbound message.

use crate::{
    allowlist::AllowSet, domain::SelfIdentity, messaging::types::InboundMessage,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Ignore,
    AllowCommand,
    UnallowCommand,
    Respond(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Allow,
    Unallow,
}

/// Classify `msg` against the current allow-list. First match wins:
///
/// 1. our own messages are ignored
/// 2. `/allow` and 3. `/unallow` (trimmed, case-insensitive)
/// 4. allow-listed conversations get a response
/// 5. elsewhere, only replies to one of our messages get a response
/// 6. everything else is ignored
pub fn classify(msg: &InboundMessage, allow: &AllowSet, me: &SelfIdentity) -> Classification {
    if msg.is_from_self {
        return Classification::Ignore;
    }

    let text = msg.text.trim();
    match parse_command(text, me.username.as_deref()) {
        Some(Command::Allow) => return Classification::AllowCommand,
        Some(Command::Unallow) => return Classification::UnallowCommand,
        None => {}
    }

    if allow.contains(&msg.conversation_id) {
        return Classification::Respond(text.to_string());
    }

    // An unresolved reply target (None) never matches.
    if msg.is_reply && msg.replied_to_sender_id == Some(me.user_id) {
        return Classification::Respond(text.to_string());
    }

    Classification::Ignore
}

// Accepts `/allow` and the group form `/allow@<our username>`.
fn parse_command(text: &str, own_username: Option<&str>) -> Option<Command> {
    let lower = text.to_lowercase();
    let (name, target) = match lower.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (lower.as_str(), None),
    };

    if let Some(target) = target {
        let ours = own_username.map(|u| u.trim_start_matches('@').to_lowercase());
        if ours.as_deref() != Some(target) {
            return None;
        }
    }

    match name {
        "/allow" => Some(Command::Allow),
        "/unallow" => Some(Command::Unallow),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConversationId, ConversationKind, UserId};

    const BOT: UserId = UserId(777);
    const ALICE: UserId = UserId(1);
    const C1: ConversationId = ConversationId(-1001);

    fn me() -> SelfIdentity {
        SelfIdentity {
            user_id: BOT,
            username: Some("orb_relay_bot".to_string()),
        }
    }

    fn group_msg(text: &str) -> InboundMessage {
        InboundMessage::new(
            ALICE,
            C1,
            ConversationKind::Group {
                title: "Test group".to_string(),
            },
            text,
        )
    }

    fn allowed() -> AllowSet {
        [C1].into_iter().collect()
    }

    #[test]
    fn own_messages_are_always_ignored() {
        let cases = [
            group_msg("/allow").from_self(),
            group_msg("/unallow").from_self(),
            group_msg("hello").from_self(),
            group_msg("hello").replying_to(Some(BOT)).from_self(),
        ];
        for msg in &cases {
            assert_eq!(classify(msg, &allowed(), &me()), Classification::Ignore);
            assert_eq!(
                classify(msg, &AllowSet::new(), &me()),
                Classification::Ignore
            );
        }
    }

    #[test]
    fn commands_are_trimmed_and_case_insensitive() {
        let none = AllowSet::new();
        assert_eq!(
            classify(&group_msg("  /ALLOW \n"), &none, &me()),
            Classification::AllowCommand
        );
        assert_eq!(
            classify(&group_msg("/UnAllow"), &allowed(), &me()),
            Classification::UnallowCommand
        );
    }

    #[test]
    fn commands_win_over_allow_list_membership() {
        assert_eq!(
            classify(&group_msg("/allow"), &allowed(), &me()),
            Classification::AllowCommand
        );
    }

    #[test]
    fn commands_addressed_to_this_bot_are_recognized() {
        let none = AllowSet::new();
        assert_eq!(
            classify(&group_msg("/allow@Orb_Relay_Bot"), &none, &me()),
            Classification::AllowCommand
        );
        assert_eq!(
            classify(&group_msg("/unallow@orb_relay_bot"), &none, &me()),
            Classification::UnallowCommand
        );
    }

    #[test]
    fn commands_addressed_to_another_bot_are_not_commands() {
        assert_eq!(
            classify(&group_msg("/allow@some_other_bot"), &AllowSet::new(), &me()),
            Classification::Ignore
        );
        assert_eq!(
            classify(&group_msg("/allow@some_other_bot"), &allowed(), &me()),
            Classification::Respond("/allow@some_other_bot".to_string())
        );
    }

    #[test]
    fn command_with_arguments_is_not_a_command() {
        assert_eq!(
            classify(&group_msg("/allow please"), &AllowSet::new(), &me()),
            Classification::Ignore
        );
    }

    #[test]
    fn allowed_conversation_gets_trimmed_prompt() {
        assert_eq!(
            classify(&group_msg("  what is rust?  "), &allowed(), &me()),
            Classification::Respond("what is rust?".to_string())
        );
    }

    #[test]
    fn reply_to_bot_is_answered_outside_allow_list() {
        let msg = group_msg("and then?").replying_to(Some(BOT));
        assert_eq!(
            classify(&msg, &AllowSet::new(), &me()),
            Classification::Respond("and then?".to_string())
        );
    }

    #[test]
    fn non_reply_outside_allow_list_is_ignored() {
        assert_eq!(
            classify(&group_msg("hello"), &AllowSet::new(), &me()),
            Classification::Ignore
        );
    }

    #[test]
    fn reply_to_someone_else_outside_allow_list_is_ignored() {
        let msg = group_msg("agreed").replying_to(Some(UserId(2)));
        assert_eq!(
            classify(&msg, &AllowSet::new(), &me()),
            Classification::Ignore
        );
    }

    #[test]
    fn unresolved_reply_target_is_ignored() {
        let msg = group_msg("agreed").replying_to(None);
        assert_eq!(
            classify(&msg, &AllowSet::new(), &me()),
            Classification::Ignore
        );
    }

    #[test]
    fn bot_without_username_only_accepts_bare_commands() {
        let anon = SelfIdentity {
            user_id: BOT,
            username: None,
        };
        assert_eq!(
            classify(&group_msg("/allow"), &AllowSet::new(), &anon),
            Classification::AllowCommand
        );
        assert_eq!(
            classify(&group_msg("/allow@orb_relay_bot"), &AllowSet::new(), &anon),
            Classification::Ignore
        );
    }
}
