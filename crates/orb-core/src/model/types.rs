/// Why a completion produced no text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// Credential absent or left at the placeholder; no request was made.
    ConfigMissing,
    /// Connection error or timeout.
    NetworkError,
    /// Non-2xx HTTP status.
    BadStatus,
    /// 2xx, but no generated text where it was expected.
    MalformedResponse,
}

impl FailureReason {
    /// Fixed user-visible apology for this failure.
    pub fn fallback_text(self) -> &'static str {
        match self {
            FailureReason::ConfigMissing => {
                "Sorry, my AI capabilities are not configured. Please set the OPENROUTER_API_KEY."
            }
            FailureReason::NetworkError | FailureReason::BadStatus => {
                "Sorry, I couldn't get a response from the AI at the moment due to an API error."
            }
            FailureReason::MalformedResponse => {
                "Sorry, I received an unexpected response from the AI."
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::ConfigMissing => "config_missing",
            FailureReason::NetworkError => "network_error",
            FailureReason::BadStatus => "bad_status",
            FailureReason::MalformedResponse => "malformed_response",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionOutcome {
    Success(String),
    Failure(FailureReason),
}

impl CompletionOutcome {
    /// Text to send back to the chat: the completion, or the matching apology.
    pub fn reply_text(&self) -> &str {
        match self {
            CompletionOutcome::Success(text) => text,
            CompletionOutcome::Failure(reason) => reason.fallback_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_failure_has_a_non_empty_fallback() {
        for r in [
            FailureReason::ConfigMissing,
            FailureReason::NetworkError,
            FailureReason::BadStatus,
            FailureReason::MalformedResponse,
        ] {
            assert!(r.fallback_text().starts_with("Sorry"));
        }
    }

    #[test]
    fn reply_text_prefers_completion() {
        let ok = CompletionOutcome::Success("hi there".to_string());
        assert_eq!(ok.reply_text(), "hi there");

        let bad = CompletionOutcome::Failure(FailureReason::MalformedResponse);
        assert_eq!(
            bad.reply_text(),
            "Sorry, I received an unexpected response from the AI."
        );
    }
}
