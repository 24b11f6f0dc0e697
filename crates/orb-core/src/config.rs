use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Value shipped in sample configs; never sent as a real credential.
pub const OPENROUTER_KEY_PLACEHOLDER: &str = "YOUR_OPENROUTER_API_KEY";

pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_OPENROUTER_MODEL: &str = "mistralai/mixtral-8x7b-instruct-v0.1";
pub const DEFAULT_ALLOWED_CHATS_FILE: &str = "allowed_chats.json";

/// Typed configuration, read from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,

    // Completion service
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub openrouter_url: String,
    pub completion_timeout: Duration,

    // Allow-list persistence
    pub allowed_chats_file: PathBuf,
    pub store_write_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (env, map, ...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;

        // Missing key is not fatal: each completion reports ConfigMissing instead.
        let openrouter_api_key = get("OPENROUTER_KEY");
        let openrouter_model =
            get("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string());
        let openrouter_url =
            get("OPENROUTER_URL").unwrap_or_else(|| DEFAULT_OPENROUTER_URL.to_string());
        let completion_timeout =
            Duration::from_millis(parse_u64(get("COMPLETION_TIMEOUT_MS")).unwrap_or(30_000));

        let allowed_chats_file = PathBuf::from(
            get("ALLOWED_CHATS_FILE").unwrap_or_else(|| DEFAULT_ALLOWED_CHATS_FILE.to_string()),
        );
        let store_write_timeout =
            Duration::from_millis(parse_u64(get("STORE_WRITE_TIMEOUT_MS")).unwrap_or(5_000));

        Ok(Self {
            telegram_bot_token,
            openrouter_api_key,
            openrouter_model,
            openrouter_url,
            completion_timeout,
            allowed_chats_file,
            store_write_timeout,
        })
    }

    /// True when a usable completion credential is configured.
    pub fn completion_configured(&self) -> bool {
        is_usable_api_key(self.openrouter_api_key.as_deref())
    }
}

/// A key is usable when present, non-blank and not the sample placeholder.
pub fn is_usable_api_key(key: Option<&str>) -> bool {
    match key.map(str::trim) {
        None | Some("") => false,
        Some(k) => k != OPENROUTER_KEY_PLACEHOLDER,
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn cfg_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn token_is_required() {
        let err = cfg_from(&[("OPENROUTER_KEY", "sk-1")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = cfg_from(&[("TELEGRAM_BOT_TOKEN", "   ")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn defaults_are_applied() {
        let cfg = cfg_from(&[("TELEGRAM_BOT_TOKEN", "123:abc")]).unwrap();
        assert_eq!(cfg.openrouter_model, DEFAULT_OPENROUTER_MODEL);
        assert_eq!(cfg.openrouter_url, DEFAULT_OPENROUTER_URL);
        assert_eq!(cfg.completion_timeout, Duration::from_secs(30));
        assert_eq!(cfg.store_write_timeout, Duration::from_secs(5));
        assert_eq!(cfg.allowed_chats_file, PathBuf::from("allowed_chats.json"));
        assert!(cfg.openrouter_api_key.is_none());
        assert!(!cfg.completion_configured());
    }

    #[test]
    fn overrides_are_read() {
        let cfg = cfg_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("OPENROUTER_KEY", "sk-or-v1-xyz"),
            ("OPENROUTER_MODEL", "openai/gpt-4o-mini"),
            ("COMPLETION_TIMEOUT_MS", "1500"),
            ("ALLOWED_CHATS_FILE", "/var/lib/orb/chats.json"),
        ])
        .unwrap();
        assert_eq!(cfg.openrouter_model, "openai/gpt-4o-mini");
        assert_eq!(cfg.completion_timeout, Duration::from_millis(1500));
        assert_eq!(
            cfg.allowed_chats_file,
            PathBuf::from("/var/lib/orb/chats.json")
        );
        assert!(cfg.completion_configured());
    }

    #[test]
    fn placeholder_key_is_not_usable() {
        let cfg = cfg_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("OPENROUTER_KEY", OPENROUTER_KEY_PLACEHOLDER),
        ])
        .unwrap();
        assert!(!cfg.completion_configured());
        assert!(!is_usable_api_key(Some("  ")));
        assert!(is_usable_api_key(Some("sk-real")));
    }

    #[test]
    fn unparsable_timeout_falls_back_to_default() {
        let cfg = cfg_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("STORE_WRITE_TIMEOUT_MS", "soon"),
        ])
        .unwrap();
        assert_eq!(cfg.store_write_timeout, Duration::from_secs(5));
    }
}
