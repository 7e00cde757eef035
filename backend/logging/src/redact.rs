//! Log Redaction
//!
//! Scrubs Discord bot tokens, authorization headers and token-bearing
//! webhook/interaction URLs from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static AUTH_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(Bot|Bearer)\s+[A-Za-z0-9\-\._~+/]{20,}=*").expect("auth header pattern"));

static BOT_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[MNO][A-Za-z\d_-]{23,27}\.[A-Za-z\d_-]{6}\.[A-Za-z\d_-]{27,40}\b").expect("bot token pattern")
});

/// `/webhooks/{app}/{token}` and `/interactions/{id}/{token}` path segments.
static TOKEN_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(webhooks|interactions)/(\d+)/[A-Za-z0-9_\-\.]+").expect("token path pattern")
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = AUTH_HEADER_RE.replace_all(input, "$1 [REDACTED_TOKEN]");
    let redacted = BOT_TOKEN_RE.replace_all(&redacted, "[REDACTED_TOKEN]");
    TOKEN_PATH_RE
        .replace_all(&redacted, "/$1/$2/[REDACTED_TOKEN]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_headers() {
        let clean = redact_sensitive_data("Authorization: Bot abc.DEF-ghi_123.jkl-MNO_456");
        assert_eq!(clean, "Authorization: Bot [REDACTED_TOKEN]");
        let clean = redact_sensitive_data("Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9");
        assert!(!clean.contains("eyJ"));
    }

    #[test]
    fn test_bare_bot_token() {
        let token = format!("M{}.{}.{}", "T".repeat(25), "G1b2c3", "x".repeat(30));
        let clean = redact_sensitive_data(&format!("login failed for {token}"));
        assert_eq!(clean, "login failed for [REDACTED_TOKEN]");
    }

    #[test]
    fn test_interaction_urls() {
        let raw = "error sending request for url (https://discord.com/api/v10/interactions/111/aW50ZXJhY3Rpb24.tok/callback)";
        let clean = redact_sensitive_data(raw);
        assert!(clean.contains("/interactions/111/[REDACTED_TOKEN]/callback"));
        assert!(!clean.contains("aW50"));

        let clean = redact_sensitive_data("PATCH /webhooks/999/secret-token/messages/@original");
        assert_eq!(clean, "PATCH /webhooks/999/[REDACTED_TOKEN]/messages/@original");
    }

    #[test]
    fn test_plain_text_untouched() {
        let raw = "Bot is connected; group utility injected with 3 commands";
        assert_eq!(redact_sensitive_data(raw), raw);
    }
}
