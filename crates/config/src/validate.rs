//! Configuration validation.
//!
//! Semantic checks decide whether the process may start at all; the TOML
//! checks additionally flag unknown or misspelled keys for `courier doctor`.

use crate::schema::{CourierConfig, TELEGRAM_MAX_MESSAGE_LEN, TRUNCATION_MARKER, TransportMode};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "missing", "invalid", "auto-reply"
    pub category: &'static str,
    /// Dotted path, e.g. "admin.id"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} [{}]: {}", self.severity, self.category, self.message)
        } else {
            write!(
                f,
                "{} [{}] {}: {}",
                self.severity, self.category, self.path, self.message
            )
        }
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Turn error diagnostics into a startup failure.
    pub fn into_result(self) -> crate::Result<Self> {
        if !self.has_errors() {
            return Ok(self);
        }
        let summary = self
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| {
                if d.path.is_empty() {
                    d.message.clone()
                } else {
                    format!("{}: {}", d.path, d.message)
                }
            })
            .collect::<Vec<_>>()
            .join("; ");
        Err(crate::Error::invalid(summary))
    }

    fn push(
        &mut self,
        severity: Severity,
        category: &'static str,
        path: &str,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

/// Check a fully-resolved config (file plus environment overrides).
#[must_use]
pub fn validate(config: &CourierConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if !config.telegram.has_token() {
        result.push(
            Severity::Error,
            "missing",
            "telegram.token",
            "bot token is not set (TELEGRAM_TOKEN)",
        );
    }

    match config.admin.id {
        None | Some(0) => result.push(
            Severity::Error,
            "missing",
            "admin.id",
            "administrator id is not set (ADMIN_ID, your numeric Telegram id)",
        ),
        Some(id) if i64::try_from(id).is_err() => result.push(
            Severity::Error,
            "invalid",
            "admin.id",
            format!("administrator id {id} is larger than any Telegram chat id"),
        ),
        Some(_) => {},
    }

    let base_url = config
        .server
        .webhook_base_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());
    match (config.telegram.mode, base_url) {
        (TransportMode::Webhook, None) => result.push(
            Severity::Error,
            "missing",
            "server.webhook_base_url",
            "webhook mode needs a public base URL (WEBHOOK_BASE_URL)",
        ),
        (_, Some(url)) if !(url.starts_with("https://") || url.starts_with("http://")) => result
            .push(
                Severity::Error,
                "invalid",
                "server.webhook_base_url",
                format!("not an http(s) URL: {url}"),
            ),
        (TransportMode::Polling, Some(_)) => result.push(
            Severity::Info,
            "invalid",
            "server.webhook_base_url",
            "ignored in polling mode",
        ),
        _ => {},
    }

    let max = config.auto_reply.max_reply_chars;
    let marker_len = TRUNCATION_MARKER.chars().count();
    if max <= marker_len {
        result.push(
            Severity::Error,
            "invalid",
            "auto_reply.max_reply_chars",
            format!("must be larger than the {marker_len}-character truncation marker"),
        );
    } else if max > TELEGRAM_MAX_MESSAGE_LEN {
        result.push(
            Severity::Warning,
            "invalid",
            "auto_reply.max_reply_chars",
            format!("exceeds Telegram's {TELEGRAM_MAX_MESSAGE_LEN}-character message limit"),
        );
    }

    if config.auto_reply.api_key().is_none() {
        result.push(
            Severity::Info,
            "auto-reply",
            "auto_reply.api_key",
            "no API key (GEMINI_API_KEY); away replies use the fixed acknowledgment",
        );
    } else {
        if !config.auto_reply.prompt_template.contains("{message}") {
            result.push(
                Severity::Warning,
                "auto-reply",
                "auto_reply.prompt_template",
                "template has no {message} placeholder; the user's text will not reach the model",
            );
        }
        if config.auto_reply.timeout_secs == 0 {
            result.push(
                Severity::Error,
                "invalid",
                "auto_reply.timeout_secs",
                "must be at least 1 second",
            );
        }
    }

    result
}

// ── Unknown-field detection ─────────────────────────────────────────────────

const SECTIONS: &[(&str, &[&str])] = &[
    ("telegram", &["token", "mode", "webhook_secret"]),
    ("admin", &["id"]),
    ("server", &["bind", "port", "webhook_base_url"]),
    ("auto_reply", &[
        "api_key",
        "model",
        "base_url",
        "timeout_secs",
        "prompt_template",
        "max_reply_chars",
    ]),
    ("storage", &["path"]),
    ("messages", &[
        "start",
        "acknowledgment",
        "closing_notice",
        "closing_notice_when_available",
        "away_notice",
        "generation_unavailable",
        "generation_failed",
        "forward_fallback",
        "admin_available",
        "admin_away",
        "availability_not_saved",
        "reply_target_missing",
        "reply_sent",
        "reply_failed",
    ]),
];

/// Validate raw TOML: syntax, unknown keys (with "did you mean" hints) and types.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut result = ValidationResult::default();

    let value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            result.push(
                Severity::Error,
                "syntax",
                "",
                format!("TOML syntax error: {e}"),
            );
            return result;
        },
    };

    if let Some(table) = value.as_table() {
        let section_names: Vec<&str> = SECTIONS.iter().map(|(name, _)| *name).collect();
        for (key, child) in table {
            let Some((_, fields)) = SECTIONS.iter().find(|(name, _)| *name == key.as_str()) else {
                result.push(
                    Severity::Error,
                    "unknown-field",
                    key,
                    unknown_message(key, &section_names, "at top level "),
                );
                continue;
            };
            let Some(child_table) = child.as_table() else {
                continue;
            };
            for child_key in child_table.keys() {
                if !fields.contains(&child_key.as_str()) {
                    result.push(
                        Severity::Error,
                        "unknown-field",
                        &format!("{key}.{child_key}"),
                        unknown_message(child_key, fields, ""),
                    );
                }
            }
        }
    }

    if let Err(e) = toml::from_str::<CourierConfig>(toml_str) {
        result.push(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        );
    }

    result
}

fn unknown_message(key: &str, candidates: &[&str], level: &str) -> String {
    let msg = match suggest(key, candidates, 3) {
        Some(s) => format!("unknown field {level}(did you mean \"{s}\"?)"),
        None => format!("unknown field {level}"),
    };
    msg.trim().to_string()
}

// ── Levenshtein distance ────────────────────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use {super::*, secrecy::Secret};

    fn startable() -> CourierConfig {
        let mut cfg = CourierConfig::default();
        cfg.telegram.token = Secret::new("1:tok".into());
        cfg.admin.id = Some(42);
        cfg
    }

    fn has(result: &ValidationResult, severity: Severity, path: &str) -> bool {
        result
            .diagnostics
            .iter()
            .any(|d| d.severity == severity && d.path == path)
    }

    #[test]
    fn defaults_are_not_startable() {
        let result = validate(&CourierConfig::default());
        assert!(has(&result, Severity::Error, "telegram.token"));
        assert!(has(&result, Severity::Error, "admin.id"));
        let err = result.into_result().unwrap_err();
        assert!(err.to_string().contains("admin.id"));
    }

    #[test]
    fn admin_id_beyond_chat_range_is_an_error() {
        let mut cfg = startable();
        cfg.admin.id = Some(u64::MAX);
        let result = validate(&cfg);
        assert!(has(&result, Severity::Error, "admin.id"));

        cfg.admin.id = Some(i64::MAX as u64);
        assert!(!validate(&cfg).has_errors());
    }

    #[test]
    fn minimal_config_is_startable() {
        let result = validate(&startable());
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert!(has(&result, Severity::Info, "auto_reply.api_key"));
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn webhook_mode_requires_base_url() {
        let mut cfg = startable();
        cfg.telegram.mode = TransportMode::Webhook;
        assert!(has(&validate(&cfg), Severity::Error, "server.webhook_base_url"));

        cfg.server.webhook_base_url = Some("https://relay.example.com".into());
        assert!(!validate(&cfg).has_errors());
    }

    #[test]
    fn base_url_must_be_http() {
        let mut cfg = startable();
        cfg.server.webhook_base_url = Some("relay.example.com".into());
        assert!(has(&validate(&cfg), Severity::Error, "server.webhook_base_url"));
    }

    #[test]
    fn reply_limit_bounds() {
        let mut cfg = startable();
        cfg.auto_reply.max_reply_chars = 10;
        assert!(has(&validate(&cfg), Severity::Error, "auto_reply.max_reply_chars"));

        cfg.auto_reply.max_reply_chars = 5000;
        let result = validate(&cfg);
        assert!(!result.has_errors());
        assert!(has(&result, Severity::Warning, "auto_reply.max_reply_chars"));
    }

    #[test]
    fn prompt_without_placeholder_warns_when_auto_reply_enabled() {
        let mut cfg = startable();
        cfg.auto_reply.api_key = Some(Secret::new("k".into()));
        cfg.auto_reply.prompt_template = "Say hi".into();
        let result = validate(&cfg);
        assert!(has(&result, Severity::Warning, "auto_reply.prompt_template"));
        assert_eq!(result.count(Severity::Error), 0);
    }

    #[test]
    fn unknown_section_gets_suggestion() {
        let result = validate_toml_str("[telegarm]\ntoken = \"x\"\n");
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field")
            .unwrap();
        assert_eq!(diag.path, "telegarm");
        assert!(diag.message.contains("did you mean \"telegram\""));
    }

    #[test]
    fn unknown_nested_key_gets_suggestion() {
        let result = validate_toml_str("[server]\nprot = 80\n");
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.path == "server.prot")
            .unwrap();
        assert!(diag.message.contains("\"port\""));
    }

    #[test]
    fn syntax_and_type_errors() {
        let result = validate_toml_str("[server\n");
        assert_eq!(result.diagnostics[0].category, "syntax");

        let result = validate_toml_str("[server]\nport = \"eighty\"\n");
        assert!(result.diagnostics.iter().any(|d| d.category == "type-error"));
    }

    #[test]
    fn levenshtein_counts_chars_not_bytes() {
        assert_eq!(levenshtein("café", "cafe"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }
}
