//! `courier doctor`: config validation, storage and credential audit.
//!
//! Prints a structured report with `[ok]`, `[warn]`, `[fail]`, `[skip]` or
//! `[info]` per item and exits non-zero when any check fails.

use std::path::{Path, PathBuf};

use {
    anyhow::Result,
    courier_config::{CourierConfig, Diagnostic, Severity, TransportMode},
    courier_routing::{RoutingStore, SqliteStore},
};

use crate::settings::{self, Overrides};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Skip,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Skip => DIM,
            Self::Info => CYAN,
        }
    }
}

impl From<Severity> for Status {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Fail,
            Severity::Warning => Self::Warn,
            Severity::Info => Self::Info,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }

    fn push_diagnostic(&mut self, d: &Diagnostic) {
        let message = if d.path.is_empty() {
            d.message.clone()
        } else {
            format!("{}: {}", d.path, d.message)
        };
        self.push(d.severity.into(), message);
    }

    fn count(&self, status: Status) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }
}

// ── Printing ────────────────────────────────────────────────────────────────

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
        }
        errors += section.count(Status::Fail);
        warnings += section.count(Status::Warn);
        eprintln!();
    }

    (errors, warnings)
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub async fn handle_doctor(
    explicit: Option<&Path>,
    data_dir: Option<&Path>,
    overrides: &Overrides,
) -> Result<()> {
    eprintln!("{BOLD}courier doctor{RESET}");
    eprintln!("{BOLD}=============={RESET}\n");

    let config_path = explicit
        .map(Path::to_path_buf)
        .or_else(courier_config::find_config_file);

    let mut sections = vec![check_config_file(config_path.as_deref())];

    match settings::load(explicit, overrides) {
        Ok(config) => {
            sections.push(check_settings(&config));
            sections.push(check_auto_reply(&config));
            sections.push(check_storage(&config, data_dir).await);
        },
        Err(e) => {
            let mut section = Section::new("Settings");
            section.push(Status::Fail, format!("cannot load configuration: {e:#}"));
            sections.push(section);
        },
    }

    let (errors, warnings) = print_report(&sections);

    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

// ── 1. Config file ──────────────────────────────────────────────────────────

fn check_config_file(path: Option<&Path>) -> Section {
    let Some(path) = path else {
        let mut section = Section::new("Config (none)");
        section.push(
            Status::Info,
            "no courier.{toml,yaml,json} found, using defaults and environment",
        );
        return section;
    };

    let mut section = Section::new(format!("Config ({})", path.display()));
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            section.push(Status::Fail, format!("cannot read file: {e}"));
            return section;
        },
    };

    if path.extension().and_then(|e| e.to_str()) != Some("toml") {
        section.push(Status::Skip, "structural checks only run on TOML files");
        return section;
    }

    check_toml(&mut section, &raw);
    section
}

fn check_toml(section: &mut Section, raw: &str) {
    let result = courier_config::validate_toml_str(raw);

    let syntax: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.category == "syntax")
        .collect();
    if !syntax.is_empty() {
        for d in syntax {
            section.push(Status::Fail, d.message.clone());
        }
        return;
    }
    section.push(Status::Ok, "TOML syntax valid");

    let unknown: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.category == "unknown-field")
        .collect();
    if unknown.is_empty() {
        section.push(Status::Ok, "All fields recognized");
    } else {
        for d in unknown {
            section.push_diagnostic(d);
        }
    }

    let type_errors: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.category == "type-error")
        .collect();
    if type_errors.is_empty() {
        section.push(Status::Ok, "No type errors");
    } else {
        for d in type_errors {
            section.push_diagnostic(d);
        }
    }
}

// ── 2. Effective settings ───────────────────────────────────────────────────

fn check_settings(config: &CourierConfig) -> Section {
    let mut section = Section::new("Settings (file + environment)");

    let result = courier_config::validate(config);
    for d in result
        .diagnostics
        .iter()
        .filter(|d| d.category != "auto-reply")
    {
        section.push_diagnostic(d);
    }

    if config.telegram.has_token() {
        section.push(Status::Ok, "Bot token set");
    }
    if let Some(id) = config.admin.id.filter(|id| *id != 0) {
        section.push(Status::Ok, format!("Administrator: {id}"));
    }

    match settings::effective_mode(config) {
        TransportMode::Webhook => {
            section.push(
                Status::Info,
                format!(
                    "Delivery: webhook on {}:{}",
                    config.server.bind, config.server.port
                ),
            );
            if config.telegram.webhook_secret.is_none() {
                section.push(
                    Status::Warn,
                    "telegram.webhook_secret not set, anyone who learns the URL can post updates",
                );
            }
        },
        TransportMode::Polling | TransportMode::Auto => {
            section.push(Status::Info, "Delivery: long polling");
        },
    }

    section
}

// ── 3. Auto-reply ───────────────────────────────────────────────────────────

fn check_auto_reply(config: &CourierConfig) -> Section {
    let mut section = Section::new("Auto-reply");

    let result = courier_config::validate(config);
    let diagnostics: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.category == "auto-reply")
        .collect();

    if config.auto_reply.api_key().is_some() {
        section.push(
            Status::Ok,
            format!(
                "API key set, model {} (timeout {}s, replies capped at {} chars)",
                config.auto_reply.model,
                config.auto_reply.timeout_secs,
                config.auto_reply.max_reply_chars
            ),
        );
    }
    for d in diagnostics {
        section.push_diagnostic(d);
    }

    section
}

// ── 4. Storage ──────────────────────────────────────────────────────────────

async fn check_storage(config: &CourierConfig, data_dir: Option<&Path>) -> Section {
    let mut section = Section::new("Storage");

    let Some(db_path) = settings::database_path(config, data_dir) else {
        section.push(
            Status::Warn,
            "storage.path is :memory:, routing state is lost on restart",
        );
        return section;
    };

    let dir = db_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    if dir.is_dir() {
        check_writable(&mut section, &dir);
    } else {
        section.push(
            Status::Info,
            format!("{} does not exist yet (created on first run)", dir.display()),
        );
    }

    if !db_path.exists() {
        section.push(
            Status::Skip,
            format!("{} not found (created on first run)", db_path.display()),
        );
        return section;
    }

    match SqliteStore::open(&db_path).await {
        Ok(store) => match store.load().await {
            Ok(state) => {
                let availability = if state.admin_available {
                    "available"
                } else {
                    "away"
                };
                section.push(
                    Status::Ok,
                    format!(
                        "{}: {} tracked forward(s), admin {availability}",
                        db_path.display(),
                        state.forwards.len()
                    ),
                );
            },
            Err(e) => section.push(Status::Fail, format!("cannot read routing state: {e}")),
        },
        Err(e) => section.push(
            Status::Fail,
            format!("cannot open {}: {e}", db_path.display()),
        ),
    }

    section
}

fn check_writable(section: &mut Section, dir: &Path) {
    let probe = dir.join(".courier-doctor-probe");
    match std::fs::write(&probe, b"probe") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            section.push(Status::Ok, format!("{} is writable", dir.display()));
        },
        Err(e) => {
            section.push(Status::Fail, format!("{} is not writable: {e}", dir.display()));
        },
    }
}
