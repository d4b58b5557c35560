//! Configuration validation.
//!
//! Checks `confab.toml` against the known schema, flags unknown or
//! misspelled fields, and reports the UAT posture (shipped sandbox
//! credentials, signature verification off) so operators see at startup
//! what the deployment is running with.

use std::{collections::HashMap, path::Path};

use secrecy::ExposeSecret;

use crate::schema::{ConfabConfig, SANDBOX_KEY_PREFIX, VIBER_TOKEN_PLACEHOLDER};

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
    /// Category: "syntax", "unknown-field", "type-error", "security",
    /// "placeholder"
    pub category: &'static str,
    /// Dotted path, e.g. "viber.stop_keyword"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
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
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Expected shape of the configuration. The schema is flat enough that
/// structs and scalars cover it.
enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

/// Build the schema map mirroring every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    Struct(HashMap::from([
        (
            "server",
            Struct(HashMap::from([("bind", Leaf), ("port", Leaf)])),
        ),
        (
            "viber",
            Struct(HashMap::from([
                ("auth_token", Leaf),
                ("api_url", Leaf),
                ("sender_name", Leaf),
                ("stop_keyword", Leaf),
                ("verify_signature", Leaf),
            ])),
        ),
        (
            "downstream",
            Struct(HashMap::from([
                ("base_url", Leaf),
                ("timeout_secs", Leaf),
                ("customer_api_key", Leaf),
                ("billing_api_key", Leaf),
                ("chatlog_api_key", Leaf),
            ])),
        ),
        ("dashboard", Struct(HashMap::from([("token", Leaf)]))),
        ("monitor", Struct(HashMap::from([("log_capacity", Leaf)]))),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

/// Edit distance between two strings, two-row DP.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut cur = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        cur[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let substitute = prev[j] + usize::from(ca != cb);
            cur[j + 1] = substitute.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b_chars.len()]
}

/// Closest known key to `needle` within `max_distance` edits, if any.
/// Ties go to the earliest candidate.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&candidate| (candidate, levenshtein(needle, candidate)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(candidate, _)| candidate)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = if let Some(p) = path {
        Some(p.to_path_buf())
    } else {
        crate::loader::find_config_file()
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Info,
                "file-ref",
                "",
                "no config file found; using defaults",
            )],
            config_path: None,
        };
    };

    match std::fs::read_to_string(actual_path) {
        Ok(content) => {
            let mut result = validate_toml_str(&content);
            result.config_path = Some(actual_path.clone());
            result
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: Some(actual_path.clone()),
        },
    }
}

/// Validate a TOML string without file-system side effects (useful for
/// tests and the `check-config` subcommand).
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax: parse raw TOML
    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("TOML syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    // 2. Unknown fields: walk the TOML tree against KnownKeys
    let schema = build_schema_map();
    check_unknown_fields(&toml_value, &schema, "", &mut diagnostics);

    // 3. Type check: attempt full deserialization
    match toml::from_str::<ConfabConfig>(toml_str) {
        Ok(config) => check_semantic_warnings(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Walk the TOML value tree against the schema tree and flag unknown keys.
fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (toml::Value::Table(table), KnownKeys::Struct(fields)) = (value, schema) else {
        // Leaf or type mismatch; stop recursion (type errors caught later).
        return;
    };

    let known_keys: Vec<&str> = fields.keys().copied().collect();
    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Some(child_schema) = fields.get(key.as_str()) {
            check_unknown_fields(child_value, child_schema, &path, diagnostics);
        } else {
            let level = if prefix.is_empty() {
                "at top level "
            } else {
                ""
            };
            let msg = match suggest(key, &known_keys, 3) {
                Some(s) => format!("unknown field {level}(did you mean \"{s}\"?)"),
                None => format!("unknown field {level}"),
            };
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "unknown-field",
                path,
                msg.trim(),
            ));
        }
    }
}

/// Run semantic checks on a successfully parsed config.
fn check_semantic_warnings(config: &ConfabConfig, diagnostics: &mut Vec<Diagnostic>) {
    let is_localhost = config.server.bind == "127.0.0.1"
        || config.server.bind == "localhost"
        || config.server.bind == "::1";

    if config.viber.auth_token.expose_secret() == VIBER_TOKEN_PLACEHOLDER {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "placeholder",
            "viber.auth_token",
            "auth token is still the placeholder; Viber will reject outbound sends",
        ));
    }

    if !config.viber.verify_signature && !is_localhost {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "security",
            "viber.verify_signature",
            format!(
                "webhook signature verification is off while binding to {}",
                config.server.bind
            ),
        ));
    }

    let sandbox_keys: &[(&str, &str)] = &[
        (
            "downstream.customer_api_key",
            config.downstream.customer_api_key.expose_secret(),
        ),
        (
            "downstream.billing_api_key",
            config.downstream.billing_api_key.expose_secret(),
        ),
        (
            "downstream.chatlog_api_key",
            config.downstream.chatlog_api_key.expose_secret(),
        ),
        ("dashboard.token", config.dashboard.token.expose_secret()),
    ];
    for (path, value) in sandbox_keys {
        if value.starts_with(SANDBOX_KEY_PREFIX) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "placeholder",
                *path,
                "using the shipped sandbox credential",
            ));
        }
    }

    if config.viber.stop_keyword.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "security",
            "viber.stop_keyword",
            "stop keyword is empty; users cannot end an agent chat themselves",
        ));
    }

    if config.downstream.timeout_secs == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "security",
            "downstream.timeout_secs",
            "timeout is 0; every submit call will fail immediately",
        ));
    }

    if config.monitor.log_capacity == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Info,
            "security",
            "monitor.log_capacity",
            "log capacity is 0; request capture is disabled",
        ));
    }

    if config.server.port == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Info,
            "security",
            "server.port",
            "port is 0; a random port will be assigned at startup",
        ));
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
