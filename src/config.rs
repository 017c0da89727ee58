use std::path::PathBuf;

use crate::safety::GuardrailConfig;
use crate::triage::types::DEFAULT_MAX_QUESTIONS;

/// Application-level constants
pub const APP_NAME: &str = "MediMind";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Guardrail configuration file override.
pub const ENV_GUARDRAILS: &str = "MEDIMIND_GUARDRAILS";
/// Reply language, `zh` or `en`.
pub const ENV_LANG: &str = "MEDIMIND_LANG";
pub const ENV_MAX_QUESTIONS: &str = "MEDIMIND_MAX_QUESTIONS";
/// SQLite session database path, relative to `~/MediMind/` unless absolute.
/// Sessions stay in memory when unset.
pub const ENV_SESSION_DB: &str = "MEDIMIND_SESSION_DB";

const SUPPORTED_LANGUAGES: &[&str] = &["zh", "en"];

/// Whether this is a debug build.
pub fn is_dev() -> bool {
    cfg!(debug_assertions)
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if is_dev() {
        "medimind_lib=debug,medimind=debug,warn"
    } else {
        "medimind_lib=info,medimind=info,warn"
    }
}

/// Get the application data directory
/// ~/MediMind/ on all platforms, the temp dir when no home is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Resolve a session database path; relative paths live under the data dir.
pub fn resolve_session_db(raw: &str) -> PathBuf {
    let path = PathBuf::from(raw.trim());
    if path.is_absolute() {
        path
    } else {
        app_data_dir().join(path)
    }
}

// ═══════════════════════════════════════════
// Runtime settings
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub lang: String,
    pub max_questions: u32,
    pub guardrails_path: Option<PathBuf>,
    pub session_db: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            lang: "zh".to_string(),
            max_questions: DEFAULT_MAX_QUESTIONS,
            guardrails_path: None,
            session_db: None,
        }
    }
}

impl AppSettings {
    /// Read settings from `MEDIMIND_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Invalid values are logged and
    /// replaced by defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(lang) = lookup(ENV_LANG) {
            let lang = lang.trim().to_lowercase();
            if SUPPORTED_LANGUAGES.contains(&lang.as_str()) {
                settings.lang = lang;
            } else {
                tracing::warn!(lang = %lang, "Unsupported language, using zh");
            }
        }

        if let Some(raw) = lookup(ENV_MAX_QUESTIONS) {
            match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => settings.max_questions = n,
                _ => tracing::warn!(
                    value = %raw,
                    default = DEFAULT_MAX_QUESTIONS,
                    "Invalid {ENV_MAX_QUESTIONS}, using default"
                ),
            }
        }

        settings.guardrails_path = lookup(ENV_GUARDRAILS)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        settings.session_db = lookup(ENV_SESSION_DB)
            .filter(|p| !p.trim().is_empty())
            .map(|p| resolve_session_db(&p));

        settings
    }

    /// Guardrail configuration: the override file when set (falling back to
    /// empty patterns if it cannot be read), else the builtin set.
    pub fn guardrail_config(&self) -> GuardrailConfig {
        match &self.guardrails_path {
            Some(path) => GuardrailConfig::load_or_default(path),
            None => GuardrailConfig::builtin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> AppSettings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppSettings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn app_data_dir_named_after_app() {
        assert!(app_data_dir().ends_with("MediMind"));
    }

    #[test]
    fn relative_session_db_lives_under_data_dir() {
        let settings = settings_from(&[(ENV_SESSION_DB, "triage.db")]);
        assert_eq!(settings.session_db, Some(app_data_dir().join("triage.db")));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn defaults_without_env() {
        assert_eq!(settings_from(&[]), AppSettings::default());
        assert_eq!(AppSettings::default().max_questions, 5);
    }

    #[test]
    fn reads_all_variables() {
        let settings = settings_from(&[
            (ENV_LANG, "EN"),
            (ENV_MAX_QUESTIONS, "3"),
            (ENV_GUARDRAILS, "/etc/medimind/guardrails.json"),
            (ENV_SESSION_DB, "/tmp/sessions.db"),
        ]);
        assert_eq!(settings.lang, "en");
        assert_eq!(settings.max_questions, 3);
        assert_eq!(
            settings.guardrails_path,
            Some(PathBuf::from("/etc/medimind/guardrails.json"))
        );
        assert_eq!(settings.session_db, Some(PathBuf::from("/tmp/sessions.db")));
    }

    #[test]
    fn invalid_values_fall_back() {
        let settings = settings_from(&[
            (ENV_LANG, "fr"),
            (ENV_MAX_QUESTIONS, "zero"),
            (ENV_SESSION_DB, "  "),
        ]);
        assert_eq!(settings.lang, "zh");
        assert_eq!(settings.max_questions, DEFAULT_MAX_QUESTIONS);
        assert_eq!(settings.session_db, None);

        assert_eq!(settings_from(&[(ENV_MAX_QUESTIONS, "0")]).max_questions, 5);
    }

    #[test]
    fn missing_guardrail_file_gives_empty_config() {
        let settings = settings_from(&[(ENV_GUARDRAILS, "/nonexistent/guardrails.json")]);
        assert_eq!(settings.guardrail_config().pattern_count(), 0);
        assert!(AppSettings::default().guardrail_config().pattern_count() > 0);
    }
}
