//! Guardrail configuration: pattern lists, rewrite rules and message templates.
//!
//! Built once at process start and handed to the guardrail constructors.
//! A missing or unreadable file falls back to an empty-pattern configuration
//! (fail-open on absence); a matched dangerous pattern still fails closed.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::SafetyError;

/// Builtin configuration shipped with the crate.
const BUILTIN_CONFIG: &str = include_str!("../../resources/guardrails.json");

pub const DEFAULT_DISCLAIMER_MARKER: &str = "⚠️ Disclaimer";

pub const DEFAULT_DISCLAIMER: &str = "⚠️ Disclaimer: this information is for reference only \
     and cannot replace diagnosis or treatment by a qualified doctor.";

pub const DEFAULT_EMERGENCY_ALERT: &str = "🚨 If symptoms are severe or life-threatening, \
     call 120 (or your local emergency number) or go to the nearest emergency department now.";

pub const DEFAULT_REFUSAL_MESSAGE: &str = "I can't help with that request. If you are thinking \
     about harming yourself or someone else, please contact emergency services right now.";

/// One ordered substitution applied by the output guardrail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRuleConfig {
    pub pattern: String,
    /// Replacement template; `${1}` style capture references allowed.
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailConfig {
    pub dangerous_patterns: Vec<String>,
    pub emergency_patterns: Vec<String>,
    pub diagnostic_patterns: Vec<String>,
    /// Topics that get the extra sensitive-topic disclaimer.
    pub sensitive_patterns: Vec<String>,
    pub rewrite_rules: Vec<RewriteRuleConfig>,
    /// Substring whose presence means a disclaimer was already appended.
    pub disclaimer_marker: String,
    pub disclaimer: String,
    pub emergency_alert: String,
    pub sensitive_disclaimer: Option<String>,
    pub refusal_message: String,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl GuardrailConfig {
    /// No patterns at all; only the message templates are populated.
    pub fn empty() -> Self {
        Self {
            dangerous_patterns: Vec::new(),
            emergency_patterns: Vec::new(),
            diagnostic_patterns: Vec::new(),
            sensitive_patterns: Vec::new(),
            rewrite_rules: Vec::new(),
            disclaimer_marker: DEFAULT_DISCLAIMER_MARKER.to_string(),
            disclaimer: DEFAULT_DISCLAIMER.to_string(),
            emergency_alert: DEFAULT_EMERGENCY_ALERT.to_string(),
            sensitive_disclaimer: None,
            refusal_message: DEFAULT_REFUSAL_MESSAGE.to_string(),
        }
    }

    /// The bilingual (Chinese/English) configuration embedded in the crate.
    pub fn builtin() -> Self {
        match Self::from_json(BUILTIN_CONFIG) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Builtin guardrail config is malformed, using empty config");
                Self::empty()
            }
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SafetyError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Strict load: any I/O or parse failure is returned.
    pub fn load(path: &Path) -> Result<Self, SafetyError> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            dangerous = config.dangerous_patterns.len(),
            emergency = config.emergency_patterns.len(),
            diagnostic = config.diagnostic_patterns.len(),
            rewrite_rules = config.rewrite_rules.len(),
            "Guardrail config loaded"
        );
        Ok(config)
    }

    /// Load from `path`, falling back to [`GuardrailConfig::empty`] when the
    /// file is missing or unusable. Never fails.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Guardrail config not found, continuing with empty pattern sets"
            );
            return Self::empty();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Guardrail config unusable, continuing with empty pattern sets"
                );
                Self::empty()
            }
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.dangerous_patterns.len()
            + self.emergency_patterns.len()
            + self.diagnostic_patterns.len()
            + self.sensitive_patterns.len()
            + self.rewrite_rules.len()
    }
}
