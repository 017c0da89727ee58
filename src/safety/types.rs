use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Risk classification attached to every guardrail verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Caution,
    Warning,
    Critical,
    Emergency,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Caution => "caution",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of a single input or output check. Produced fresh per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailResult {
    /// Whether downstream processing may continue.
    pub passed: bool,
    pub risk_level: RiskLevel,
    /// User-facing message for non-safe verdicts.
    pub message: Option<String>,
    /// Literal pattern strings that matched, in declaration order.
    pub matched_patterns: Vec<String>,
}

impl GuardrailResult {
    /// A clean pass with nothing matched.
    pub fn safe() -> Self {
        Self {
            passed: true,
            risk_level: RiskLevel::Safe,
            message: None,
            matched_patterns: Vec::new(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        !self.passed && self.risk_level == RiskLevel::Critical
    }
}

/// Which purpose a pattern group serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Dangerous,
    Emergency,
    Diagnostic,
    Sensitive,
    Rewrite,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dangerous => "dangerous",
            Self::Emergency => "emergency",
            Self::Diagnostic => "diagnostic",
            Self::Sensitive => "sensitive",
            Self::Rewrite => "rewrite",
        }
    }
}

/// Guardrail configuration and compilation errors.
#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Invalid {kind} pattern '{pattern}': {reason}")]
    Config {
        kind: &'static str,
        pattern: String,
        reason: String,
    },

    #[error("Failed to read guardrail config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse guardrail config: {0}")]
    Parse(#[from] serde_json::Error),
}
