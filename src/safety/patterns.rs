use regex::{Regex, RegexBuilder};

use super::types::{PatternKind, SafetyError};

/// A compiled pattern that remembers the literal it was built from.
#[derive(Debug, Clone)]
struct CompiledPattern {
    source: String,
    regex: Regex,
}

/// Ordered, immutable group of case-insensitive patterns serving one purpose.
///
/// Invalid entries are logged and skipped at compile time; the rest of the
/// group stays usable. The skipped entries are kept as errors so callers can
/// surface configuration problems without failing startup.
#[derive(Debug, Clone)]
pub struct PatternSet {
    kind: PatternKind,
    patterns: Vec<CompiledPattern>,
    rejected: Vec<String>,
}

/// Compile a single pattern case-insensitively.
pub fn compile_pattern(kind: PatternKind, pattern: &str) -> Result<Regex, SafetyError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| SafetyError::Config {
            kind: kind.as_str(),
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

impl PatternSet {
    /// Compile every pattern, skipping (and logging) the invalid ones.
    pub fn compile<S: AsRef<str>>(kind: PatternKind, patterns: &[S]) -> Self {
        let mut compiled = Vec::with_capacity(patterns.len());
        let mut rejected = Vec::new();

        for pattern in patterns {
            let source = pattern.as_ref();
            match compile_pattern(kind, source) {
                Ok(regex) => compiled.push(CompiledPattern {
                    source: source.to_string(),
                    regex,
                }),
                Err(e) => {
                    tracing::warn!(
                        kind = kind.as_str(),
                        error = %e,
                        "Guardrail pattern rejected, skipping"
                    );
                    rejected.push(source.to_string());
                }
            }
        }

        tracing::debug!(
            kind = kind.as_str(),
            compiled = compiled.len(),
            rejected = rejected.len(),
            "Pattern set compiled"
        );

        Self {
            kind,
            patterns: compiled,
            rejected,
        }
    }

    /// An empty set that never matches.
    pub fn empty(kind: PatternKind) -> Self {
        Self {
            kind,
            patterns: Vec::new(),
            rejected: Vec::new(),
        }
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Literal strings of the patterns that match `text`, in declaration order.
    pub fn find_matches(&self, text: &str) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|p| p.regex.is_match(text))
            .map(|p| p.source.clone())
            .collect()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.regex.is_match(text))
    }

    /// Source strings that failed to compile.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
