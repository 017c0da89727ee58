use regex::Regex;

use super::config::RewriteRuleConfig;
use super::patterns::compile_pattern;
use super::types::PatternKind;

/// A compiled substitution turning assertive diagnostic phrasing into
/// advisory phrasing.
#[derive(Debug, Clone)]
struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

/// Ordered rewrite rules. Rules apply once each, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Rephraser {
    rules: Vec<RewriteRule>,
}

impl Rephraser {
    /// Compile the configured rules; invalid ones are logged and skipped.
    pub fn compile(rules: &[RewriteRuleConfig]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| match compile_pattern(PatternKind::Rewrite, &rule.pattern) {
                Ok(pattern) => Some(RewriteRule {
                    pattern,
                    replacement: rule.replacement.clone(),
                }),
                Err(e) => {
                    tracing::warn!(error = %e, "Rewrite rule rejected, skipping");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule once over the text. Returns the rewritten text and
    /// how many rules changed it.
    pub fn apply(&self, text: &str) -> (String, usize) {
        let mut result = text.to_string();
        let mut applied = 0;

        for rule in &self.rules {
            if !rule.pattern.is_match(&result) {
                continue;
            }
            result = rule
                .pattern
                .replace_all(&result, rule.replacement.as_str())
                .into_owned();
            applied += 1;
        }

        (result, applied)
    }
}
