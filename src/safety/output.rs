use super::config::GuardrailConfig;
use super::patterns::PatternSet;
use super::rephrase::Rephraser;
use super::types::{GuardrailResult, PatternKind, RiskLevel};

/// Sanitizes generated text before it is shown to a user.
///
/// Diagnostic assertions are rewritten into advisory phrasing and every
/// outgoing text carries the medical disclaimer exactly once.
#[derive(Debug, Clone)]
pub struct OutputGuardrail {
    diagnostic: PatternSet,
    sensitive: PatternSet,
    rephraser: Rephraser,
    disclaimer_marker: String,
    disclaimer: String,
    emergency_alert: String,
    sensitive_disclaimer: Option<String>,
}

impl OutputGuardrail {
    pub fn new(config: &GuardrailConfig) -> Self {
        Self {
            diagnostic: PatternSet::compile(PatternKind::Diagnostic, &config.diagnostic_patterns),
            sensitive: PatternSet::compile(PatternKind::Sensitive, &config.sensitive_patterns),
            rephraser: Rephraser::compile(&config.rewrite_rules),
            disclaimer_marker: config.disclaimer_marker.clone(),
            disclaimer: config.disclaimer.clone(),
            emergency_alert: config.emergency_alert.clone(),
            sensitive_disclaimer: config
                .sensitive_disclaimer
                .clone()
                .filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn check(&self, text: &str) -> GuardrailResult {
        let matched = self.diagnostic.find_matches(text);
        if matched.is_empty() {
            return GuardrailResult::safe();
        }
        GuardrailResult {
            passed: false,
            risk_level: RiskLevel::Warning,
            message: Some("Diagnostic language detected".to_string()),
            matched_patterns: matched,
        }
    }

    pub fn rewrite(&self, text: &str) -> String {
        self.rephraser.apply(text).0
    }

    /// Whether `text` already carries the disclaimer.
    pub fn has_disclaimer(&self, text: &str) -> bool {
        let marker = self.disclaimer_marker.trim();
        let disclaimer = self.disclaimer.trim();
        (!marker.is_empty() && text.contains(marker))
            || (!disclaimer.is_empty() && text.contains(disclaimer))
    }

    /// Append the disclaimer (and the sensitive-topic note when relevant);
    /// prepend the emergency banner when `is_emergency`. Idempotent.
    pub fn add_disclaimer(&self, text: &str, is_emergency: bool) -> String {
        if self.has_disclaimer(text) {
            return text.to_string();
        }

        let mut parts: Vec<&str> = Vec::with_capacity(4);
        if is_emergency && !self.emergency_alert.trim().is_empty() {
            parts.push(self.emergency_alert.trim());
        }
        parts.push(text);
        if let Some(note) = &self.sensitive_disclaimer {
            if self.sensitive.is_match(text) {
                parts.push(note.trim());
            }
        }
        if !self.disclaimer.trim().is_empty() {
            parts.push(self.disclaimer.trim());
        }

        parts.join("\n\n")
    }

    /// Check, rewrite when needed, then always add the disclaimer.
    ///
    /// Returns the final text alongside the check result for the input
    /// text, so callers can tell whether a rewrite happened.
    pub fn process(&self, text: &str, is_emergency: bool) -> (String, GuardrailResult) {
        let result = self.check(text);

        let body = if result.passed {
            text.to_string()
        } else {
            let (rewritten, applied) = self.rephraser.apply(text);
            let residual = self.diagnostic.find_matches(&rewritten).len();
            tracing::warn!(
                risk_level = %result.risk_level,
                matched = result.matched_patterns.len(),
                rules_applied = applied,
                residual_matches = residual,
                "Output guardrail rewrote diagnostic language"
            );
            rewritten
        };

        let final_text = self.add_disclaimer(&body, is_emergency);
        tracing::debug!(
            passed = result.passed,
            is_emergency,
            "Output guardrail processed response"
        );
        (final_text, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guardrail() -> OutputGuardrail {
        OutputGuardrail::new(&GuardrailConfig::builtin())
    }

    #[test]
    fn diagnostic_output_flagged() {
        let result = guardrail().check("You have diabetes");
        assert!(!result.passed);
        assert_eq!(result.risk_level, RiskLevel::Warning);
        assert!(!result.matched_patterns.is_empty());
    }

    #[test]
    fn advisory_output_safe() {
        let g = guardrail();
        for text in [
            "Your symptoms may be worth discussing with a neurologist.",
            "建议您到呼吸内科就诊。",
            "You may have symptoms consistent with diabetes.",
            "If you have any questions, call your doctor.",
            "You have to rest for a couple of days.",
        ] {
            assert_eq!(g.check(text), GuardrailResult::safe(), "false positive: {text}");
        }
    }

    #[test]
    fn ordinary_you_have_text_left_alone() {
        let g = guardrail();
        let text = "If you have any questions, call your doctor.";
        let (processed, result) = g.process(text, false);
        assert!(result.passed);
        assert!(processed.starts_with(text));
    }

    #[test]
    fn rewrite_unchanged_without_match() {
        let g = guardrail();
        assert_eq!(g.rewrite("Drink water and rest."), "Drink water and rest.");
    }

    #[test]
    fn process_rewrites_and_appends_disclaimer() {
        let g = guardrail();
        let config = GuardrailConfig::builtin();
        let (text, result) = g.process("You have diabetes", false);

        assert!(!result.passed);
        assert_eq!(result.risk_level, RiskLevel::Warning);
        assert!(g.check(text.trim_end_matches(config.disclaimer.trim())).passed);
        assert!(!text.contains("You have diabetes"));
        assert!(text.ends_with(config.disclaimer.trim()));
        assert!(!text.starts_with(config.emergency_alert.trim()));
    }

    #[test]
    fn process_clean_text_only_gets_disclaimer() {
        let g = guardrail();
        let config = GuardrailConfig::builtin();
        let (text, result) = g.process("Please rest and monitor your temperature.", false);
        assert!(result.passed);
        assert_eq!(
            text,
            format!("Please rest and monitor your temperature.\n\n{}", config.disclaimer.trim())
        );
    }

    #[test]
    fn emergency_banner_prepended() {
        let g = guardrail();
        let config = GuardrailConfig::builtin();
        let text = g.add_disclaimer("Go to the nearest hospital.", true);
        assert!(text.starts_with(config.emergency_alert.trim()));
        assert!(text.ends_with(config.disclaimer.trim()));
    }

    #[test]
    fn disclaimer_idempotent() {
        let g = guardrail();
        for is_emergency in [false, true] {
            let once = g.add_disclaimer("Rest and hydrate.", is_emergency);
            let twice = g.add_disclaimer(&once, is_emergency);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn process_idempotent_on_own_output() {
        let g = guardrail();
        let (once, _) = g.process("You have the flu.", true);
        let (twice, _) = g.process(&once, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn sensitive_topic_gets_extra_note_before_disclaimer() {
        let g = guardrail();
        let config = GuardrailConfig::builtin();
        let note = config.sensitive_disclaimer.clone().unwrap();
        let text = g.add_disclaimer("During pregnancy some medicines are unsuitable.", false);
        assert!(text.contains(note.trim()));
        assert!(text.ends_with(config.disclaimer.trim()));
    }

    #[test]
    fn custom_marker_detected() {
        let config = GuardrailConfig {
            disclaimer: "Consult a doctor. [NMA]".into(),
            disclaimer_marker: "[NMA]".into(),
            ..GuardrailConfig::empty()
        };
        let g = OutputGuardrail::new(&config);
        let already = "Some advice. [NMA]";
        assert_eq!(g.add_disclaimer(already, true), already);
    }

    #[test]
    fn chinese_diagnosis_rewritten() {
        let (text, result) = guardrail().process("根据描述，你得了胃炎。", false);
        assert!(!result.passed);
        assert!(text.contains("你的表现可能提示胃炎"));
        assert!(!text.contains("你得了"));
    }
}
