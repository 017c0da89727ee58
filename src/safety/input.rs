use super::config::GuardrailConfig;
use super::patterns::PatternSet;
use super::sanitize::normalize;
use super::types::{GuardrailResult, PatternKind, RiskLevel};

/// Classifies an inbound user message before any dialogue logic runs.
///
/// Dangerous patterns are checked first and fail closed; emergency patterns
/// let processing continue but route the caller to the emergency branch.
#[derive(Debug, Clone)]
pub struct InputGuardrail {
    dangerous: PatternSet,
    emergency: PatternSet,
    refusal_message: String,
    emergency_alert: String,
}

impl InputGuardrail {
    pub fn new(config: &GuardrailConfig) -> Self {
        Self {
            dangerous: PatternSet::compile(PatternKind::Dangerous, &config.dangerous_patterns),
            emergency: PatternSet::compile(PatternKind::Emergency, &config.emergency_patterns),
            refusal_message: config.refusal_message.clone(),
            emergency_alert: config.emergency_alert.clone(),
        }
    }

    pub fn check(&self, text: &str) -> GuardrailResult {
        let text = normalize(text);

        let dangerous = self.dangerous.find_matches(&text);
        if !dangerous.is_empty() {
            tracing::warn!(
                risk_level = %RiskLevel::Critical,
                matched = dangerous.len(),
                "Input guardrail blocked message"
            );
            return GuardrailResult {
                passed: false,
                risk_level: RiskLevel::Critical,
                message: Some(self.refusal_message.clone()),
                matched_patterns: dangerous,
            };
        }

        let emergency = self.emergency.find_matches(&text);
        if !emergency.is_empty() {
            tracing::warn!(
                risk_level = %RiskLevel::Emergency,
                matched = emergency.len(),
                "Input guardrail detected emergency"
            );
            return GuardrailResult {
                passed: true,
                risk_level: RiskLevel::Emergency,
                message: Some(self.emergency_alert.clone()),
                matched_patterns: emergency,
            };
        }

        GuardrailResult::safe()
    }

    pub fn is_emergency(&self, text: &str) -> bool {
        self.check(text).risk_level == RiskLevel::Emergency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guardrail() -> InputGuardrail {
        InputGuardrail::new(&GuardrailConfig::builtin())
    }

    #[test]
    fn dangerous_input_blocked() {
        let result = guardrail().check("I want to hurt myself");
        assert!(!result.passed);
        assert_eq!(result.risk_level, RiskLevel::Critical);
        assert!(result.message.is_some());
        assert!(!result.matched_patterns.is_empty());
    }

    #[test]
    fn chinese_dangerous_input_blocked() {
        let result = guardrail().check("我不想活了，想自杀");
        assert!(result.is_blocked());
    }

    #[test]
    fn emergency_input_passes_with_emergency_level() {
        let g = guardrail();
        let result = g.check("severe chest pain, can't breathe");
        assert!(result.passed);
        assert_eq!(result.risk_level, RiskLevel::Emergency);
        assert!(g.is_emergency("severe chest pain, can't breathe"));
        assert!(g.is_emergency("我爸爸突然昏迷了"));
    }

    #[test]
    fn dangerous_wins_over_emergency() {
        let g = guardrail();
        let texts = [
            "I want to kill myself, I can't breathe",
            "I overdosed because I want to end my life",
            "想自杀，现在呼吸困难",
        ];
        for text in texts {
            let result = g.check(text);
            assert!(!result.passed, "should block: {text}");
            assert_eq!(result.risk_level, RiskLevel::Critical, "should be critical: {text}");
            assert!(!g.is_emergency(text));
        }
    }

    #[test]
    fn benign_input_safe() {
        let g = guardrail();
        for text in ["I have a headache", "我发烧三天了", "mild cough since Monday"] {
            let result = g.check(text);
            assert_eq!(result, GuardrailResult::safe(), "false positive: {text}");
        }
    }

    #[test]
    fn accidental_injury_is_not_self_harm() {
        let g = guardrail();
        let result = g.check("My son cut himself on broken glass and there is heavy bleeding");
        assert!(result.passed);
        assert_eq!(result.risk_level, RiskLevel::Emergency);

        let result = g.check("She fell and it might hurt her back");
        assert_eq!(result, GuardrailResult::safe());
    }

    #[test]
    fn harm_with_stated_intent_blocked() {
        let g = guardrail();
        for text in [
            "I'm going to hurt someone",
            "I'm gonna cut myself tonight",
            "I keep cutting myself",
            "I could kill him",
        ] {
            assert!(g.check(text).is_blocked(), "should block: {text}");
        }
    }

    #[test]
    fn zero_width_evasion_still_blocked() {
        let result = guardrail().check("I want to hu\u{200B}rt my\u{200D}self");
        assert_eq!(result.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn empty_config_passes_everything() {
        let g = InputGuardrail::new(&GuardrailConfig::empty());
        assert_eq!(g.check("I want to hurt myself").risk_level, RiskLevel::Safe);
        assert!(!g.is_emergency("can't breathe"));
    }

    #[test]
    fn invalid_pattern_does_not_disable_guardrail() {
        let config = GuardrailConfig {
            dangerous_patterns: vec!["(broken".into(), "poison".into()],
            ..GuardrailConfig::empty()
        };
        let g = InputGuardrail::new(&config);
        assert!(g.check("how to poison someone").is_blocked());
    }
}
