//! Triage service: the agent plus the output guardrail.
//!
//! Every reply leaving the service has been checked for diagnostic language,
//! rewritten when needed, and carries the disclaimer. Stored history keeps
//! the agent's raw reply.

use crate::config::AppSettings;
use crate::safety::{GuardrailConfig, OutputGuardrail};
use crate::triage::{
    messages, SessionStore, TriageAgent, TriageContext, TriageError, TriageOutcome, Urgency,
};

/// A new session and the greeting to show for it.
#[derive(Debug, Clone)]
pub struct SessionStart {
    pub context: TriageContext,
    pub greeting: String,
}

pub struct TriageService<S: SessionStore> {
    agent: TriageAgent<S>,
    output: OutputGuardrail,
}

impl<S: SessionStore> TriageService<S> {
    pub fn new(config: &GuardrailConfig, store: S) -> Self {
        Self {
            agent: TriageAgent::new(config, store),
            output: OutputGuardrail::new(config),
        }
    }

    /// Build from runtime settings; guardrail config is loaded once here.
    pub fn from_settings(settings: &AppSettings, store: S) -> Self {
        let config = settings.guardrail_config();
        Self {
            agent: TriageAgent::new(&config, store)
                .with_language(settings.lang.clone())
                .with_max_questions(settings.max_questions),
            output: OutputGuardrail::new(&config),
        }
    }

    pub fn agent(&self) -> &TriageAgent<S> {
        &self.agent
    }

    pub fn start_session(&self) -> Result<SessionStart, TriageError> {
        let context = self.agent.start_session()?;
        let (greeting, _) = self
            .output
            .process(messages::greeting(self.agent.language()), false);
        Ok(SessionStart { context, greeting })
    }

    pub fn handle_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<TriageOutcome, TriageError> {
        let outcome = self.agent.process_message(session_id, text)?;

        let mut response = match outcome {
            TriageOutcome::Reply(response) => response,
            other => return Ok(other),
        };

        let is_emergency = response.urgency == Urgency::Emergency;
        let (safe_text, verdict) = self.output.process(&response.message, is_emergency);
        if !verdict.passed {
            tracing::warn!(
                session_id = %response.session_id,
                risk_level = %verdict.risk_level,
                "Reply rewritten before delivery"
            );
        }
        response.message = safe_text;
        Ok(TriageOutcome::Reply(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::config::{DEFAULT_DISCLAIMER_MARKER, DEFAULT_EMERGENCY_ALERT};
    use crate::triage::{InMemorySessionStore, Role, TriageState};

    fn service() -> TriageService<InMemorySessionStore> {
        TriageService::new(&GuardrailConfig::builtin(), InMemorySessionStore::new())
    }

    #[test]
    fn greeting_carries_disclaimer() {
        let start = service().start_session().unwrap();
        assert!(start.greeting.contains(DEFAULT_DISCLAIMER_MARKER));
        assert_eq!(start.context.state, TriageState::Collecting);
    }

    #[test]
    fn follow_up_carries_disclaimer_but_history_is_raw() {
        let service = service();
        let id = service.start_session().unwrap().context.session_id;
        let outcome = service.handle_message(&id, "头痛").unwrap();
        let reply = outcome.reply().unwrap();
        assert!(reply.message.starts_with(messages::follow_up_question(0, "zh")));
        assert!(reply.message.contains(DEFAULT_DISCLAIMER_MARKER));

        let ctx = service.agent().get_session(&id).unwrap().unwrap();
        let stored = &ctx.messages[1];
        assert_eq!(stored.role, Role::Assistant);
        assert!(!stored.content.contains(DEFAULT_DISCLAIMER_MARKER));
    }

    #[test]
    fn emergency_reply_gets_alert_banner() {
        let service = service();
        let id = service.start_session().unwrap().context.session_id;
        let outcome = service
            .handle_message(&id, "severe chest pain, can't breathe")
            .unwrap();
        let reply = outcome.reply().unwrap();
        assert_eq!(reply.state, TriageState::Emergency);
        assert!(reply.message.starts_with(DEFAULT_EMERGENCY_ALERT.trim()));
        assert!(reply.message.contains(DEFAULT_DISCLAIMER_MARKER));
    }

    #[test]
    fn blocked_and_unknown_pass_through_untouched() {
        let service = service();
        let id = service.start_session().unwrap().context.session_id;
        let blocked = service.handle_message(&id, "I want to hurt myself").unwrap();
        assert!(blocked.is_blocked());
        assert!(!blocked.message().contains(DEFAULT_DISCLAIMER_MARKER));

        let missing = service.handle_message("missing", "hello").unwrap();
        assert!(missing.is_not_found());
    }

    #[test]
    fn settings_select_language_and_budget() {
        let settings = AppSettings {
            lang: "en".into(),
            max_questions: 1,
            ..AppSettings::default()
        };
        let service = TriageService::from_settings(&settings, InMemorySessionStore::new());
        let start = service.start_session().unwrap();
        assert!(start.greeting.starts_with(messages::greeting("en")));

        let outcome = service
            .handle_message(&start.context.session_id, "I have a cough")
            .unwrap();
        let reply = outcome.reply().unwrap();
        assert!(reply.is_complete);
        assert_eq!(reply.recommended_departments, vec!["呼吸内科"]);
    }
}
