//! Triage dialogue state machine.
//!
//! Each call loads the session snapshot, screens the message through the
//! input guardrail, advances the state machine until a reply is produced,
//! then stores the updated context.
//!
//! ```text
//! Collecting ──(enough symptoms | question budget spent)──> Analyzing
//!     └─ follow-up question                                     │
//! Recommending <────────────────────────────────────────────────┘
//!     └─ recommendation ──> Complete
//! any non-terminal ──(emergency input)──> Emergency ──> Complete
//! ```

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use super::extract::{extract_attributes, extract_symptoms};
use super::knowledge::{KnowledgeBase, EMERGENCY_DEPARTMENT};
use super::messages;
use super::store::{SessionStore, StoreError};
use super::types::{
    InvalidTransition, Message, TriageContext, TriageOutcome, TriageResponse, TriageState,
    Urgency, DEFAULT_MAX_QUESTIONS, MAX_DEPARTMENTS, SYMPTOMS_FOR_ANALYSIS,
};
use crate::safety::sanitize::normalize;
use crate::safety::{GuardrailConfig, InputGuardrail, RiskLevel};

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

pub struct TriageAgent<S: SessionStore> {
    input: InputGuardrail,
    kb: KnowledgeBase,
    store: S,
    lang: String,
    max_questions: u32,
}

impl<S: SessionStore> TriageAgent<S> {
    pub fn new(config: &GuardrailConfig, store: S) -> Self {
        Self {
            input: InputGuardrail::new(config),
            kb: KnowledgeBase::builtin(),
            store,
            lang: "zh".to_string(),
            max_questions: DEFAULT_MAX_QUESTIONS,
        }
    }

    /// Reply language: `"en"` for English, anything else for Chinese.
    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Question budget for sessions started after this call.
    pub fn with_max_questions(mut self, max_questions: u32) -> Self {
        self.max_questions = max_questions;
        self
    }

    pub fn language(&self) -> &str {
        &self.lang
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn start_session(&self) -> Result<TriageContext, TriageError> {
        let ctx = TriageContext::new(Uuid::new_v4().to_string(), self.max_questions);
        self.store.put(&ctx)?;
        tracing::info!(session_id = %ctx.session_id, "Triage session started");
        Ok(ctx)
    }

    pub fn get_session(&self, session_id: &str) -> Result<Option<TriageContext>, TriageError> {
        Ok(self.store.get(session_id)?)
    }

    /// Handle one user turn.
    ///
    /// Unknown sessions and blocked input are ordinary outcomes; only store
    /// failures and state machine violations are errors.
    pub fn process_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<TriageOutcome, TriageError> {
        let Some(mut ctx) = self.store.get(session_id)? else {
            tracing::info!(session_id, "Message for unknown triage session");
            return Ok(TriageOutcome::SessionNotFound {
                session_id: session_id.to_string(),
                message: messages::session_not_found_message(&self.lang).to_string(),
            });
        };

        // Finished sessions are left exactly as stored.
        if ctx.state.is_terminal() {
            return Ok(TriageOutcome::Reply(TriageResponse::from_context(
                &ctx,
                ctx.state,
                messages::session_complete_message(&self.lang).to_string(),
            )));
        }

        let text = normalize(text);
        ctx.messages.push(Message::user(text.clone()));

        let verdict = self.input.check(&text);
        if !verdict.passed {
            self.save(&mut ctx)?;
            return Ok(TriageOutcome::Blocked {
                session_id: ctx.session_id,
                error: true,
                message: verdict.message.unwrap_or_default(),
                risk_level: verdict.risk_level,
            });
        }

        if verdict.risk_level == RiskLevel::Emergency {
            return self.escalate(ctx, &text);
        }

        let reply = self.advance(&mut ctx, &text)?;
        ctx.messages.push(Message::assistant(reply.clone()));
        self.save(&mut ctx)?;

        tracing::info!(
            session_id = %ctx.session_id,
            state = %ctx.state,
            symptoms = ctx.symptoms.len(),
            questions_asked = ctx.questions_asked,
            "Triage turn processed"
        );
        Ok(TriageOutcome::Reply(TriageResponse::from_context(
            &ctx, ctx.state, reply,
        )))
    }

    // ═══════════════════════════════════════════
    // State handlers
    // ═══════════════════════════════════════════

    /// Run state handlers until one produces a reply.
    fn advance(&self, ctx: &mut TriageContext, text: &str) -> Result<String, TriageError> {
        loop {
            match ctx.state {
                TriageState::Init => ctx.transition(TriageState::Collecting)?,
                TriageState::Collecting => {
                    self.collect(ctx, text);
                    ctx.questions_asked = ctx.questions_asked.saturating_add(1);

                    if ctx.questions_asked >= ctx.max_questions
                        || ctx.symptoms.len() >= SYMPTOMS_FOR_ANALYSIS
                    {
                        ctx.transition(TriageState::Analyzing)?;
                    } else {
                        let index = (ctx.questions_asked - 1) as usize;
                        return Ok(messages::follow_up_question(index, &self.lang).to_string());
                    }
                }
                TriageState::Analyzing => {
                    self.analyze(ctx);
                    ctx.transition(TriageState::Recommending)?;
                }
                TriageState::Recommending => {
                    let reply = messages::recommendation_message(
                        &ctx.symptom_names(),
                        &ctx.recommended_departments,
                        ctx.urgency,
                        &self.lang,
                    );
                    ctx.transition(TriageState::Complete)?;
                    return Ok(reply);
                }
                TriageState::Emergency => {
                    ctx.transition(TriageState::Complete)?;
                    return Ok(messages::emergency_message(&self.lang).to_string());
                }
                TriageState::Complete => {
                    return Ok(messages::session_complete_message(&self.lang).to_string());
                }
            }
        }
    }

    /// Record symptoms and attributes from one message. Returns how many new
    /// symptoms were added.
    fn collect(&self, ctx: &mut TriageContext, text: &str) -> usize {
        let attributes = extract_attributes(text);
        let found = extract_symptoms(text, &self.kb);
        let mentioned = found.len();

        let mut added = 0;
        for symptom in found {
            match ctx.symptoms.iter_mut().find(|s| s.name == symptom.name) {
                Some(existing) => attributes.fill_missing(existing),
                None => {
                    ctx.add_symptom(symptom);
                    added += 1;
                }
            }
        }

        // An answer to a follow-up describes the latest symptom.
        if mentioned == 0 && !attributes.is_empty() {
            if let Some(last) = ctx.symptoms.last_mut() {
                attributes.fill_missing(last);
            }
        }

        tracing::debug!(
            session_id = %ctx.session_id,
            added,
            total = ctx.symptoms.len(),
            "Symptoms collected"
        );
        added
    }

    fn analyze(&self, ctx: &mut TriageContext) {
        let names = ctx.symptom_names();
        let mut departments = self
            .kb
            .recommend_departments(names.iter().map(String::as_str), MAX_DEPARTMENTS);

        let urgency = if names.iter().any(|n| self.kb.is_emergency_keyword(n)) {
            departments = vec![EMERGENCY_DEPARTMENT.to_string()];
            Urgency::Emergency
        } else if ctx.symptoms.iter().any(|s| {
            self.kb.has_intensifier(&s.name)
                || s.severity
                    .as_deref()
                    .is_some_and(|severity| self.kb.has_intensifier(severity))
        }) {
            Urgency::Urgent
        } else {
            Urgency::Normal
        };

        tracing::info!(
            session_id = %ctx.session_id,
            urgency = %urgency,
            departments = departments.len(),
            "Triage analysis complete"
        );
        ctx.urgency = urgency;
        ctx.recommended_departments = departments;
    }

    /// Emergency override: route to the emergency department and finish.
    fn escalate(&self, mut ctx: TriageContext, text: &str) -> Result<TriageOutcome, TriageError> {
        self.collect(&mut ctx, text);
        ctx.transition(TriageState::Emergency)?;
        ctx.urgency = Urgency::Emergency;
        ctx.recommended_departments = vec![EMERGENCY_DEPARTMENT.to_string()];

        let reply = messages::emergency_message(&self.lang).to_string();
        ctx.messages.push(Message::assistant(reply.clone()));
        ctx.transition(TriageState::Complete)?;
        self.save(&mut ctx)?;

        tracing::warn!(session_id = %ctx.session_id, "Triage session escalated to emergency");
        Ok(TriageOutcome::Reply(TriageResponse::from_context(
            &ctx,
            TriageState::Emergency,
            reply,
        )))
    }

    fn save(&self, ctx: &mut TriageContext) -> Result<(), TriageError> {
        ctx.updated_at = Utc::now();
        self.store.put(ctx)?;
        Ok(())
    }
}
