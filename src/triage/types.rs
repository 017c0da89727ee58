use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::safety::RiskLevel;

/// Default number of follow-up rounds before analysis is forced.
pub const DEFAULT_MAX_QUESTIONS: u32 = 5;

/// Symptom count that ends collection early.
pub const SYMPTOMS_FOR_ANALYSIS: usize = 3;

/// Upper bound on recommended departments.
pub const MAX_DEPARTMENTS: usize = 3;

// ═══════════════════════════════════════════
// Enums
// ═══════════════════════════════════════════

/// Dialogue state. Moves forward only, except that `Emergency` can be
/// entered from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageState {
    Init,
    Collecting,
    Analyzing,
    Emergency,
    Recommending,
    Complete,
}

impl TriageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Collecting => "collecting",
            Self::Analyzing => "analyzing",
            Self::Emergency => "emergency",
            Self::Recommending => "recommending",
            Self::Complete => "complete",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: TriageState) -> bool {
        use TriageState::*;
        match (self, next) {
            (Complete, _) => false,
            (Emergency, Complete) => true,
            (Emergency, _) => false,
            (_, Emergency) => true,
            (Init, Collecting)
            | (Collecting, Analyzing)
            | (Analyzing, Recommending)
            | (Recommending, Complete) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for TriageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Normal,
    Urgent,
    Emergency,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Urgent => "urgent",
            Self::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

// ═══════════════════════════════════════════
// Records
// ═══════════════════════════════════════════

/// A symptom mentioned by the user, with whatever detail was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symptom {
    pub name: String,
    pub duration: Option<String>,
    pub severity: Option<String>,
    pub frequency: Option<String>,
}

impl Symptom {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration: None,
            severity: None,
            frequency: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// One triage conversation. Mutated only through `TriageAgent::process_message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageContext {
    pub session_id: String,
    pub state: TriageState,
    pub symptoms: Vec<Symptom>,
    pub urgency: Urgency,
    pub recommended_departments: Vec<String>,
    pub messages: Vec<Message>,
    pub questions_asked: u32,
    pub max_questions: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TriageContext {
    /// A fresh session ready to collect symptoms.
    pub fn new(session_id: impl Into<String>, max_questions: u32) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            state: TriageState::Collecting,
            symptoms: Vec::new(),
            urgency: Urgency::Normal,
            recommended_departments: Vec::new(),
            messages: Vec::new(),
            questions_asked: 0,
            max_questions,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, rejecting moves the state machine does not allow.
    pub fn transition(&mut self, next: TriageState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(
            session_id = %self.session_id,
            from = %self.state,
            to = %next,
            "Triage state transition"
        );
        self.state = next;
        Ok(())
    }

    /// Add a symptom unless one with the same name is already recorded.
    /// Returns whether it was added.
    pub fn add_symptom(&mut self, symptom: Symptom) -> bool {
        if self.symptoms.iter().any(|s| s.name == symptom.name) {
            return false;
        }
        self.symptoms.push(symptom);
        true
    }

    pub fn symptom_names(&self) -> Vec<String> {
        self.symptoms.iter().map(|s| s.name.clone()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_terminal()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid triage transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: TriageState,
    pub to: TriageState,
}

// ═══════════════════════════════════════════
// Caller-facing results
// ═══════════════════════════════════════════

/// Reply shape handed to whatever transport sits in front of the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageResponse {
    pub session_id: String,
    pub state: TriageState,
    pub urgency: Urgency,
    pub message: String,
    pub is_complete: bool,
    pub recommended_departments: Vec<String>,
    pub symptoms: Vec<String>,
}

impl TriageResponse {
    /// Snapshot of `ctx` reporting `state` (which may differ from the stored
    /// state, e.g. an emergency turn reports `emergency` while the session is
    /// already complete).
    pub fn from_context(ctx: &TriageContext, state: TriageState, message: String) -> Self {
        Self {
            session_id: ctx.session_id.clone(),
            state,
            urgency: ctx.urgency,
            message,
            is_complete: ctx.is_complete(),
            recommended_departments: ctx.recommended_departments.clone(),
            symptoms: ctx.symptom_names(),
        }
    }
}

/// Outcome of one `process_message` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriageOutcome {
    Reply(TriageResponse),
    /// Dangerous input; nothing downstream ran.
    Blocked {
        session_id: String,
        error: bool,
        message: String,
        risk_level: RiskLevel,
    },
    SessionNotFound {
        session_id: String,
        message: String,
    },
}

impl TriageOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Reply(r) => &r.message,
            Self::Blocked { message, .. } => message,
            Self::SessionNotFound { message, .. } => message,
        }
    }

    pub fn reply(&self) -> Option<&TriageResponse> {
        match self {
            Self::Reply(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound { .. })
    }
}
