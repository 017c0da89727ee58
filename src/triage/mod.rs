//! Symptom triage dialogue: collect symptoms, analyze, recommend departments.

pub mod types;
pub mod knowledge;
pub mod extract;
pub mod messages;
pub mod store;
pub mod agent;

pub use agent::{TriageAgent, TriageError};
pub use knowledge::KnowledgeBase;
pub use store::{InMemorySessionStore, SessionStore, SqliteSessionStore, StoreError};
pub use types::{
    Message, Role, Symptom, TriageContext, TriageOutcome, TriageResponse, TriageState, Urgency,
};
