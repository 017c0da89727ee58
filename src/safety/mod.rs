//! Safety guardrails around the triage dialogue.
//!
//! ```text
//! user text → sanitize → InputGuardrail ─┬─ Critical: refuse, stop
//!                                        ├─ Emergency: escalate
//!                                        └─ Safe: dialogue
//! reply text → OutputGuardrail (check → rewrite → disclaimer) → user
//! ```

pub mod types;
pub mod patterns;
pub mod config;
pub mod sanitize;
pub mod rephrase;
pub mod input;
pub mod output;

pub use config::{GuardrailConfig, RewriteRuleConfig};
pub use input::InputGuardrail;
pub use output::OutputGuardrail;
pub use patterns::PatternSet;
pub use types::{GuardrailResult, PatternKind, RiskLevel, SafetyError};
