//! Goal interpretation and outreach message generation.
//!
//! Each collaborator has a deterministic implementation that needs no
//! network and a model-backed one that falls back to it.

pub mod messages;
pub mod planner;

pub use messages::{fallback_message, ClaudeMessageGenerator, TemplateMessages};
pub use planner::{ClaudeGoalInterpreter, KeywordPlanner, PlanDraft};
