use anyhow::Result;
use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use tracing::warn;

use leadscout_common::{SearchPlan, Source};
use provider_client::ClaudeClient;

use crate::traits::GoalInterpreter;

/// Deterministic plan built from the goal and company text alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordPlanner;

impl KeywordPlanner {
    pub fn plan(&self, goal: &str, company_info: &str) -> SearchPlan {
        let goal = goal.trim();
        let company_info = company_info.trim();
        let base = format!("{goal} {company_info}").trim().to_string();
        let hashtag: String = goal.split_whitespace().collect();

        SearchPlan::new()
            .with_queries(
                Source::Linkedin,
                [
                    format!("{goal} CEO founder"),
                    format!("{base} decision maker"),
                    goal.to_string(),
                ],
            )
            .with_queries(
                Source::X,
                [
                    format!("#{hashtag} founder"),
                    format!("{base} startup"),
                    goal.to_string(),
                ],
            )
            .with_queries(
                Source::Web,
                [
                    format!("{base} company"),
                    format!("{goal} startup"),
                    format!("{company_info} {goal}").trim().to_string(),
                ],
            )
    }
}

#[async_trait]
impl GoalInterpreter for KeywordPlanner {
    async fn interpret(
        &self,
        goal: &str,
        company_info: &str,
        _emails: &[String],
    ) -> Result<SearchPlan> {
        Ok(self.plan(goal, company_info))
    }
}

/// Shape the model is asked to return.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct PlanDraft {
    /// 2-3 LinkedIn people-search queries.
    #[serde(default)]
    pub linkedin_queries: Vec<String>,
    /// 2-3 Twitter/X user-search queries.
    #[serde(default)]
    pub x_queries: Vec<String>,
    /// 2-3 general web search queries.
    #[serde(default)]
    pub internet_queries: Vec<String>,
}

impl From<PlanDraft> for SearchPlan {
    fn from(draft: PlanDraft) -> Self {
        SearchPlan::new()
            .with_queries(Source::Linkedin, draft.linkedin_queries)
            .with_queries(Source::X, draft.x_queries)
            .with_queries(Source::Web, draft.internet_queries)
    }
}

const PLANNER_SYSTEM: &str = "You are an expert B2B lead generation strategist. \
Respond with a single JSON object and nothing else.";

/// Model-backed interpreter. Provider failures and unparseable replies fall
/// back to the keyword plan, so this never returns an error.
pub struct ClaudeGoalInterpreter {
    client: ClaudeClient,
    fallback: KeywordPlanner,
}

impl ClaudeGoalInterpreter {
    pub fn new(client: ClaudeClient) -> Self {
        Self {
            client,
            fallback: KeywordPlanner,
        }
    }

    fn prompt(goal: &str, company_info: &str, emails: &[String]) -> Result<String> {
        let schema = serde_json::to_string_pretty(&schema_for!(PlanDraft))?;
        Ok(format!(
            "Analyze the outreach goal below and write search queries that find \
decision-makers and relevant professionals. Use keywords from the goal, industry \
terms, job titles, and locations when mentioned. Keep queries specific but not narrow.\n\n\
COMPANY: {company_info}\nGOAL: {goal}\nINPUT EMAILS: {}\n\n\
Return JSON matching this schema:\n{schema}",
            emails.join(", ")
        ))
    }
}

/// Strip a surrounding ``` or ```json fence from a model reply.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[async_trait]
impl GoalInterpreter for ClaudeGoalInterpreter {
    async fn interpret(
        &self,
        goal: &str,
        company_info: &str,
        emails: &[String],
    ) -> Result<SearchPlan> {
        let prompt = Self::prompt(goal, company_info, emails)?;
        let reply = match self.client.complete(PLANNER_SYSTEM, &prompt, 1024).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Goal interpretation failed, using keyword plan");
                return Ok(self.fallback.plan(goal, company_info));
            }
        };

        match serde_json::from_str::<PlanDraft>(strip_code_fence(&reply)) {
            Ok(draft) => {
                let plan = SearchPlan::from(draft);
                if plan.total_queries() == 0 {
                    warn!("Model returned an empty plan, using keyword plan");
                    return Ok(self.fallback.plan(goal, company_info));
                }
                Ok(plan)
            }
            Err(e) => {
                warn!(error = %e, "Unparseable plan from model, using keyword plan");
                Ok(self.fallback.plan(goal, company_info))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_plan_covers_linkedin_x_and_web() {
        let plan = KeywordPlanner.plan("voice AI", "Acme Labs");
        assert_eq!(
            plan.queries_for(Source::Linkedin),
            &[
                "voice AI CEO founder".to_string(),
                "voice AI Acme Labs decision maker".to_string(),
                "voice AI".to_string(),
            ]
        );
        assert_eq!(plan.queries_for(Source::X)[0], "#voiceAI founder");
        assert_eq!(plan.queries_for(Source::Web).len(), 3);
        assert!(plan.queries_for(Source::Email).is_empty());
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }

    #[test]
    fn draft_tolerates_missing_keys() {
        let draft: PlanDraft =
            serde_json::from_str(r#"{"linkedin_queries":["fintech CFO"]}"#).unwrap();
        let plan = SearchPlan::from(draft);
        assert_eq!(plan.total_queries(), 1);
        assert_eq!(plan.queries_for(Source::Linkedin), &["fintech CFO".to_string()]);
    }
}
