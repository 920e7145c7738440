use anyhow::{bail, Result};
use async_trait::async_trait;

use leadscout_common::CandidateProfile;
use provider_client::ClaudeClient;

use crate::traits::MessageGenerator;

const MIN_MESSAGE_CHARS: usize = 10;
const MAX_MESSAGE_CHARS: usize = 300;

/// Deterministic outreach message, used whenever generation fails.
pub fn fallback_message(profile: &CandidateProfile, goal: &str, company_info: &str) -> String {
    let name = if profile.name.trim().is_empty() {
        "there"
    } else {
        profile.name.trim()
    };
    match profile.company.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(company) => format!(
            "Hi {name}, I noticed you're at {company}. We're working on {goal} at {company_info}. \
Would love to connect and share ideas!"
        ),
        None => format!(
            "Hi {name}, I came across your profile and thought you might be interested in {goal}. \
We're at {company_info} - would love to connect!"
        ),
    }
}

/// Template-only generator for deployments without a text model.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateMessages;

#[async_trait]
impl MessageGenerator for TemplateMessages {
    async fn generate(
        &self,
        profile: &CandidateProfile,
        goal: &str,
        company_info: &str,
    ) -> Result<String> {
        Ok(fallback_message(profile, goal, company_info))
    }
}

const MESSAGE_SYSTEM: &str = "You write brief, genuine B2B outreach messages. \
Reply with the message text only: no subject line, no quotes, no formatting.";

/// Model-backed generator. Errors and out-of-bounds replies surface as `Err`
/// so the pipeline can substitute the template and record a warning.
pub struct ClaudeMessageGenerator {
    client: ClaudeClient,
}

impl ClaudeMessageGenerator {
    pub fn new(client: ClaudeClient) -> Self {
        Self { client }
    }

    fn prompt(profile: &CandidateProfile, goal: &str, company_info: &str) -> String {
        let mut target = format!("Name: {}", profile.name);
        if let Some(title) = &profile.title {
            target.push_str(&format!(", Title: {title}"));
        }
        if let Some(company) = &profile.company {
            target.push_str(&format!(", Company: {company}"));
        }
        format!(
            "MY COMPANY: {company_info}\nMY GOAL: {goal}\nTARGET PERSON: {target}\n\n\
Keep it under 50 words. Say why you are reaching out and end with a soft call to action. \
Do not be pushy."
        )
    }
}

#[async_trait]
impl MessageGenerator for ClaudeMessageGenerator {
    async fn generate(
        &self,
        profile: &CandidateProfile,
        goal: &str,
        company_info: &str,
    ) -> Result<String> {
        let prompt = Self::prompt(profile, goal, company_info);
        let reply = self.client.complete(MESSAGE_SYSTEM, &prompt, 200).await?;
        let message = reply.trim().replace('"', "");
        let chars = message.chars().count();
        if !(MIN_MESSAGE_CHARS..=MAX_MESSAGE_CHARS).contains(&chars) {
            bail!("generated message has {chars} characters");
        }
        Ok(message)
    }
}
