use serde::{Deserialize, Serialize};

// --- People Data Labs person enrichment ---

/// Envelope returned by `GET /v5/person/enrich`.
#[derive(Debug, Clone, Deserialize)]
pub struct PdlEnrichResponse {
    pub status: u16,
    /// Match confidence, 1-10.
    #[serde(default)]
    pub likelihood: Option<u8>,
    pub data: Option<PdlPerson>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdlPerson {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub job_company_name: Option<String>,
    pub linkedin_url: Option<String>,
    pub twitter_username: Option<String>,
    pub twitter_url: Option<String>,
}

impl PdlPerson {
    /// Full name, else first/last joined, else None.
    pub fn display_name(&self) -> Option<String> {
        if let Some(full) = self.full_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return Some(full.to_string());
        }
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

// --- Twitter API v2 ---

#[derive(Debug, Clone, Deserialize)]
pub struct TwitterUsersResponse {
    #[serde(default)]
    pub data: Vec<TwitterUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterUser {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub public_metrics: Option<TwitterPublicMetrics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwitterPublicMetrics {
    #[serde(default)]
    pub followers_count: u64,
}

// --- LinkedIn people search (member token) ---

#[derive(Debug, Clone, Deserialize)]
pub struct LinkedInSearchResponse {
    #[serde(default)]
    pub elements: Vec<LinkedInPerson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInPerson {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "localizedFirstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "localizedLastName", default)]
    pub last_name: Option<String>,
    #[serde(rename = "localizedHeadline", default)]
    pub headline: Option<String>,
    #[serde(rename = "vanityName", default)]
    pub vanity_name: Option<String>,
}

impl LinkedInPerson {
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    pub fn profile_url(&self) -> Option<String> {
        self.vanity_name
            .as_deref()
            .map(|v| format!("https://www.linkedin.com/in/{v}"))
    }
}

// --- Google Custom Search ---

#[derive(Debug, Clone, Deserialize)]
pub struct CustomSearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItem {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(rename = "displayLink", default)]
    pub display_link: Option<String>,
}

// --- Anthropic messages ---

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub system: &'a str,
    pub messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct WireMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl MessagesResponse {
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
