use serde_json::json;

use leadscout_common::{CandidateProfile, Source, Tier};

use super::provenance;

pub const OFFLINE_PROVIDER: &str = "offline_stand_in";
const OFFLINE_CONFIDENCE: f64 = 0.1;

/// Deterministic stand-in results for a source. Always non-empty and the
/// same for the same inputs, so a request degrades to clearly-labelled
/// placeholder data instead of failing.
pub fn offline_profiles(source: Source, query: &str) -> Vec<CandidateProfile> {
    let tagged = provenance(source, Tier::OfflineFallback, OFFLINE_PROVIDER);
    let raw = json!({ "query": query, "placeholder": true });
    let profile = match source {
        Source::Email => CandidateProfile::new("John Doe", tagged, OFFLINE_CONFIDENCE)
            .with_title("Software Engineer")
            .with_company("Example Corp")
            .with_email(query.trim().to_lowercase()),
        Source::Linkedin => CandidateProfile::new("Bob Johnson", tagged, OFFLINE_CONFIDENCE)
            .with_title("VP of Sales")
            .with_company("Example Inc")
            .with_profile_url("https://www.linkedin.com/in/example-bob-johnson"),
        Source::X => CandidateProfile::new("Alice Smith", tagged, OFFLINE_CONFIDENCE)
            .with_title("Founder")
            .with_company("Example Labs")
            .with_handle("@example_alice"),
        Source::Web => CandidateProfile::new("Charlie Brown", tagged, OFFLINE_CONFIDENCE)
            .with_title("Head of Partnerships")
            .with_company("Example Co"),
    };
    vec![profile.with_raw(raw)]
}
