use std::collections::HashSet;

use leadscout_common::CandidateProfile;

/// Identity used for deduplication: handle, else profile URL, else name.
///
/// Handles drop a leading `@`; URLs drop scheme, `www.` and trailing
/// slashes; names collapse whitespace. All are lower-cased.
pub fn identity_key(profile: &CandidateProfile) -> String {
    let identity = &profile.identity;
    if let Some(handle) = non_blank(identity.handle.as_deref()) {
        return format!("handle:{}", handle.trim_start_matches('@').to_lowercase());
    }
    if let Some(url) = non_blank(identity.profile_url.as_deref()) {
        return format!("url:{}", normalize_url(url));
    }
    let name = profile
        .name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    format!("name:{name}")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn normalize_url(url: &str) -> String {
    let lower = url.to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    without_scheme
        .strip_prefix("www.")
        .unwrap_or(without_scheme)
        .trim_end_matches('/')
        .to_string()
}

/// Keep the first profile seen for each identity key. Later duplicates are
/// dropped whole; fields are never merged.
pub fn deduplicate(profiles: Vec<CandidateProfile>) -> Vec<CandidateProfile> {
    let mut seen = HashSet::new();
    profiles
        .into_iter()
        .filter(|p| seen.insert(identity_key(p)))
        .collect()
}

/// Stable sort by confidence, highest first. Ties keep arrival order.
pub fn rank(profiles: &mut [CandidateProfile]) {
    profiles.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}

pub fn aggregate(profiles: Vec<CandidateProfile>) -> Vec<CandidateProfile> {
    let mut unique = deduplicate(profiles);
    rank(&mut unique);
    unique
}
