//! Concrete tier backends, one per (source, provider) pairing.
//!
//! Each backend maps a provider's response onto `CandidateProfile`s with
//! minimal normalization: name, title and company when the provider returns
//! them as fields, identity keys, and the raw record.

pub mod email;
pub mod linkedin;
pub mod offline;
pub mod twitter;
pub mod web;

pub use email::PeopleDataLabsBackend;
pub use linkedin::{LinkedInMemberBackend, LinkedInSiteSearchBackend};
pub use offline::offline_profiles;
pub use twitter::TwitterBackend;
pub use web::WebSearchBackend;

use leadscout_common::{Provenance, Source, Tier};

pub(crate) fn provenance(source: Source, tier: Tier, provider: &str) -> Provenance {
    Provenance {
        source,
        tier,
        provider: provider.to_string(),
    }
}

/// Split a search-result title like `Jane Doe - VP Sales - Acme | LinkedIn`
/// into its dash-separated parts, dropping the trailing site name.
pub(crate) fn title_segments(title: &str) -> Vec<String> {
    let head = title.split(" | ").next().unwrap_or(title);
    head.split(" - ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prefix bare `linkedin.com/in/...` style URLs with a scheme.
pub(crate) fn absolute_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_segments_drop_site_suffix() {
        assert_eq!(
            title_segments("Jane Doe - VP Sales - Acme | LinkedIn"),
            vec!["Jane Doe", "VP Sales", "Acme"]
        );
        assert_eq!(title_segments("Just A Name"), vec!["Just A Name"]);
    }

    #[test]
    fn absolute_url_adds_scheme_once() {
        assert_eq!(
            absolute_url("linkedin.com/in/jane"),
            "https://linkedin.com/in/jane"
        );
        assert_eq!(
            absolute_url("https://linkedin.com/in/jane"),
            "https://linkedin.com/in/jane"
        );
    }
}
