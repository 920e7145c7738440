use url::Url;

use crate::error::{ProviderError, Result};

/// Static OAuth 2.0 endpoints for one platform.
#[derive(Debug, Clone, Copy)]
pub struct OAuthEndpoints {
    pub authorize_url: &'static str,
    pub token_url: &'static str,
    pub scope: &'static str,
    /// Send client credentials as HTTP basic auth instead of form fields.
    pub basic_auth: bool,
    /// Plain PKCE verifier; Twitter requires PKCE even for confidential clients.
    pub pkce_verifier: Option<&'static str>,
}

pub const TWITTER_OAUTH: OAuthEndpoints = OAuthEndpoints {
    authorize_url: "https://twitter.com/i/oauth2/authorize",
    token_url: "https://api.twitter.com/2/oauth2/token",
    scope: "tweet.read users.read follows.read offline.access",
    basic_auth: true,
    pkce_verifier: Some("challenge"),
};

pub const LINKEDIN_OAUTH: OAuthEndpoints = OAuthEndpoints {
    authorize_url: "https://www.linkedin.com/oauth/v2/authorization",
    token_url: "https://www.linkedin.com/oauth/v2/accessToken",
    scope: "r_liteprofile r_emailaddress",
    basic_auth: false,
    pkce_verifier: None,
};

/// Authorization-code exchange and refresh-token grant for one platform.
/// Token responses are returned untouched as JSON.
pub struct OAuthClient {
    client: reqwest::Client,
    endpoints: OAuthEndpoints,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl OAuthClient {
    pub fn new(
        endpoints: OAuthEndpoints,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            client: crate::http_client(crate::DEFAULT_TIMEOUT),
            endpoints,
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.client = crate::http_client(timeout);
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty()
    }

    /// Browser redirect target that starts the authorization flow.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(self.endpoints.authorize_url)
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("scope", self.endpoints.scope)
                .append_pair("state", state);
            if let Some(verifier) = self.endpoints.pkce_verifier {
                query
                    .append_pair("code_challenge", verifier)
                    .append_pair("code_challenge_method", "plain");
            }
        }
        Ok(url.into())
    }

    pub async fn exchange_code(&self, code: &str) -> Result<serde_json::Value> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(verifier) = self.endpoints.pkce_verifier {
            form.push(("code_verifier", verifier));
        }
        self.token_request(form).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<serde_json::Value> {
        let form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        self.token_request(form).await
    }

    async fn token_request<'a>(
        &'a self,
        mut form: Vec<(&'a str, &'a str)>,
    ) -> Result<serde_json::Value> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured("OAuth client id"));
        }

        let mut request = self.client.post(self.endpoints.token_url);
        if self.endpoints.basic_auth {
            request = request.basic_auth(&self.client_id, Some(&self.client_secret));
        } else {
            form.push(("client_secret", self.client_secret.as_str()));
        }

        let resp = request.form(&form).send().await?;
        let token: serde_json::Value = crate::read_json(resp).await?;
        if token.get("access_token").and_then(|v| v.as_str()).is_none() {
            return Err(ProviderError::Parse(
                "token response has no access_token".to_string(),
            ));
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twitter_authorize_url_carries_state_and_pkce() {
        let client = OAuthClient::new(
            TWITTER_OAUTH,
            "client-1".into(),
            "secret".into(),
            "http://localhost:5000/auth/twitter/callback".into(),
        );
        let url = Url::parse(&client.authorize_url("user-42").unwrap()).unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs["client_id"], "client-1");
        assert_eq!(pairs["state"], "user-42");
        assert_eq!(pairs["code_challenge_method"], "plain");
    }

    #[test]
    fn linkedin_authorize_url_has_no_pkce() {
        let client = OAuthClient::new(
            LINKEDIN_OAUTH,
            "client-2".into(),
            "secret".into(),
            "http://localhost/cb".into(),
        );
        let url = client.authorize_url("u").unwrap();
        assert!(url.starts_with("https://www.linkedin.com/oauth/v2/authorization?"));
        assert!(!url.contains("code_challenge"));
    }

    #[tokio::test]
    async fn unconfigured_client_refuses_token_requests() {
        let client = OAuthClient::new(LINKEDIN_OAUTH, String::new(), String::new(), String::new());
        let err = client.refresh("r1").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }
}
