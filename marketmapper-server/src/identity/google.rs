//! Google sign-in via the OAuth2 authorization-code flow

use std::time::Duration;

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use serde::Deserialize;

use super::{IdentityError, IdentityProvider, ProviderProfile};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Path the provider redirects back to, relative to the public base URL
pub const CALLBACK_PATH: &str = "/auth/google/callback";

/// OpenID Connect userinfo document (only the fields we keep)
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

pub struct GoogleProvider {
    oauth: BasicClient,
    http: reqwest::Client,
}

impl GoogleProvider {
    /// Create a provider whose callback lives under `public_base_url`
    pub fn new(
        client_id: &str,
        client_secret: &str,
        public_base_url: &str,
    ) -> Result<Self, IdentityError> {
        let config_err = |e: oauth2::url::ParseError| IdentityError::Configuration(e.to_string());

        let redirect = format!("{}{}", public_base_url.trim_end_matches('/'), CALLBACK_PATH);
        let oauth = BasicClient::new(
            ClientId::new(client_id.to_string()),
            Some(ClientSecret::new(client_secret.to_string())),
            AuthUrl::new(AUTH_URL.to_string()).map_err(config_err)?,
            Some(TokenUrl::new(TOKEN_URL.to_string()).map_err(config_err)?),
        )
        .set_redirect_uri(RedirectUrl::new(redirect).map_err(config_err)?);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| IdentityError::Configuration(e.to_string()))?;

        Ok(Self { oauth, http })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, IdentityError> {
        let response = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Profile(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::Profile(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| IdentityError::Profile(format!("Invalid JSON: {}", e)))?;

        profile_from_userinfo(info)
    }
}

fn profile_from_userinfo(info: UserInfo) -> Result<ProviderProfile, IdentityError> {
    let email = info
        .email
        .filter(|e| !e.is_empty())
        .ok_or(IdentityError::MissingEmail)?;
    // Accounts without a display name fall back to the mailbox
    let display_name = info
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    Ok(ProviderProfile {
        provider_id: info.sub,
        display_name,
        email,
    })
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorization_url(&self, state: &str) -> String {
        let state = state.to_string();
        let (url, _) = self
            .oauth
            .authorize_url(move || CsrfToken::new(state))
            .add_scope(Scope::new("profile".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .url();
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, IdentityError> {
        tracing::debug!("Exchanging authorization code with Google");

        let token = self
            .oauth
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| IdentityError::Exchange(e.to_string()))?;

        self.fetch_profile(token.access_token().secret()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_url_carries_state_and_scopes() {
        let provider =
            GoogleProvider::new("client-123", "secret", "https://marketmapper.example/").unwrap();
        let url = provider.authorization_url("state-abc");

        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("state=state-abc"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("profile"));
        assert!(url.contains(
            "redirect_uri=https%3A%2F%2Fmarketmapper.example%2Fauth%2Fgoogle%2Fcallback"
        ));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            GoogleProvider::new("id", "secret", "not a url"),
            Err(IdentityError::Configuration(_))
        ));
    }

    #[test]
    fn test_profile_requires_email() {
        let info = UserInfo {
            sub: "1".to_string(),
            name: Some("No Mail".to_string()),
            email: None,
        };
        assert!(matches!(profile_from_userinfo(info), Err(IdentityError::MissingEmail)));
    }

    #[test]
    fn test_profile_name_falls_back_to_mailbox() {
        let info = UserInfo {
            sub: "1".to_string(),
            name: None,
            email: Some("sam@example.com".to_string()),
        };
        let profile = profile_from_userinfo(info).unwrap();
        assert_eq!(profile.display_name, "sam");
        assert_eq!(profile.provider_id, "1");
    }
}
