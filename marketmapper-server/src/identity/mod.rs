//! Identity provider abstractions
//!
//! A provider turns an authorization code into a profile. Storage of the
//! resulting user is the caller's concern.

pub mod google;

pub use google::GoogleProvider;

use async_trait::async_trait;
use thiserror::Error;

/// The fields MarketMapper keeps from a provider profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Stable subject id issued by the provider
    pub provider_id: String,
    pub display_name: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid provider configuration: {0}")]
    Configuration(String),

    #[error("Authorization code exchange failed: {0}")]
    Exchange(String),

    #[error("Profile request failed: {0}")]
    Profile(String),

    #[error("Provider profile has no email address")]
    MissingEmail,
}

/// Trait for an OAuth2 identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider name used in route paths and logs
    fn name(&self) -> &'static str;

    /// URL to send the browser to, carrying the given CSRF state
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for the signed-in user's profile
    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, IdentityError>;
}
