use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::CredentialError;

pub const GITHUB_OAUTH_URL: &str = "https://github.com";
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Turns a one-time authorization code into a stable external identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange `code` for an access token and return the account login it
    /// belongs to.
    async fn exchange_and_lookup(&self, code: &str) -> Result<String, CredentialError>;
}

/// GitHub OAuth app: `code` -> access token -> `GET /user` -> `login`.
pub struct GithubIdentityProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    oauth_url: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
}

impl GithubIdentityProvider {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CredentialError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("devcred/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CredentialError::IdentityLookupFailure(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            oauth_url: GITHUB_OAUTH_URL.to_string(),
            api_url: GITHUB_API_URL.to_string(),
        })
    }

    /// Point the provider at other hosts (GitHub Enterprise, test servers).
    pub fn with_base_urls(mut self, oauth_url: &str, api_url: &str) -> Self {
        self.oauth_url = oauth_url.trim_end_matches('/').to_string();
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// URL a user visits to authorize the OAuth app.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}/login/oauth/authorize?client_id={}",
            self.oauth_url, self.client_id
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<String, CredentialError> {
        let resp = self
            .client
            .post(format!("{}/login/oauth/access_token", self.oauth_url))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| lookup_failure("token exchange", e))?
            .error_for_status()
            .map_err(|e| lookup_failure("token exchange", e))?;

        let body: AccessTokenResponse = resp
            .json()
            .await
            .map_err(|e| lookup_failure("token exchange", e))?;
        token_from_response(body)
    }

    async fn lookup_login(&self, access_token: &str) -> Result<String, CredentialError> {
        let user: GithubUser = self
            .client
            .get(format!("{}/user", self.api_url))
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| lookup_failure("user lookup", e))?
            .error_for_status()
            .map_err(|e| lookup_failure("user lookup", e))?
            .json()
            .await
            .map_err(|e| lookup_failure("user lookup", e))?;
        Ok(user.login)
    }
}

#[async_trait]
impl IdentityProvider for GithubIdentityProvider {
    async fn exchange_and_lookup(&self, code: &str) -> Result<String, CredentialError> {
        let access_token = self.exchange_code(code).await?;
        tracing::debug!("GitHub authorization code exchanged");

        let login = self.lookup_login(&access_token).await?;
        tracing::info!(login = %login, "GitHub user looked up");
        Ok(login)
    }
}

fn lookup_failure(stage: &str, e: reqwest::Error) -> CredentialError {
    CredentialError::IdentityLookupFailure(format!("GitHub {}: {}", stage, e))
}

fn token_from_response(body: AccessTokenResponse) -> Result<String, CredentialError> {
    match body {
        AccessTokenResponse {
            access_token: Some(token),
            ..
        } if !token.is_empty() => Ok(token),
        AccessTokenResponse {
            error: Some(error),
            error_description,
            ..
        } => Err(CredentialError::IdentityLookupFailure(match error_description {
            Some(description) => format!("GitHub token exchange: {} ({})", error, description),
            None => format!("GitHub token exchange: {}", error),
        })),
        _ => Err(CredentialError::IdentityLookupFailure(
            "GitHub token exchange returned no access token".to_string(),
        )),
    }
}
