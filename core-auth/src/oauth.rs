//! OAuth 2.0 Token Endpoint Client
//!
//! Builds the consent URL and talks to the token endpoint for the two grants
//! the contacts sync needs: `authorization_code` and `refresh_token`.
//!
//! # Overview
//!
//! - One HTTP attempt per call; no retry
//! - Error bodies are parsed as `{"error": "...", "error_description": "..."}`
//!   and `invalid_grant` becomes [`AuthError::InvalidGrant`]
//! - A refresh response without a new refresh token keeps the old one
//!
//! # Example
//!
//! ```no_run
//! use bridge_traits::{HttpClient, SystemClock};
//! use core_auth::OAuthClient;
//! use core_runtime::config::OAuthClientSettings;
//! use std::sync::Arc;
//!
//! # async fn example(http_client: Arc<dyn HttpClient>) -> core_auth::Result<()> {
//! let settings = OAuthClientSettings::new("client-id", "client-secret");
//! let client = OAuthClient::new(settings, http_client, Arc::new(SystemClock));
//!
//! println!("Visit: {}", client.authorization_url()?);
//! let token = client.exchange_code("4/0Ad-pasted-code").await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::OAuthToken;
use bridge_traits::http::{HttpClient, HttpRequest};
use bridge_traits::Clock;
use core_runtime::config::OAuthClientSettings;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

const INVALID_GRANT: &str = "invalid_grant";

/// Client for the provider's authorization and token endpoints.
pub struct OAuthClient {
    settings: OAuthClientSettings,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
}

impl OAuthClient {
    pub fn new(
        settings: OAuthClientSettings,
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            http_client,
            clock,
        }
    }

    pub fn settings(&self) -> &OAuthClientSettings {
        &self.settings
    }

    /// Build the consent URL the user has to visit.
    ///
    /// Offline access is requested and the consent prompt forced, so the
    /// provider hands out a refresh token every time.
    pub fn authorization_url(&self) -> Result<String> {
        let redirect_uri = self.settings.redirect_uri()?;
        let mut url = Url::parse(&self.settings.auth_url)
            .map_err(|e| AuthError::Config(format!("Invalid auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.settings.scopes.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("approval_prompt", "force");

        debug!(app = %self.settings.application_name, "Built authorization URL");

        Ok(url.to_string())
    }

    /// Exchange a one-time authorization code for a token.
    #[instrument(skip(self, code), fields(app = %self.settings.application_name))]
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthToken> {
        let redirect_uri = self.settings.redirect_uri()?;
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
        ];

        debug!("Exchanging authorization code for token");

        let response = self.request_token(&params).await?;
        Ok(self.into_token(response, None))
    }

    /// Mint a fresh access token from a refresh token.
    #[instrument(skip(self, refresh_token), fields(app = %self.settings.application_name))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<OAuthToken> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
        ];

        debug!("Refreshing access token");

        let response = self.request_token(&params).await?;
        Ok(self.into_token(response, Some(refresh_token)))
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let encoded_body = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::Serialization(format!("Failed to encode token request: {}", e)))?;

        let request = HttpRequest::post(self.settings.token_url.clone())
            .body("application/x-www-form-urlencoded", encoded_body);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            let error = classify_error(response.status, &body);

            warn!(status = response.status, error = %error, "Token endpoint rejected request");
            return Err(error);
        }

        response
            .json::<TokenResponse>()
            .map_err(|e| AuthError::Serialization(format!("Failed to parse token response: {}", e)))
    }

    fn into_token(&self, response: TokenResponse, previous_refresh: Option<&str>) -> OAuthToken {
        let refresh_token = response
            .refresh_token
            .filter(|token| !token.is_empty())
            .or_else(|| previous_refresh.map(str::to_string));

        let mut token = OAuthToken::new(
            response.access_token,
            refresh_token,
            response.expires_in,
            self.clock.unix_timestamp(),
        );
        if let Some(token_type) = response.token_type {
            token.token_type = token_type;
        }

        debug!(expires_in = token.expires_in, "Received access token");
        token
    }
}

/// Turn a failed token endpoint response into a typed error.
///
/// Structured `error` codes are preferred; a body that is not the standard
/// JSON error object is searched for the `invalid_grant` marker instead.
fn classify_error(status: u16, body: &str) -> AuthError {
    match serde_json::from_str::<OAuthErrorResponse>(body) {
        Ok(parsed) => {
            let message = match &parsed.error_description {
                Some(description) => format!("{}: {}", parsed.error, description),
                None => parsed.error.clone(),
            };

            if parsed.error == INVALID_GRANT {
                AuthError::InvalidGrant(message)
            } else {
                AuthError::TokenEndpoint { status, message }
            }
        }
        Err(_) if body.contains(INVALID_GRANT) => AuthError::InvalidGrant(body.trim().to_string()),
        Err(_) => AuthError::TokenEndpoint {
            status,
            message: body.trim().to_string(),
        },
    }
}

/// Successful token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(default)]
    token_type: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

/// RFC 6749 section 5.2 error body
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedHttp;
    use bridge_traits::error::BridgeError;
    use bridge_traits::FixedClock;

    const NOW: i64 = 1_700_000_000;

    fn client(http: Arc<ScriptedHttp>) -> OAuthClient {
        let settings = OAuthClientSettings::new("client-id", "client-secret")
            .with_endpoints("https://auth.example/auth", "https://auth.example/token");
        OAuthClient::new(settings, http, Arc::new(FixedClock::at_unix(NOW)))
    }

    #[test]
    fn test_authorization_url_out_of_band() {
        let client = client(Arc::new(ScriptedHttp::default()));
        let url = Url::parse(&client.authorization_url().unwrap()).unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs["client_id"], "client-id");
        assert_eq!(pairs["redirect_uri"], "urn:ietf:wg:oauth:2.0:oob");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(
            pairs["scope"],
            "https://www.googleapis.com/auth/contacts.readonly"
        );
        assert_eq!(pairs["access_type"], "offline");
        assert_eq!(pairs["approval_prompt"], "force");
    }

    #[tokio::test]
    async fn test_exchange_code_posts_form_and_stamps_created() {
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(
            200,
            r#"{"access_token":"ya29.new","refresh_token":"1//r","expires_in":3599,"token_type":"Bearer"}"#,
        )]));
        let token = client(http.clone()).exchange_code("4/code").await.unwrap();

        assert_eq!(token.access_token, "ya29.new");
        assert_eq!(token.refresh_token(), Some("1//r"));
        assert_eq!(token.expires_in, 3599);
        assert_eq!(token.created, NOW);

        let form = http.form(0).await;
        assert_eq!(form["grant_type"], "authorization_code");
        assert_eq!(form["code"], "4/code");
        assert_eq!(form["redirect_uri"], "urn:ietf:wg:oauth:2.0:oob");
        assert_eq!(form["client_secret"], "client-secret");
    }

    #[tokio::test]
    async fn test_refresh_keeps_previous_refresh_token() {
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(
            200,
            r#"{"access_token":"ya29.fresh","expires_in":3600}"#,
        )]));
        let token = client(http.clone()).refresh("1//old").await.unwrap();

        assert_eq!(token.access_token, "ya29.fresh");
        assert_eq!(token.refresh_token(), Some("1//old"));
        assert_eq!(http.form(0).await["grant_type"], "refresh_token");
    }

    #[tokio::test]
    async fn test_invalid_grant_is_typed() {
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(
            400,
            r#"{"error":"invalid_grant","error_description":"Bad Request"}"#,
        )]));
        let err = client(http).refresh("1//revoked").await.unwrap_err();

        assert!(err.is_invalid_grant());
        assert_eq!(err.to_string(), "Grant rejected by provider: invalid_grant: Bad Request");
    }

    #[tokio::test]
    async fn test_other_endpoint_errors_are_not_invalid_grant() {
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(
            401,
            r#"{"error":"invalid_client"}"#,
        )]));
        let err = client(http).exchange_code("code").await.unwrap_err();

        assert!(matches!(
            err,
            AuthError::TokenEndpoint { status: 401, ref message } if message == "invalid_client"
        ));
    }

    #[tokio::test]
    async fn test_network_failure_is_not_retried() {
        let http = Arc::new(ScriptedHttp::new(vec![Err(BridgeError::Timeout(
            "30s".to_string(),
        ))]));
        let err = client(http.clone()).refresh("1//r").await.unwrap_err();

        assert!(matches!(err, AuthError::Network(_)));
        assert_eq!(http.request_count().await, 1);
    }

    #[test]
    fn test_classify_error_text_fallback() {
        assert!(classify_error(400, "Error refreshing the OAuth2 token, message: 'invalid_grant: Bad Request'")
            .is_invalid_grant());
        assert!(!classify_error(500, "<html>Server Error</html>").is_invalid_grant());
    }
}
