use crate::error::{AuthError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds before the nominal expiry at which a token already counts as expired
pub const EXPIRY_SKEW_SECS: i64 = 30;

/// OAuth 2.0 access token as persisted in the user's preferences.
///
/// The JSON layout (`access_token`, `token_type`, `expires_in`,
/// `refresh_token`, `created`) is the one the host has always stored, so
/// existing preference rows keep working.
///
/// # Security
///
/// Tokens should never be logged. The `Debug` implementation redacts both
/// token values.
///
/// # Examples
///
/// ```
/// use core_auth::OAuthToken;
///
/// let token = OAuthToken::new("ya29.a0", Some("1//0g".to_string()), 3600, 1_700_000_000);
///
/// assert!(!token.is_expired(1_700_000_000 + 3000));
/// assert!(token.is_expired(1_700_000_000 + 3570));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix timestamp at which the token was issued
    pub created: i64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl OAuthToken {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: i64,
        created: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            expires_in,
            refresh_token,
            created,
        }
    }

    /// Unix timestamp at which the token stops being usable
    pub fn expires_at(&self) -> i64 {
        self.created + self.expires_in - EXPIRY_SKEW_SECS
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at() <= now
    }

    /// The refresh token, if one is present and non-empty
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }

    /// Parse a stored preference value.
    ///
    /// An empty value, the legacy `[]` placeholder, or anything that is not a
    /// token object means "no token".
    pub fn from_stored(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "[]" {
            return None;
        }

        serde_json::from_str::<OAuthToken>(raw)
            .ok()
            .filter(|token| !token.access_token.is_empty())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| AuthError::Serialization(e.to_string()))
    }
}

impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("created", &self.created)
            .finish()
    }
}

/// Where the stored credentials stand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    /// Nothing usable is stored; an auth code is needed
    NoToken,
    /// A token is stored but past its expiry
    Expired(OAuthToken),
    /// A token is stored and still usable
    Valid(OAuthToken),
}

impl TokenState {
    pub fn classify(stored: Option<OAuthToken>, now: i64) -> Self {
        match stored {
            None => TokenState::NoToken,
            Some(token) if token.is_expired(now) => TokenState::Expired(token),
            Some(token) => TokenState::Valid(token),
        }
    }
}

/// The single action that turns a [`TokenState`] into a usable token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStep {
    ExchangeCode(String),
    Refresh(String),
    Reuse(OAuthToken),
}

/// Decide the next step for a token state.
///
/// `auth_code` is only consulted in the [`TokenState::NoToken`] state; empty
/// codes count as absent.
///
/// # Examples
///
/// ```
/// use core_auth::{next_step, AuthError, AuthStep, TokenState};
///
/// let step = next_step(TokenState::NoToken, Some("4/0Ad".to_string())).unwrap();
/// assert_eq!(step, AuthStep::ExchangeCode("4/0Ad".to_string()));
///
/// assert!(matches!(next_step(TokenState::NoToken, None), Err(AuthError::NoAuthCode)));
/// ```
pub fn next_step(state: TokenState, auth_code: Option<String>) -> Result<AuthStep> {
    match state {
        TokenState::NoToken => auth_code
            .filter(|code| !code.is_empty())
            .map(AuthStep::ExchangeCode)
            .ok_or(AuthError::NoAuthCode),
        TokenState::Expired(token) => token
            .refresh_token()
            .map(|refresh| AuthStep::Refresh(refresh.to_string()))
            .ok_or(AuthError::NoRefreshToken),
        TokenState::Valid(token) => Ok(AuthStep::Reuse(token)),
    }
}

/// Outcome of an authentication attempt as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    pub success: bool,
    pub message: String,
}

impl AuthResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn token(created: i64, refresh: Option<&str>) -> OAuthToken {
        OAuthToken::new("access", refresh.map(str::to_string), 3600, created)
    }

    #[test]
    fn test_expiry_includes_skew() {
        let t = token(NOW, None);
        assert!(!t.is_expired(NOW + 3600 - 31));
        assert!(t.is_expired(NOW + 3600 - 30));
    }

    #[test]
    fn test_from_stored_placeholders_mean_no_token() {
        assert_eq!(OAuthToken::from_stored(""), None);
        assert_eq!(OAuthToken::from_stored("[]"), None);
        assert_eq!(OAuthToken::from_stored("not json"), None);
        assert_eq!(OAuthToken::from_stored(r#"{"access_token":""}"#), None);
    }

    #[test]
    fn test_from_stored_reads_legacy_layout() {
        let raw = r#"{"access_token":"ya29.x","token_type":"Bearer","expires_in":3599,
                      "refresh_token":"1\/\/0g","created":1700000000}"#;
        let parsed = OAuthToken::from_stored(raw).unwrap();

        assert_eq!(parsed.access_token, "ya29.x");
        assert_eq!(parsed.refresh_token(), Some("1//0g"));
        assert_eq!(parsed.created, NOW);
    }

    #[test]
    fn test_json_roundtrip_omits_missing_refresh_token() {
        let json = token(NOW, None).to_json().unwrap();
        assert!(!json.contains("refresh_token"));
        assert_eq!(OAuthToken::from_stored(&json), Some(token(NOW, None)));
    }

    #[test]
    fn test_classify() {
        assert_eq!(TokenState::classify(None, NOW), TokenState::NoToken);
        assert!(matches!(
            TokenState::classify(Some(token(NOW - 7200, None)), NOW),
            TokenState::Expired(_)
        ));
        assert!(matches!(
            TokenState::classify(Some(token(NOW, None)), NOW),
            TokenState::Valid(_)
        ));
    }

    #[test]
    fn test_next_step_no_token() {
        assert!(matches!(
            next_step(TokenState::NoToken, Some(String::new())),
            Err(AuthError::NoAuthCode)
        ));
        assert_eq!(
            next_step(TokenState::NoToken, Some("code".to_string())).unwrap(),
            AuthStep::ExchangeCode("code".to_string())
        );
    }

    #[test]
    fn test_next_step_expired() {
        let with_refresh = TokenState::Expired(token(0, Some("r1")));
        assert_eq!(
            next_step(with_refresh, None).unwrap(),
            AuthStep::Refresh("r1".to_string())
        );

        let empty_refresh = TokenState::Expired(token(0, Some("")));
        assert!(matches!(
            next_step(empty_refresh, Some("code".to_string())),
            Err(AuthError::NoRefreshToken)
        ));
    }

    #[test]
    fn test_next_step_valid_reuses_token() {
        let t = token(NOW, None);
        assert_eq!(
            next_step(TokenState::Valid(t.clone()), None).unwrap(),
            AuthStep::Reuse(t)
        );
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", token(NOW, Some("refresh-secret")));
        assert!(!rendered.contains("access\""));
        assert!(!rendered.contains("refresh-secret"));
    }
}
