//! OAuth2 Authorization Code flow against TickTick.
//!
//! 1. Opens browser to the authorization URL
//! 2. Starts a tiny localhost HTTP server to receive the callback
//! 3. Exchanges the code for an access token (+ refresh token)
//! 4. Stores tokens in the OS keyring

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::net::TcpListener;

use super::keyring_store;
use crate::error::OAuthError;

pub const OAUTH_AUTHORIZE_URL: &str = "https://ticktick.com/oauth/authorize";
pub const OAUTH_TOKEN_URL: &str = "https://ticktick.com/oauth/token";
pub const OAUTH_SCOPES: &str = "tasks:read tasks:write";
pub const DEFAULT_REDIRECT_PORT: u16 = 8383;

const TOKENS_KEY: &str = "oauth_tokens";
const CLIENT_ID_KEY: &str = "oauth_client_id";
const CLIENT_SECRET_KEY: &str = "oauth_client_secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>, // Unix timestamp
    pub token_type: String,
    pub scope: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_port: u16,
}

impl OAuthConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_port: DEFAULT_REDIRECT_PORT,
        }
    }

    /// Load client credentials previously stored with
    /// [`store_credentials`].
    pub fn from_keyring() -> Result<Self, OAuthError> {
        let client_id = keyring_store::get(CLIENT_ID_KEY)
            .map_err(|e| OAuthError::Keyring(e.to_string()))?
            .ok_or(OAuthError::CredentialsNotConfigured)?;
        let client_secret = keyring_store::get(CLIENT_SECRET_KEY)
            .map_err(|e| OAuthError::Keyring(e.to_string()))?
            .ok_or(OAuthError::CredentialsNotConfigured)?;
        Ok(Self::new(client_id, client_secret))
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback", self.redirect_port)
    }

    pub fn auth_url_full(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}",
            OAUTH_AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri()),
            urlencoding::encode(OAUTH_SCOPES),
        )
    }
}

/// Persist client credentials for later flows.
pub fn store_credentials(client_id: &str, client_secret: &str) -> Result<(), OAuthError> {
    keyring_store::set(CLIENT_ID_KEY, client_id)
        .and_then(|()| keyring_store::set(CLIENT_SECRET_KEY, client_secret))
        .map_err(|e| OAuthError::Keyring(e.to_string()))
}

/// Run the full OAuth2 flow: open browser -> listen for callback ->
/// exchange code. Tokens are stored in the keyring on success.
pub async fn authorize(config: &OAuthConfig) -> Result<OAuthTokens, OAuthError> {
    let auth_url = config.auth_url_full();
    open::that(&auth_url).map_err(|e| OAuthError::AuthorizationFailed(e.to_string()))?;

    let listener = TcpListener::bind(format!("127.0.0.1:{}", config.redirect_port))
        .map_err(|e| OAuthError::AuthorizationFailed(e.to_string()))?;

    let (mut stream, _) = listener
        .accept()
        .map_err(|e| OAuthError::AuthorizationFailed(e.to_string()))?;
    let mut buf = [0u8; 4096];
    let n = stream
        .read(&mut buf)
        .map_err(|e| OAuthError::InvalidCallback(e.to_string()))?;
    let request = String::from_utf8_lossy(&buf[..n]);

    // Extract code from GET /callback?code=XXX&...
    let code = extract_code(&request)
        .ok_or_else(|| OAuthError::InvalidCallback("no code in callback".into()))?;

    // Send success response to browser
    let response = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<html><body><h2>Authentication successful!</h2><p>You can close this tab.</p></body></html>";
    let _ = stream.write_all(response.as_bytes());
    drop(stream);
    drop(listener);

    let tokens = exchange_code(config, &code).await?;
    save_tokens(&tokens)?;
    Ok(tokens)
}

/// Exchange authorization code for tokens.
async fn exchange_code(config: &OAuthConfig, code: &str) -> Result<OAuthTokens, OAuthError> {
    let client = Client::new();
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("code", code),
        ("grant_type", "authorization_code"),
        ("scope", OAUTH_SCOPES),
        ("redirect_uri", &config.redirect_uri()),
    ];

    let resp = client
        .post(OAUTH_TOKEN_URL)
        .form(&params)
        .send()
        .await
        .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

    let body: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

    if let Some(error) = body.get("error") {
        return Err(OAuthError::TokenExchangeFailed(error.to_string()));
    }

    Ok(tokens_from_body(&body, None))
}

/// Refresh an access token using a refresh token. The refreshed tokens
/// replace the stored ones.
pub async fn refresh_tokens(
    config: &OAuthConfig,
    refresh: &str,
) -> Result<OAuthTokens, OAuthError> {
    let client = Client::new();
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("refresh_token", refresh),
        ("grant_type", "refresh_token"),
    ];

    let resp = client
        .post(OAUTH_TOKEN_URL)
        .form(&params)
        .send()
        .await
        .map_err(|e| OAuthError::TokenRefreshFailed(e.to_string()))?;

    let body: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| OAuthError::TokenRefreshFailed(e.to_string()))?;

    if let Some(error) = body.get("error") {
        return Err(OAuthError::TokenRefreshFailed(error.to_string()));
    }

    let tokens = tokens_from_body(&body, Some(refresh));
    save_tokens(&tokens)?;
    Ok(tokens)
}

fn tokens_from_body(body: &serde_json::Value, prior_refresh: Option<&str>) -> OAuthTokens {
    let expires_in = body.get("expires_in").and_then(|v| v.as_i64());
    let expires_at = expires_in.map(|ei| chrono::Utc::now().timestamp() + ei);

    OAuthTokens {
        access_token: body["access_token"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        refresh_token: body
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| prior_refresh.map(String::from)),
        expires_at,
        token_type: body["token_type"].as_str().unwrap_or("Bearer").to_string(),
        scope: body.get("scope").and_then(|v| v.as_str()).map(String::from),
    }
}

fn save_tokens(tokens: &OAuthTokens) -> Result<(), OAuthError> {
    let json = serde_json::to_string(tokens).map_err(|e| OAuthError::Keyring(e.to_string()))?;
    keyring_store::set(TOKENS_KEY, &json).map_err(|e| OAuthError::Keyring(e.to_string()))
}

/// Load stored tokens from the keyring.
pub fn load_tokens() -> Option<OAuthTokens> {
    keyring_store::get(TOKENS_KEY)
        .ok()
        .flatten()
        .and_then(|json| serde_json::from_str(&json).ok())
}

/// Remove stored tokens.
pub fn clear_tokens() -> Result<(), OAuthError> {
    keyring_store::delete(TOKENS_KEY).map_err(|e| OAuthError::Keyring(e.to_string()))
}

/// Check if stored tokens are expired (with 60s buffer).
pub fn is_expired(tokens: &OAuthTokens) -> bool {
    match tokens.expires_at {
        Some(exp) => chrono::Utc::now().timestamp() > exp - 60,
        None => false,
    }
}

/// Current access token, refreshing through the stored client
/// credentials when the cached one has expired.
pub async fn access_token() -> Result<String, OAuthError> {
    let tokens = load_tokens().ok_or(OAuthError::NotAuthenticated)?;
    if !is_expired(&tokens) {
        return Ok(tokens.access_token);
    }

    let refresh = tokens
        .refresh_token
        .as_deref()
        .ok_or(OAuthError::TokenExpired)?;
    let config = OAuthConfig::from_keyring()?;
    let refreshed = refresh_tokens(&config, refresh).await?;
    Ok(refreshed.access_token)
}

fn extract_code(request: &str) -> Option<String> {
    let first_line = request.lines().next()?;
    let path = first_line.split_whitespace().nth(1)?;
    let url = url::Url::parse(&format!("http://localhost{path}")).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_url_carries_client_and_scopes() {
        let config = OAuthConfig::new("my-client", "secret");
        let url = config.auth_url_full();
        assert!(url.starts_with(OAUTH_AUTHORIZE_URL));
        assert!(url.contains("client_id=my-client"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("tasks%3Aread"));
    }

    #[test]
    fn extract_code_from_callback_request() {
        let request = "GET /callback?code=abc123&state=xyz HTTP/1.1\r\nHost: localhost\r\n\r\n";
        assert_eq!(extract_code(request), Some("abc123".to_string()));

        let no_code = "GET /callback?state=xyz HTTP/1.1\r\n\r\n";
        assert_eq!(extract_code(no_code), None);
    }

    #[test]
    fn expiry_check_uses_buffer() {
        let now = chrono::Utc::now().timestamp();
        let fresh = OAuthTokens {
            access_token: "a".into(),
            refresh_token: None,
            expires_at: Some(now + 3600),
            token_type: "Bearer".into(),
            scope: None,
        };
        assert!(!is_expired(&fresh));

        let stale = OAuthTokens {
            expires_at: Some(now + 30), // inside the 60s buffer
            ..fresh.clone()
        };
        assert!(is_expired(&stale));

        let no_expiry = OAuthTokens {
            expires_at: None,
            ..fresh
        };
        assert!(!is_expired(&no_expiry));
    }

    #[test]
    fn tokens_from_body_keeps_prior_refresh_token() {
        let body = serde_json::json!({
            "access_token": "new-access",
            "token_type": "bearer",
            "expires_in": 7200
        });
        let tokens = tokens_from_body(&body, Some("old-refresh"));
        assert_eq!(tokens.access_token, "new-access");
        assert_eq!(tokens.refresh_token.as_deref(), Some("old-refresh"));
        assert!(tokens.expires_at.is_some());
    }
}
