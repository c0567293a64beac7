//! Google delegated-authorization redirect flow
//!
//! Standard three-leg flow: redirect the browser to the consent page, get a
//! one-time code back on the callback route, exchange it for tokens. The
//! resulting credential lives in process state for the single trusted user;
//! there is no multi-user session store.

use super::SourceError;
use serde::Deserialize;

const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// OAuth client registration, from configuration.
#[derive(Debug, Clone)]
pub struct OauthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Long-lived credential obtained from the token endpoint.
#[derive(Debug, Clone)]
pub struct DriveCredentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

/// Build the consent-page URL. `state` is echoed back on the callback and
/// must be checked there against the stored value.
pub fn authorization_url(config: &OauthConfig, state: &str) -> String {
    let url = reqwest::Url::parse_with_params(
        AUTHORIZATION_ENDPOINT,
        &[
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", DRIVE_SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ],
    )
    .expect("authorization endpoint URL is valid");
    url.into()
}

/// Exchange the callback code for tokens.
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &OauthConfig,
    code: &str,
) -> Result<DriveCredentials, SourceError> {
    let response = http
        .post(TOKEN_ENDPOINT)
        .form(&[
            ("code", code),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::TokenExchange(format!("{status}: {body}")));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| SourceError::TokenExchange(e.to_string()))?;

    tracing::info!(
        has_refresh_token = token.refresh_token.is_some(),
        "drive credential obtained"
    );

    Ok(DriveCredentials {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OauthConfig {
        OauthConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://127.0.0.1:8700/auth/callback".to_string(),
        }
    }

    #[test]
    fn authorization_url_carries_client_and_state() {
        let url = authorization_url(&config(), "state-token-9");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("state=state-token-9"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("access_type=offline"));
    }

    #[test]
    fn authorization_url_encodes_redirect_uri() {
        let url = authorization_url(&config(), "s");
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8700%2Fauth%2Fcallback"));
        assert!(!url.contains("redirect_uri=http://"));
    }

    #[test]
    fn authorization_url_requests_drive_scope() {
        let url = authorization_url(&config(), "s");
        assert!(url.contains("drive"));
    }
}
