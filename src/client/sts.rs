use crate::config::WrapRequest;
use crate::constants::{WRAP_ACCESS_TOKEN, WRAP_NAME, WRAP_PASSWORD, WRAP_SCOPE};
use crate::errors::{AppError, AppResult};
use crate::models::AuthorizationToken;
use crate::orchestrator::TokenService;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// OAuth WRAP client for the secure token service.
#[derive(Debug, Clone)]
pub struct WrapTokenClient {
    client: reqwest::Client,
}

impl WrapTokenClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Exchanges the configured credentials for an authorization header.
    ///
    /// Posts `wrap_name`, `wrap_password` and `wrap_scope` as a form to the
    /// token service URL and reads `wrap_access_token` from the form-encoded
    /// response.
    ///
    /// # Errors
    ///
    /// Returns `Authentication` if the request cannot be sent, the service
    /// answers with a non-success status, or the response carries no token.
    pub async fn request_token(&self, request: &WrapRequest) -> AppResult<AuthorizationToken> {
        let sts_url = Url::parse(&request.url)
            .map_err(|e| AppError::Authentication(format!("Invalid token service URL: {e}")))?;

        debug!(sts_url = %sts_url, uid = %request.creds.uid, scope = %request.wrap_scope, "Requesting authorization token");

        let response = self
            .client
            .post(sts_url.as_str())
            .form(&[
                (WRAP_NAME, request.creds.uid.as_str()),
                (WRAP_PASSWORD, request.creds.pwd.as_str()),
                (WRAP_SCOPE, request.wrap_scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Authentication(format!("Token request failed: {e}")))?;

        let status = response.status();
        let response = response.error_for_status().map_err(|e| {
            let status_code = status.as_u16();
            AppError::Authentication(format!("HTTP {status_code}: token service refused request: {e}"))
        })?;

        let body = response.text().await.map_err(|e| {
            AppError::Authentication(format!("Failed to read token service response: {e}"))
        })?;

        let token = parse_wrap_response(&body)?;
        Ok(AuthorizationToken::new(authorization_header(&token)))
    }
}

#[async_trait]
impl TokenService for WrapTokenClient {
    async fn authorization(&self, request: &WrapRequest) -> AppResult<AuthorizationToken> {
        self.request_token(request).await
    }
}

/// Extracts `wrap_access_token` from a form-encoded token service response.
///
/// Returns `Authentication` if the field is missing or empty.
pub fn parse_wrap_response(body: &str) -> AppResult<String> {
    url::form_urlencoded::parse(body.trim().as_bytes())
        .find(|(key, _)| key == WRAP_ACCESS_TOKEN)
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Authentication(format!(
                "Token service response does not contain {WRAP_ACCESS_TOKEN}"
            ))
        })
}

/// Builds the `Authorization` header value for a WRAP access token.
pub fn authorization_header(token: &str) -> String {
    format!("WRAP access_token=\"{token}\"")
}
