//! OAuth credentials for the Gmail API.
//!
//! Reads the authorized-user token file, refreshes the access token when it is
//! missing or about to expire, and writes the refreshed token back so the next
//! run can reuse it. The browser consent flow that first produces the file is
//! not handled here.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Secrets;
use crate::error::AuthError;

/// Scope the user token must be granted.
pub const GMAIL_MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Google's OAuth token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring within this window are refreshed up front.
const EXPIRY_SKEW_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Authorized-user token file. Unknown fields are preserved on rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthorizedUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    token_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// Project client secrets as downloaded from the cloud console.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

#[derive(Debug, Clone, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Parse the token file's expiry, accepting RFC 3339 or a bare UTC timestamp.
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}

impl AuthorizedUser {
    /// The stored access token, if it is still good at `now`. A token with no
    /// recorded expiry never expires.
    fn valid_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.token.as_deref().filter(|t| !t.is_empty())?;
        let Some(raw) = self.expiry.as_deref() else {
            return Some(token);
        };
        let expiry = parse_expiry(raw)?;
        (expiry - Duration::seconds(EXPIRY_SKEW_SECS) > now).then_some(token)
    }
}

/// Loads and refreshes the user's Gmail access token.
pub struct TokenStore {
    user_token_path: PathBuf,
    project_token_path: PathBuf,
    http: reqwest::Client,
}

impl TokenStore {
    pub fn new(secrets: &Secrets) -> Self {
        Self {
            user_token_path: secrets.user_token_path.clone(),
            project_token_path: secrets.project_token_path.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// Return a usable access token, refreshing and persisting it if needed.
    pub async fn access_token(&self) -> Result<SecretString, AuthError> {
        self.access_token_at(Utc::now()).await
    }

    pub async fn access_token_at(&self, now: DateTime<Utc>) -> Result<SecretString, AuthError> {
        let mut user = self.read_user_token().await?;

        if let Some(token) = user.valid_token(now) {
            debug!(path = %self.user_token_path.display(), "Using stored access token");
            return Ok(SecretString::from(token.to_string()));
        }

        let Some(refresh_token) = user.refresh_token.clone() else {
            return Err(AuthError::ConsentRequired {
                path: self.user_token_path.clone(),
            });
        };

        let client = self.client_secrets(&user).await?;
        let refreshed = self.refresh(&user.token_uri, &client, &refresh_token).await?;

        let expires_in = refreshed.expires_in.unwrap_or(3600);
        user.token = Some(refreshed.access_token.clone());
        user.expiry = Some(
            (now + Duration::seconds(expires_in)).to_rfc3339_opts(SecondsFormat::Micros, true),
        );
        if let Some(rotated) = refreshed.refresh_token {
            user.refresh_token = Some(rotated);
        }
        if user.scopes.is_empty() {
            user.scopes.push(GMAIL_MODIFY_SCOPE.to_string());
        }
        self.write_user_token(&user).await?;

        info!(
            path = %self.user_token_path.display(),
            expires_in,
            "Refreshed access token"
        );
        Ok(SecretString::from(refreshed.access_token))
    }

    async fn read_user_token(&self) -> Result<AuthorizedUser, AuthError> {
        let path = &self.user_token_path;
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::ConsentRequired { path: path.clone() });
            }
            Err(e) => return Err(unreadable(path, e)),
        };
        serde_json::from_str(&raw).map_err(|e| unreadable(path, e))
    }

    async fn write_user_token(&self, user: &AuthorizedUser) -> Result<(), AuthError> {
        let path = &self.user_token_path;
        let json = serde_json::to_string_pretty(user).map_err(|e| AuthError::Unwritable {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| AuthError::Unwritable {
                path: path.clone(),
                reason: e.to_string(),
            })
    }

    /// Client id/secret from the token file, else from the project secrets file.
    async fn client_secrets(&self, user: &AuthorizedUser) -> Result<ClientSecrets, AuthError> {
        if let (Some(id), Some(secret)) = (&user.client_id, &user.client_secret) {
            return Ok(ClientSecrets {
                client_id: id.clone(),
                client_secret: secret.clone(),
            });
        }

        let path = &self.project_token_path;
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| unreadable(path, e))?;
        let file: ClientSecretsFile = serde_json::from_str(&raw).map_err(|e| unreadable(path, e))?;
        file.installed
            .or(file.web)
            .ok_or(AuthError::MissingClientSecrets)
    }

    async fn refresh(
        &self,
        token_uri: &str,
        client: &ClientSecrets,
        refresh_token: &str,
    ) -> Result<RefreshResponse, AuthError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ];
        let resp = self
            .http
            .post(token_uri)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed {
                reason: format!("HTTP {status}: {body}"),
            });
        }

        resp.json::<RefreshResponse>()
            .await
            .map_err(|e| AuthError::RefreshFailed {
                reason: format!("invalid token response: {e}"),
            })
    }
}

fn unreadable(path: &Path, e: impl std::fmt::Display) -> AuthError {
    AuthError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Resolve an access token for the configured user.
pub async fn load_access_token(secrets: &Secrets) -> Result<SecretString, AuthError> {
    TokenStore::new(secrets).access_token().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use secrecy::ExposeSecret;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn store_in(dir: &tempfile::TempDir) -> TokenStore {
        TokenStore::new(&Secrets {
            project_token_path: dir.path().join("client_secret.json"),
            user_token_path: dir.path().join("user_token.json"),
        })
    }

    fn write_user(dir: &tempfile::TempDir, value: serde_json::Value) {
        std::fs::write(dir.path().join("user_token.json"), value.to_string()).unwrap();
    }

    fn read_user(dir: &tempfile::TempDir) -> serde_json::Value {
        let raw = std::fs::read_to_string(dir.path().join("user_token.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn parse_expiry_accepts_python_style_timestamp() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 1, 13, 0, 0).unwrap();
        assert_eq!(parse_expiry("2024-06-01T13:00:00Z"), Some(expected));
        assert_eq!(parse_expiry("2024-06-01T13:00:00.000000Z"), Some(expected));
        assert_eq!(parse_expiry("2024-06-01T13:00:00"), Some(expected));
        assert_eq!(parse_expiry("soon"), None);
    }

    #[tokio::test]
    async fn fresh_token_is_used_without_refresh() {
        let dir = tempfile::tempdir().unwrap();
        write_user(
            &dir,
            serde_json::json!({
                "token": "still-good",
                "expiry": "2024-06-01T13:00:00Z",
                "token_uri": "http://127.0.0.1:9/unreachable"
            }),
        );

        let token = store_in(&dir).access_token_at(now()).await.unwrap();
        assert_eq!(token.expose_secret(), "still-good");
    }

    #[tokio::test]
    async fn token_without_expiry_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        write_user(&dir, serde_json::json!({ "token": "no-expiry" }));

        let token = store_in(&dir).access_token_at(now()).await.unwrap();
        assert_eq!(token.expose_secret(), "no-expiry");
    }

    #[tokio::test]
    async fn unparsable_expiry_counts_as_expired() {
        let dir = tempfile::tempdir().unwrap();
        write_user(
            &dir,
            serde_json::json!({ "token": "stale", "expiry": "whenever" }),
        );

        let err = store_in(&dir).access_token_at(now()).await.unwrap_err();
        assert!(matches!(err, AuthError::ConsentRequired { .. }));
    }

    #[tokio::test]
    async fn token_inside_skew_window_needs_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        write_user(
            &dir,
            serde_json::json!({
                "token": "almost-expired",
                "expiry": "2024-06-01T12:00:30Z"
            }),
        );

        let err = store_in(&dir).access_token_at(now()).await.unwrap_err();
        assert!(matches!(err, AuthError::ConsentRequired { .. }));
    }

    #[tokio::test]
    async fn missing_token_file_requires_consent() {
        let dir = tempfile::tempdir().unwrap();
        let err = store_in(&dir).access_token_at(now()).await.unwrap_err();
        assert!(matches!(err, AuthError::ConsentRequired { .. }));
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=r-123"))
            .and(body_string_contains("client_id=cid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-token",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        write_user(
            &dir,
            serde_json::json!({
                "token": "old-token",
                "refresh_token": "r-123",
                "token_uri": format!("{}/token", server.uri()),
                "client_id": "cid",
                "client_secret": "csecret",
                "scopes": [GMAIL_MODIFY_SCOPE],
                "expiry": "2024-06-01T11:00:00Z",
                "account": ""
            }),
        );

        let token = store_in(&dir).access_token_at(now()).await.unwrap();
        assert_eq!(token.expose_secret(), "new-token");

        let saved = read_user(&dir);
        assert_eq!(saved["token"], "new-token");
        assert_eq!(saved["refresh_token"], "r-123");
        assert_eq!(saved["account"], "");
        let expiry = parse_expiry(saved["expiry"].as_str().unwrap()).unwrap();
        assert_eq!(expiry, now() + Duration::seconds(3599));
    }

    #[tokio::test]
    async fn refresh_falls_back_to_project_client_secrets() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("client_id=project-id"))
            .and(body_string_contains("client_secret=project-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "from-project",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        write_user(
            &dir,
            serde_json::json!({
                "refresh_token": "r-1",
                "token_uri": format!("{}/token", server.uri())
            }),
        );
        std::fs::write(
            dir.path().join("client_secret.json"),
            serde_json::json!({
                "installed": {
                    "client_id": "project-id",
                    "client_secret": "project-secret",
                    "token_uri": "https://oauth2.googleapis.com/token"
                }
            })
            .to_string(),
        )
        .unwrap();

        let token = store_in(&dir).access_token_at(now()).await.unwrap();
        assert_eq!(token.expose_secret(), "from-project");
    }

    #[tokio::test]
    async fn rejected_refresh_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "invalid_grant"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        write_user(
            &dir,
            serde_json::json!({
                "refresh_token": "revoked",
                "token_uri": format!("{}/token", server.uri()),
                "client_id": "cid",
                "client_secret": "csecret"
            }),
        );

        let err = store_in(&dir).access_token_at(now()).await.unwrap_err();
        match err {
            AuthError::RefreshFailed { reason } => assert!(reason.contains("invalid_grant")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
