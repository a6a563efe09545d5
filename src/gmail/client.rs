//! Gmail v1 REST client.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::TransportError;
use crate::gmail::MailService;
use crate::gmail::types::{Header, LabelSummary, MessageSnapshot, ThreadPage};

/// Production Gmail API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com";

/// Headers requested with thread metadata; nothing else is read.
const METADATA_HEADERS: [&str; 2] = ["Date", "Subject"];

#[derive(Deserialize)]
struct LabelsResponse {
    #[serde(default)]
    labels: Vec<LabelSummary>,
}

#[derive(Deserialize)]
struct ThreadResponse {
    #[serde(default)]
    messages: Vec<WireMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    id: String,
    #[serde(default)]
    label_ids: Vec<String>,
    #[serde(default)]
    payload: Option<WirePayload>,
}

#[derive(Deserialize)]
struct WirePayload {
    #[serde(default)]
    headers: Vec<Header>,
}

impl From<WireMessage> for MessageSnapshot {
    fn from(wire: WireMessage) -> Self {
        Self {
            id: wire.id,
            label_ids: wire.label_ids,
            headers: wire.payload.map(|p| p.headers).unwrap_or_default(),
        }
    }
}

/// Gmail client acting on the authorized user's mailbox (`users/me`).
pub struct GmailClient {
    client: reqwest::Client,
    base_url: String,
    access_token: SecretString,
}

impl GmailClient {
    pub fn new(access_token: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token,
        }
    }

    /// Point the client at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/gmail/v1/users/me/{path}",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Send an authorized request and fail on any non-2xx status.
    async fn send(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, TransportError> {
        let resp = request
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| TransportError::RequestFailed {
                operation: operation.into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                operation: operation.into(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TransportError> {
        self.send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| TransportError::InvalidResponse {
                operation: operation.into(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl MailService for GmailClient {
    async fn list_labels(&self) -> Result<Vec<LabelSummary>, TransportError> {
        let request = self.client.get(self.api_url("labels"));
        let resp: LabelsResponse = self.fetch_json("labels.list", request).await?;
        Ok(resp.labels)
    }

    async fn list_threads(
        &self,
        label_id: &str,
        page_token: Option<&str>,
    ) -> Result<ThreadPage, TransportError> {
        let mut request = self
            .client
            .get(self.api_url("threads"))
            .query(&[("labelIds", label_id)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        self.fetch_json("threads.list", request).await
    }

    async fn get_thread_messages(
        &self,
        thread_id: &str,
    ) -> Result<Vec<MessageSnapshot>, TransportError> {
        let mut query = vec![("format", "metadata")];
        query.extend(METADATA_HEADERS.iter().map(|h| ("metadataHeaders", *h)));
        let request = self
            .client
            .get(self.api_url(&format!("threads/{thread_id}")))
            .query(&query);
        let resp: ThreadResponse = self.fetch_json("threads.get", request).await?;
        Ok(resp.messages.into_iter().map(MessageSnapshot::from).collect())
    }

    async fn modify_message_labels(
        &self,
        message_id: &str,
        remove_ids: &[String],
        add_ids: &[String],
    ) -> Result<(), TransportError> {
        let mut body = serde_json::json!({ "removeLabelIds": remove_ids });
        if !add_ids.is_empty() {
            body["addLabelIds"] = serde_json::json!(add_ids);
        }
        let request = self
            .client
            .post(self.api_url(&format!("messages/{message_id}/modify")))
            .json(&body);
        self.send("messages.modify", request).await?;
        Ok(())
    }
}
