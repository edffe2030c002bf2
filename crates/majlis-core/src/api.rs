//! REST surface of the chat server, as this client consumes it.
//!
//! `ChatApi` is the capability seam: production uses [`RestChatApi`] over
//! reqwest; tests (and any future push-based source) supply their own
//! implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },
}

// ── Wire DTOs ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_pages: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderDto {
    pub id: Option<u64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: Option<u64>,
    pub conversation_id: u64,
    pub content: Option<String>,
    pub sender: Option<SenderDto>,
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub kind: Option<i64>,
    pub reply_to_message_id: Option<u64>,
    pub attachment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub id: Option<u64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    pub id: u64,
    pub title: Option<String>,
    #[serde(default)]
    pub participants: Vec<ParticipantDto>,
    #[serde(default)]
    pub is_group: Option<bool>,
    pub profile_picture: Option<String>,
    pub group_picture_file: Option<String>,
}

/// The unread feed wraps its page one level deeper than the other feeds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadDto {
    pub unread_messages: Page<MessageDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendDto {
    pub id: Option<u64>,
    pub user_name: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessageDto {
    pub id: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub conversation_id: u64,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub attachment: String,
    /// `0` means "not a reply"; the reply endpoint is used otherwise.
    pub reply_to_message_id: u64,
}

impl SendMessageRequest {
    pub fn is_reply(&self) -> bool {
        self.reply_to_message_id != 0
    }
}

#[derive(Debug, Clone)]
pub struct CreateConversationRequest {
    pub title: String,
    pub is_group: bool,
    pub participant_ids: Vec<u64>,
    /// Base64 group picture payload, groups only.
    pub picture_base64: Option<String>,
}

// ── Capability trait ────────────────────────────────────────────────

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn fetch_conversations(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<ConversationDto>, ApiError>;

    async fn fetch_all_messages(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<MessageDto>, ApiError>;

    async fn fetch_unread_messages(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<MessageDto>, ApiError>;

    /// Idempotent from the caller's perspective.
    async fn mark_message_read(&self, message_id: u64) -> Result<(), ApiError>;

    async fn send_message(&self, req: SendMessageRequest) -> Result<SentMessageDto, ApiError>;

    async fn create_conversation(
        &self,
        req: CreateConversationRequest,
    ) -> Result<ConversationDto, ApiError>;

    async fn fetch_followings(&self, user_id: u64) -> Result<Vec<FriendDto>, ApiError>;
}

// ── REST implementation ─────────────────────────────────────────────

pub struct RestChatApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestChatApi {
    pub fn new(http: reqwest::Client, base_url: &str, token: String) -> Result<Self, ApiError> {
        // Fail construction on an unparseable base rather than on every call.
        url::Url::parse(base_url)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Map a non-success response into `ApiError::Status`, pulling a
    /// human-readable detail out of the body when the server provides one.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                ["detail", "message", "text"]
                    .iter()
                    .find_map(|k| v.get(k).and_then(|d| d.as_str()).map(str::to_string))
            })
            .unwrap_or_else(|| body.chars().take(200).collect());
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        let resp = self
            .http
            .get(url)
            .header("Authorization", self.bearer())
            .header("Accept", "application/json")
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }
}

#[async_trait]
impl ChatApi for RestChatApi {
    async fn fetch_conversations(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<ConversationDto>, ApiError> {
        self.get_json(format!(
            "{}/api/Chat/conversations?page={}&pageSize={}",
            self.base_url, page, page_size
        ))
        .await
    }

    async fn fetch_all_messages(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<MessageDto>, ApiError> {
        self.get_json(format!(
            "{}/api/Chat/messages/all?page={}&pageSize={}",
            self.base_url, page, page_size
        ))
        .await
    }

    async fn fetch_unread_messages(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<MessageDto>, ApiError> {
        let unread: UnreadDto = self
            .get_json(format!(
                "{}/api/Chat/unread?page={}&pageSize={}",
                self.base_url, page, page_size
            ))
            .await?;
        Ok(unread.unread_messages)
    }

    async fn mark_message_read(&self, message_id: u64) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(format!(
                "{}/api/Chat/messages/{}/read",
                self.base_url, message_id
            ))
            .header("Authorization", self.bearer())
            .header("Accept", "application/json")
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn send_message(&self, req: SendMessageRequest) -> Result<SentMessageDto, ApiError> {
        let endpoint = if req.is_reply() {
            format!("{}/api/Chat/messages/reply", self.base_url)
        } else {
            format!("{}/api/Chat/messages", self.base_url)
        };
        let resp = self
            .http
            .post(endpoint)
            .header("Authorization", self.bearer())
            .header("Accept", "application/json")
            .json(&req)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn create_conversation(
        &self,
        req: CreateConversationRequest,
    ) -> Result<ConversationDto, ApiError> {
        // The create endpoint consumes multipart form data, not JSON.
        let mut form = reqwest::multipart::Form::new()
            .text("Title", req.title)
            .text("IsGroup", if req.is_group { "true" } else { "false" });
        for id in req.participant_ids {
            form = form.text("ParticipantIds", id.to_string());
        }
        if let Some(picture) = req.picture_base64 {
            form = form.text("GroupPictureFile", picture);
        }
        let resp = self
            .http
            .post(format!("{}/api/Chat/conversations", self.base_url))
            .header("Authorization", self.bearer())
            .multipart(form)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn fetch_followings(&self, user_id: u64) -> Result<Vec<FriendDto>, ApiError> {
        self.get_json(format!(
            "{}/api/Follow/{}/followings",
            self.base_url, user_id
        ))
        .await
    }
}
