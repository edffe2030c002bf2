use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Default-asset resolver for conversations and senders without a picture.
/// Kept in config so the merge logic never embeds placeholder URLs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DefaultAssets {
    pub avatar_url: String,
    pub group_avatar_url: String,
}

impl Default for DefaultAssets {
    fn default() -> Self {
        Self {
            avatar_url: "https://via.placeholder.com/40".to_string(),
            group_avatar_url: "https://via.placeholder.com/40?text=Group".to_string(),
        }
    }
}

impl DefaultAssets {
    pub fn avatar_for(&self, is_group: bool) -> &str {
        if is_group {
            &self.group_avatar_url
        } else {
            &self.avatar_url
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Bearer credential. Absence blocks all fetch/send operations and is
    /// surfaced as a standing error rather than retried.
    pub token: Option<String>,
    pub user_id: u64,
    pub user_name: String,
    pub poll_interval_secs: u64,
    pub conversations_page_size: u32,
    pub messages_page_size: u32,
    pub post_send_refresh_delay_ms: u64,
    pub post_create_group_refresh_delay_ms: u64,
    pub assets: DefaultAssets,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            token: None,
            user_id: 0,
            user_name: "You".to_string(),
            poll_interval_secs: 5,
            conversations_page_size: 20,
            messages_page_size: 10,
            post_send_refresh_delay_ms: 500,
            post_create_group_refresh_delay_ms: 2000,
            assets: DefaultAssets::default(),
        }
    }
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn post_send_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.post_send_refresh_delay_ms)
    }

    pub fn post_create_group_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.post_create_group_refresh_delay_ms)
    }

    /// Load a JSON config file; missing fields fall back to defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
