use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body of a channel feed request (`/channels/{id}/feeds.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    /// Channel description; unused beyond logging
    #[serde(default)]
    pub channel: Option<ChannelInfo>,

    /// Most recent entries, oldest first
    pub feeds: Vec<FeedEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelInfo {
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub last_entry_id: Option<u64>,
}

/// A single timestamped reading
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedEntry {
    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub entry_id: Option<u64>,

    /// `field1`..`field8` as sent by the provider (numbers or numeric strings)
    #[serde(flatten)]
    pub fields: HashMap<String, serde_json::Value>,
}

impl FeedEntry {
    /// Look up a field, treating JSON `null` as absent
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name).filter(|value| !value.is_null())
    }
}
