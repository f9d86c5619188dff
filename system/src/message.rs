use serde::{Deserialize, Serialize};

pub type ConnectionId = u32;
pub type RoomId = String;

/// Frames sent by a client. Unknown `type` tags fail to parse here and are
/// handled by the relay's fallback ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "identify")]
    Identify { username: String },
    #[serde(rename = "nick")]
    Nick { username: String },
    #[serde(rename = "chat")]
    Chat { text: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Confirms the committed name; sent only to the requester.
    #[serde(rename = "identity")]
    Identity { username: String },
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "chat")]
    Chat { user: String, text: String },
    #[serde(rename = "user_list")]
    UserList { users: Vec<String> },
    #[serde(rename = "count")]
    Count { count: usize },
}
