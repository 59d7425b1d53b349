// Request and response bodies that only exist on the wire

use crate::model::{optional_id_string, AgentMode, Message, UserProfile};
use serde::{Deserialize, Serialize};

// Backend routes, relative to the API base
pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const ME_PATH: &str = "/auth/me";
pub const CONVERSATIONS_PATH: &str = "/chat/conversations";
pub const MESSAGES_PATH: &str = "/chat/messages";

/// Path of a single conversation
pub fn conversation_path(id: &str) -> String {
    format!("{}/{}", CONVERSATIONS_PATH, id)
}

/// Body of `POST /auth/register`
#[derive(Debug, Serialize)]
pub struct RegisterBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
}

/// Response of login and register
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    pub user: UserProfile,
}

/// Body of `POST /chat/messages`
#[derive(Debug, Serialize)]
pub struct SendMessageBody<'a> {
    pub content: &'a str,
    /// Serialized as `null` when starting a new conversation
    pub conversation_id: Option<&'a str>,
    pub agent_type: AgentMode,
}

/// Response of `POST /chat/messages`: the assistant reply, plus the id of the
/// conversation it was filed under
#[derive(Debug, Deserialize)]
pub struct SentMessage {
    #[serde(
        default,
        alias = "conversationId",
        deserialize_with = "optional_id_string"
    )]
    pub conversation_id: Option<String>,
    #[serde(flatten)]
    pub message: Message,
}

/// Form fields for `POST /auth/login` (OAuth2 password flow naming)
pub fn login_form(email: &str, password: &str) -> Vec<(String, String)> {
    vec![
        ("username".to_string(), email.to_string()),
        ("password".to_string(), password.to_string()),
    ]
}
