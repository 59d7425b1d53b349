// Domain model shared by the session store, chat manager and UI
//
// These types deserialize straight from backend JSON. All normalisation
// happens here: snake_case is canonical, camelCase spellings are aliases,
// ids may be strings or numbers, timestamps may be naive. Nothing past this
// module needs to care which variant the backend sent.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ─────────────────────────────────────────────────────────────────────────────
// Agent mode
// ─────────────────────────────────────────────────────────────────────────────

/// Routing hint attached to outgoing messages and stored on conversations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    #[default]
    General,
    Legal,
    Compliance,
    Risk,
}

impl AgentMode {
    /// All modes in picker order
    pub const ALL: [AgentMode; 4] = [
        AgentMode::General,
        AgentMode::Legal,
        AgentMode::Compliance,
        AgentMode::Risk,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Legal => "legal",
            Self::Compliance => "compliance",
            Self::Risk => "risk",
        }
    }

    /// Full persona name, used in headers and demo replies
    pub fn label(&self) -> &'static str {
        match self {
            Self::General => "General Assistant",
            Self::Legal => "Legal Expert",
            Self::Compliance => "Compliance Agent",
            Self::Risk => "Risk Analyst",
        }
    }

    /// Compact name for the agent picker
    pub fn short_label(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Legal => "Legal",
            Self::Compliance => "Comply",
            Self::Risk => "Risk",
        }
    }

    /// Next mode in picker order (wraps)
    pub fn next(self) -> Self {
        match self {
            Self::General => Self::Legal,
            Self::Legal => Self::Compliance,
            Self::Compliance => Self::Risk,
            Self::Risk => Self::General,
        }
    }

    /// Previous mode in picker order (wraps)
    pub fn prev(self) -> Self {
        match self {
            Self::General => Self::Risk,
            Self::Legal => Self::General,
            Self::Compliance => Self::Legal,
            Self::Risk => Self::Compliance,
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(Self::General),
            "legal" => Ok(Self::Legal),
            "compliance" => Ok(Self::Compliance),
            "risk" => Ok(Self::Risk),
            other => Err(format!(
                "unknown agent mode '{}' (expected general, legal, compliance or risk)",
                other
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// Account returned by `/auth/me`, `/auth/login` and `/auth/register`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "fullName")]
    pub full_name: Option<String>,
}

impl UserProfile {
    /// Full name, then email, then a placeholder
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ if !self.email.is_empty() => &self.email,
            _ => "Account",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Messages and conversations
// ─────────────────────────────────────────────────────────────────────────────

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript message
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(
        rename = "agent_type",
        alias = "agentType",
        default,
        deserialize_with = "agent_or_default"
    )]
    pub agent_mode: AgentMode,
    #[serde(
        alias = "createdAt",
        default = "Utc::now",
        deserialize_with = "flexible_timestamp"
    )]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A message built on this side of the wire
    pub fn local(id: String, role: Role, content: impl Into<String>, agent_mode: AgentMode) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            agent_mode,
            created_at: Utc::now(),
        }
    }
}

/// Sidebar row for one conversation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversationSummary {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "messageCount")]
    pub message_count: u32,
    #[serde(default, alias = "lastMessage")]
    pub last_message: Option<String>,
}

/// Full conversation with its messages
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversationDetail {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(
        rename = "agent_type",
        alias = "agentType",
        default,
        deserialize_with = "agent_or_none"
    )]
    pub agent_mode: Option<AgentMode>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Boundary deserializers
// ─────────────────────────────────────────────────────────────────────────────

/// Accept `"abc"`, `42` or `null` as an id
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!("invalid id: {}", other))),
    }
}

/// Like [`id_string`] but missing/null/empty becomes `None`
pub(crate) fn optional_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = id_string(deserializer)?;
    Ok(if id.is_empty() { None } else { Some(id) })
}

fn agent_or_default<'de, D>(deserializer: D) -> Result<AgentMode, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(agent_or_none(deserializer)?.unwrap_or_default())
}

fn agent_or_none<'de, D>(deserializer: D) -> Result<Option<AgentMode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// RFC 3339, or a naive ISO timestamp taken as UTC, or null (now)
fn flexible_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(Utc::now());
    };
    parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw)))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_agent_mode_parse_and_cycle() {
        assert_eq!("Legal".parse::<AgentMode>(), Ok(AgentMode::Legal));
        assert!("tax".parse::<AgentMode>().is_err());

        let mut mode = AgentMode::General;
        for _ in 0..AgentMode::ALL.len() {
            mode = mode.next();
        }
        assert_eq!(mode, AgentMode::General);
        assert_eq!(AgentMode::General.prev(), AgentMode::Risk);
    }

    #[test]
    fn test_message_snake_case() {
        let msg: Message = serde_json::from_value(json!({
            "id": 17,
            "role": "assistant",
            "content": "Section 27 of the Contract Act...",
            "agent_type": "legal",
            "created_at": "2025-03-01T10:15:00Z"
        }))
        .unwrap();

        assert_eq!(msg.id, "17");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.agent_mode, AgentMode::Legal);
        assert_eq!(msg.created_at.hour(), 10);
    }

    #[test]
    fn test_message_camel_case_and_naive_timestamp() {
        let msg: Message = serde_json::from_value(json!({
            "id": "m-1",
            "role": "user",
            "content": "hi",
            "agentType": "risk",
            "createdAt": "2025-03-01T10:15:00.123456"
        }))
        .unwrap();

        assert_eq!(msg.agent_mode, AgentMode::Risk);
        assert_eq!(msg.created_at.day(), 1);
    }

    #[test]
    fn test_message_defaults() {
        let msg: Message = serde_json::from_value(json!({
            "id": "m-2",
            "role": "assistant",
            "content": "ok",
            "agent_type": "astrology"
        }))
        .unwrap();

        // Unknown modes degrade to general rather than failing the payload
        assert_eq!(msg.agent_mode, AgentMode::General);
    }

    #[test]
    fn test_conversation_detail_agent_mode() {
        let detail: ConversationDetail = serde_json::from_value(json!({
            "id": 5,
            "title": "NDA review",
            "agentType": "compliance",
            "messages": []
        }))
        .unwrap();
        assert_eq!(detail.id, "5");
        assert_eq!(detail.agent_mode, Some(AgentMode::Compliance));

        let detail: ConversationDetail = serde_json::from_value(json!({"id": "c2"})).unwrap();
        assert_eq!(detail.agent_mode, None);
        assert!(detail.messages.is_empty());
    }

    #[test]
    fn test_summary_aliases() {
        let summary: ConversationSummary = serde_json::from_value(json!({
            "id": "c1",
            "title": "GST registration",
            "messageCount": 4,
            "lastMessage": "You must register once turnover exceeds..."
        }))
        .unwrap();
        assert_eq!(summary.message_count, 4);
        assert!(summary.last_message.is_some());
    }

    #[test]
    fn test_user_display_name() {
        let user: UserProfile = serde_json::from_value(json!({
            "id": 1,
            "email": "asha@firm.in",
            "full_name": "Asha Rao"
        }))
        .unwrap();
        assert_eq!(user.display_name(), "Asha Rao");

        let user: UserProfile =
            serde_json::from_value(json!({"id": "u2", "email": "x@y.in", "fullName": "  "}))
                .unwrap();
        assert_eq!(user.display_name(), "x@y.in");

        let user: UserProfile = serde_json::from_value(json!({})).unwrap();
        assert_eq!(user.display_name(), "Account");
    }
}
