use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Author of a persisted chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "AI")]
    Ai,
}

/// Role of a transcript turn as understood by the completion provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    System,
    User,
    Assistant,
}

impl From<Role> for TurnRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => TurnRole::User,
            Role::Ai => TurnRole::Assistant,
        }
    }
}

impl TurnRole {
    /// Wire name used in completion requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::System => "system",
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// Lifecycle of a transcript turn.
///
/// User turns start `Pending` and become `Answered` or `Failed` once the
/// completion call resolves. System and assistant turns are always `Answered`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Pending,
    Answered,
    Failed,
}

/// How an assistant reply is shaped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Final answer as text, steps attached as bullet points.
    #[default]
    BulletPoints,
    /// Focused elaboration; text chosen by [`ExplainFurtherText`].
    ExplainFurther,
}

/// Which part of the structured answer becomes the message text in
/// [`Mode::ExplainFurther`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplainFurtherText {
    /// The first step's explanation, or the final answer when no steps came back.
    #[default]
    FirstStep,
    /// The final answer, same as bullet-point mode.
    FinalAnswer,
}

// =============================================================================
// Structs
// =============================================================================

/// A structured sub-answer returned by the completion provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulletPoint {
    pub heading: String,
    pub explanation: String,
    pub output: String,
}

/// One message in a chat thread, as stored under `chats/{chatId}/messages`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet_points: Option<Vec<BulletPoint>>,
}

impl ChatMessage {
    /// A user message stamped with the current time.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            image_url: None,
            timestamp: Some(now_timestamp()),
            bullet_points: None,
        }
    }

    /// An assistant message stamped with the current time.
    pub fn ai(text: impl Into<String>, bullet_points: Vec<BulletPoint>) -> Self {
        Self {
            role: Role::Ai,
            text: text.into(),
            image_url: None,
            timestamp: Some(now_timestamp()),
            bullet_points: Some(bullet_points),
        }
    }

    /// Parsed timestamp, if present and well-formed.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

/// A conversation thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Store-assigned document id.
    #[serde(default)]
    pub id: String,
    /// Client-generated thread identifier used in message paths.
    pub chat_id: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// One turn of the transcript sent to the completion provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: Option<String>,
    pub status: TurnStatus,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::System,
            content: content.into(),
            timestamp: None,
            status: TurnStatus::Answered,
        }
    }
}

// =============================================================================
// Timestamps
// =============================================================================

/// Current time as an ISO-8601 string with millisecond precision, e.g.
/// `2024-03-01T12:00:00.000Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 / ISO-8601 timestamp into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Ai).unwrap(), "\"AI\"");
        let role: Role = serde_json::from_str("\"AI\"").unwrap();
        assert_eq!(role, Role::Ai);
    }

    #[test]
    fn test_role_maps_to_turn_role() {
        assert_eq!(TurnRole::from(Role::User), TurnRole::User);
        assert_eq!(TurnRole::from(Role::Ai), TurnRole::Assistant);
        assert_eq!(TurnRole::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_mode_default_is_bullet_points() {
        assert_eq!(Mode::default(), Mode::BulletPoints);
        let mode: Mode = serde_json::from_str("\"explainFurther\"").unwrap();
        assert_eq!(mode, Mode::ExplainFurther);
    }

    #[test]
    fn test_chat_message_field_names() {
        let mut msg = ChatMessage::ai(
            "A",
            vec![BulletPoint {
                heading: "Step 1".into(),
                explanation: "e1".into(),
                output: "o1".into(),
            }],
        );
        msg.image_url = Some("https://example.org/a.jpg".into());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "AI");
        assert_eq!(value["imageUrl"], "https://example.org/a.jpg");
        assert_eq!(value["bulletPoints"][0]["heading"], "Step 1");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_chat_message_optional_fields_omitted() {
        let msg = ChatMessage {
            role: Role::User,
            text: "hi".into(),
            image_url: None,
            timestamp: None,
            bullet_points: None,
        };
        let value = serde_json::to_value(&msg).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
    }

    #[test]
    fn test_chat_message_ignores_store_id() {
        let raw = r#"{"id":"doc-1","role":"user","text":"hello","timestamp":"2024-01-01T00:00:00.000Z"}"#;
        let msg: ChatMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.text, "hello");
        assert!(msg.parsed_timestamp().is_some());
    }

    #[test]
    fn test_bullet_point_rejects_unknown_fields() {
        let raw = r#"{"heading":"h","explanation":"e","output":"o","extra":1}"#;
        assert!(serde_json::from_str::<BulletPoint>(raw).is_err());
    }

    #[test]
    fn test_chat_serialization() {
        let chat = Chat {
            id: "doc".into(),
            chat_id: "abc".into(),
            created_at: "2024-01-01T00:00:00.000Z".into(),
            title: None,
        };
        let value = serde_json::to_value(&chat).unwrap();
        assert_eq!(value["chatId"], "abc");
        assert_eq!(value["createdAt"], "2024-01-01T00:00:00.000Z");
        assert!(value.get("title").is_none());
    }

    #[test]
    fn test_now_timestamp_parses() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(parse_timestamp(&ts).is_some());
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_system_turn_is_answered() {
        let turn = Turn::system("persona");
        assert_eq!(turn.role, TurnRole::System);
        assert_eq!(turn.status, TurnStatus::Answered);
        assert!(turn.timestamp.is_none());
    }
}
