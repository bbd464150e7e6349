use serde::{ Serialize, Deserialize };
use serde_json::{ Map, Value };

/// Shown to the user in place of raw error text when no reply could be produced.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, there was an error communicating with the service. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Anything else the client attached to the message, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into(), extra: Map::new() }
    }
}

/// Content of the last message with the given role, or `""`.
pub fn last_content_for(messages: &[ChatMessage], role: Role) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == role)
        .map(|m| m.content.clone())
        .unwrap_or_default()
}

/// `choices[0].message` of a chat-completion response, if there is one.
pub fn first_choice_message(response: &Value) -> Option<&Value> {
    response
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
}

/// The assistant reply carried by a completion response, or the fallback
/// message when the upstream generated nothing usable.
pub fn reply_or_fallback(response: &Value) -> ChatMessage {
    first_choice_message(response)
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(|content| ChatMessage::new(Role::Assistant, content))
        .unwrap_or_else(|| ChatMessage::new(Role::Assistant, FALLBACK_REPLY))
}
