use crate::error::ServiceError;
use crate::models::chat::{ last_content_for, ChatMessage, Role };
use chrono::{ SecondsFormat, Utc };
use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdOrigin {
    /// The caller sent an id; the save updates that conversation.
    Supplied,
    /// A fresh id was minted for a new conversation.
    Generated,
}

/// A conversation as handed to the save function. Lives only for the request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub conversation_id: String,
    pub user_id: String,
    pub user_email: String,
    pub chat_type: String,
    pub last_user_message: String,
    pub last_assistant_message: String,
    pub messages: Vec<ChatMessage>,
    pub total_tokens: u64,
    pub metadata: Map<String, Value>,
    pub timestamp: String,
    #[serde(skip)]
    pub id_origin: IdOrigin,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationFields {
    conversation_id: Option<String>,
    user_id: Option<String>,
    user_email: Option<String>,
    chat_type: Option<String>,
    total_tokens: Option<u64>,
    metadata: Option<Map<String, Value>>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ConversationRecord {
    /// Builds a record from a raw request body.
    ///
    /// `messages` must be a non-empty array of `{role, content}` objects.
    pub fn from_body(body: &Value) -> Result<Self, ServiceError> {
        let raw_messages = match body.get("messages") {
            Some(Value::Array(items)) if !items.is_empty() => items,
            other => {
                return Err(
                    ServiceError::validation(
                        "Invalid messages format",
                        other.cloned().unwrap_or(Value::Null)
                    )
                );
            }
        };

        let mut messages = Vec::with_capacity(raw_messages.len());
        for (index, raw) in raw_messages.iter().enumerate() {
            let message = ChatMessage::deserialize(raw).map_err(|e|
                ServiceError::validation(format!("Invalid message at index {}: {}", index, e), raw.clone())
            )?;
            messages.push(message);
        }

        let fields = ConversationFields::deserialize(body).map_err(|e|
            ServiceError::validation(format!("Invalid conversation fields: {}", e), body.clone())
        )?;

        let (conversation_id, id_origin) = match present(fields.conversation_id) {
            Some(id) => (id, IdOrigin::Supplied),
            None => (Uuid::new_v4().to_string(), IdOrigin::Generated),
        };

        Ok(Self {
            conversation_id,
            user_id: present(fields.user_id).unwrap_or_else(|| "anonymous".to_string()),
            user_email: fields.user_email.unwrap_or_default(),
            chat_type: present(fields.chat_type).unwrap_or_else(|| "general".to_string()),
            last_user_message: last_content_for(&messages, Role::User),
            last_assistant_message: last_content_for(&messages, Role::Assistant),
            messages,
            total_tokens: fields.total_tokens.unwrap_or(0),
            metadata: fields.metadata.unwrap_or_default(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            id_origin,
        })
    }

    pub fn is_new(&self) -> bool {
        self.id_origin == IdOrigin::Generated
    }
}

/// Flattened layout expected by the older save function.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSnapshot<'a> {
    pub conversation_id: &'a str,
    pub user_id: &'a str,
    pub user_email: &'a str,
    pub chat_type: &'a str,
    pub last_updated: &'a str,
    pub start_time: &'a str,
    pub message_count: usize,
    pub total_tokens: u64,
    pub conversation_state: &'a [ChatMessage],
    pub last_user_message: &'a str,
    pub last_assistant_message: &'a str,
    pub metadata: &'a Map<String, Value>,
}

impl<'a> From<&'a ConversationRecord> for ConversationSnapshot<'a> {
    fn from(record: &'a ConversationRecord) -> Self {
        Self {
            conversation_id: &record.conversation_id,
            user_id: &record.user_id,
            user_email: &record.user_email,
            chat_type: &record.chat_type,
            last_updated: &record.timestamp,
            start_time: &record.timestamp,
            message_count: record.messages.len(),
            total_tokens: record.total_tokens,
            conversation_state: &record.messages,
            last_user_message: &record.last_user_message,
            last_assistant_message: &record.last_assistant_message,
            metadata: &record.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn is_uuid_v4(id: &str) -> bool {
        let parts: Vec<&str> = id.split('-').collect();
        let lens: Vec<usize> = parts.iter().map(|p| p.len()).collect();
        lens == vec![8, 4, 4, 4, 12] &&
            id.chars().all(|c| c == '-' || c.is_ascii_digit() || ('a'..='f').contains(&c)) &&
            parts[2].starts_with('4') &&
            matches!(parts[3].chars().next(), Some('8' | '9' | 'a' | 'b'))
    }

    #[test]
    fn generates_v4_id_when_missing() {
        let record = ConversationRecord::from_body(
            &json!({ "messages": [{ "role": "user", "content": "hi" }] })
        ).unwrap();
        assert!(is_uuid_v4(&record.conversation_id), "{}", record.conversation_id);
        assert!(record.is_new());
    }

    #[test]
    fn echoes_supplied_id() {
        let body = json!({
            "conversationId": "conv-42",
            "messages": [{ "role": "user", "content": "hi" }]
        });
        let first = ConversationRecord::from_body(&body).unwrap();
        let second = ConversationRecord::from_body(&body).unwrap();
        assert_eq!(first.conversation_id, "conv-42");
        assert_eq!(second.conversation_id, "conv-42");
        assert_eq!(first.id_origin, IdOrigin::Supplied);
    }

    #[test]
    fn empty_id_counts_as_missing() {
        let record = ConversationRecord::from_body(
            &json!({ "conversationId": "", "messages": [{ "role": "user", "content": "hi" }] })
        ).unwrap();
        assert!(record.is_new());
        assert!(!record.conversation_id.is_empty());
    }

    #[test]
    fn derives_last_messages() {
        let record = ConversationRecord::from_body(
            &json!({
            "messages": [
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello" }
            ]
        })
        ).unwrap();
        assert_eq!(record.last_user_message, "hi");
        assert_eq!(record.last_assistant_message, "hello");
    }

    #[test]
    fn system_only_conversation_has_empty_last_messages() {
        let record = ConversationRecord::from_body(
            &json!({ "messages": [{ "role": "system", "content": "x" }] })
        ).unwrap();
        assert_eq!(record.last_user_message, "");
        assert_eq!(record.last_assistant_message, "");
    }

    #[test]
    fn applies_defaults() {
        let record = ConversationRecord::from_body(
            &json!({ "messages": [{ "role": "user", "content": "hi" }] })
        ).unwrap();
        assert_eq!(record.user_id, "anonymous");
        assert_eq!(record.user_email, "");
        assert_eq!(record.chat_type, "general");
        assert_eq!(record.total_tokens, 0);
        assert!(record.metadata.is_empty());
        assert!(record.timestamp.ends_with('Z'));
    }

    #[test]
    fn rejects_missing_or_non_array_messages() {
        for body in [
            json!({}),
            json!({ "messages": "hello" }),
            json!({ "messages": { "role": "user" } }),
            json!({ "messages": [] }),
            json!("not an object"),
        ] {
            match ConversationRecord::from_body(&body) {
                Err(ServiceError::Validation { message, .. }) =>
                    assert_eq!(message, "Invalid messages format"),
                other => panic!("expected validation error for {}, got {:?}", body, other),
            }
        }
    }

    #[test]
    fn keeps_received_value_for_diagnostics() {
        let err = ConversationRecord::from_body(&json!({ "messages": 7 })).unwrap_err();
        match err {
            ServiceError::Validation { received, .. } => assert_eq!(received, json!(7)),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_message_entries() {
        let err = ConversationRecord::from_body(
            &json!({ "messages": [{ "role": "user", "content": "ok" }, { "role": "robot", "content": "?" }] })
        ).unwrap_err();
        assert!(err.to_string().contains("index 1"), "{}", err);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let record = ConversationRecord::from_body(
            &json!({
            "conversationId": "abc",
            "userId": "u1",
            "totalTokens": 12,
            "metadata": { "source": "web" },
            "messages": [{ "role": "user", "content": "hi" }]
        })
        ).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["conversationId"], "abc");
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["totalTokens"], 12);
        assert_eq!(value["metadata"]["source"], "web");
        assert_eq!(value["lastUserMessage"], "hi");
        assert!(value.get("idOrigin").is_none());
    }

    #[test]
    fn snapshot_uses_flattened_layout() {
        let record = ConversationRecord::from_body(
            &json!({
            "messages": [
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello" }
            ]
        })
        ).unwrap();
        let value = serde_json::to_value(ConversationSnapshot::from(&record)).unwrap();
        assert_eq!(value["messageCount"], 2);
        assert_eq!(value["conversationState"][1]["content"], "hello");
        assert_eq!(value["lastUpdated"], value["startTime"]);
        assert!(value.get("messages").is_none());
    }
}
