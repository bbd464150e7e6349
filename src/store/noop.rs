use async_trait::async_trait;
use crate::error::ServiceError;
use crate::models::conversation::ConversationRecord;
use crate::store::{ ConversationStore, SaveReceipt };
use log::info;

/// Stand-in used when no save function is configured. Reports success
/// without persisting anything.
pub struct NoopStore;

#[async_trait]
impl ConversationStore for NoopStore {
    async fn save(&self, record: &ConversationRecord) -> Result<SaveReceipt, ServiceError> {
        info!(
            "No conversation save function configured, skipping save of {}",
            record.conversation_id
        );
        Ok(SaveReceipt { conversation_id: record.conversation_id.clone() })
    }

    fn describe(&self) -> String {
        "nowhere (no save function configured)".to_string()
    }
}
