mod function;
mod noop;

pub use function::FunctionStore;
pub use noop::NoopStore;

use async_trait::async_trait;
use crate::config::{ FunctionEndpoint, ServiceConfig };
use crate::error::ServiceError;
use crate::models::conversation::ConversationRecord;
use log::{ info, warn };
use serde::{ Deserialize, Serialize };
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    pub conversation_id: String,
}

/// Somewhere a finished conversation record can be handed off to.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn save(&self, record: &ConversationRecord) -> Result<SaveReceipt, ServiceError>;

    /// Short human-readable name used in log lines.
    fn describe(&self) -> String;
}

pub fn create_conversation_store(
    endpoint: Option<&FunctionEndpoint>,
    http: reqwest::Client
) -> Arc<dyn ConversationStore> {
    match endpoint {
        Some(endpoint) => Arc::new(FunctionStore::new(endpoint.clone(), http)),
        None => Arc::new(NoopStore),
    }
}

/// The authoritative store plus an optional best-effort mirror.
#[derive(Clone)]
pub struct ConversationArchive {
    primary: Arc<dyn ConversationStore>,
    mirror: Option<Arc<dyn ConversationStore>>,
}

impl ConversationArchive {
    pub fn new(
        primary: Arc<dyn ConversationStore>,
        mirror: Option<Arc<dyn ConversationStore>>
    ) -> Self {
        Self { primary, mirror }
    }

    pub fn from_config(config: &ServiceConfig, http: reqwest::Client) -> Self {
        let (primary, mirror) = config.save_endpoints();
        let primary = create_conversation_store(primary, http.clone());
        let mirror = mirror.map(|endpoint| create_conversation_store(Some(endpoint), http.clone()));
        info!(
            "Conversations will be stored in: {}{}",
            primary.describe(),
            mirror
                .as_ref()
                .map(|m| format!(" (mirrored to {})", m.describe()))
                .unwrap_or_default()
        );
        Self::new(primary, mirror)
    }

    /// Saves to the primary store. The mirror write only starts once the
    /// primary succeeded, runs detached, and cannot fail this call.
    pub async fn save(&self, record: ConversationRecord) -> Result<SaveReceipt, ServiceError> {
        let receipt = self.primary.save(&record).await?;

        if let Some(mirror) = self.mirror.clone() {
            tokio::spawn(async move {
                if let Err(e) = mirror.save(&record).await {
                    warn!(
                        "Mirror save to {} failed for conversation {}: {}",
                        mirror.describe(),
                        record.conversation_id,
                        e
                    );
                }
            });
        }

        Ok(receipt)
    }
}
