use async_trait::async_trait;
use crate::config::{ FunctionEndpoint, PayloadLayout };
use crate::error::ServiceError;
use crate::models::conversation::{ ConversationRecord, ConversationSnapshot };
use crate::store::{ ConversationStore, SaveReceipt };
use log::{ debug, error, info, warn };
use reqwest::Client as HttpClient;

const SERVICE_NAME: &str = "Conversation save function";
const FUNCTION_KEY_HEADER: &str = "x-functions-key";

/// Persists conversations by POSTing them to an HTTP function endpoint.
/// One attempt per save; the function itself decides create vs. update by id.
pub struct FunctionStore {
    http: HttpClient,
    endpoint: FunctionEndpoint,
}

impl FunctionStore {
    pub fn new(endpoint: FunctionEndpoint, http: HttpClient) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl ConversationStore for FunctionStore {
    async fn save(&self, record: &ConversationRecord) -> Result<SaveReceipt, ServiceError> {
        info!(
            "Calling save function to {} conversation {}",
            if record.is_new() { "create" } else { "update" },
            record.conversation_id
        );

        let mut req = self.http.post(&self.endpoint.url);
        req = match self.endpoint.layout {
            PayloadLayout::Record => req.json(record),
            PayloadLayout::Snapshot => req.json(&ConversationSnapshot::from(record)),
        };
        if let Some(key) = &self.endpoint.key {
            req = req.header(FUNCTION_KEY_HEADER, key);
        }

        let resp = req.send().await.map_err(|e| {
            error!("Save function at {} unreachable: {}", self.endpoint.url, e);
            ServiceError::from_transport(SERVICE_NAME, e)
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text().await
                .unwrap_or_else(|e| format!("<failed to read error body: {}>", e));
            error!("Save function error: {} {}", status, body);
            return Err(ServiceError::Upstream {
                service: SERVICE_NAME.to_string(),
                status: Some(status.as_u16()),
                body,
            });
        }

        match resp.text().await {
            Ok(body) => debug!("Save function response ({}): {}", status, body),
            Err(e) => warn!("Save function answered {} but its body was unreadable: {}", status, e),
        }
        Ok(SaveReceipt { conversation_id: record.conversation_id.clone() })
    }

    fn describe(&self) -> String {
        format!("save function at {}", self.endpoint.url)
    }
}
