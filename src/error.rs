use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use axum::Json;
use serde_json::{ json, Value };

/// Failure of a gateway operation.
///
/// `Validation` and `Configuration` are always raised before any outbound call.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        /// What the caller actually sent, kept for diagnostics.
        received: Value,
    },

    /// The body could not be read as JSON at all (wrong content type, too large).
    #[error("{message}")]
    UnreadableBody {
        status: StatusCode,
        message: String,
    },

    #[error("{0}")]
    Configuration(String),

    #[error("{service} returned {}: {body}", status_text(.status))]
    Upstream {
        service: String,
        status: Option<u16>,
        body: String,
    },

    #[error("{service} did not respond in time")]
    Timeout {
        service: String,
    },

    #[error("{0}")]
    Unexpected(String),
}

fn status_text(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no response".to_string(),
    }
}

impl ServiceError {
    pub fn validation(message: impl Into<String>, received: Value) -> Self {
        ServiceError::Validation { message: message.into(), received }
    }

    /// Maps a transport-level failure from the HTTP client.
    pub fn from_transport(service: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout { service: service.to_string() }
        } else if err.is_decode() {
            ServiceError::Unexpected(format!("{} sent an unreadable response: {}", service, err))
        } else {
            ServiceError::Upstream {
                service: service.to_string(),
                status: err.status().map(|s| s.as_u16()),
                body: err.to_string(),
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation { .. } => StatusCode::BAD_REQUEST,
            ServiceError::UnreadableBody { status, .. } => *status,
            ServiceError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Upstream { status: Some(code), .. } =>
                StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY),
            ServiceError::Upstream { status: None, .. } => StatusCode::BAD_GATEWAY,
            ServiceError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ServiceError::Validation { message, .. } => json!({ "error": message }),
            ServiceError::UnreadableBody { message, .. } => json!({ "error": message }),
            ServiceError::Configuration(message) =>
                json!({
                    "error": "Server configuration error",
                    "message": message,
                }),
            ServiceError::Upstream { service, status: Some(code), body } =>
                json!({
                    "error": format!("{} API error", service),
                    "status": code,
                    "message": body,
                }),
            ServiceError::Upstream { service, status: None, body } =>
                json!({
                    "error": format!("{} is unreachable", service),
                    "message": body,
                }),
            ServiceError::Timeout { .. } =>
                json!({
                    "error": "Upstream timeout",
                    "message": self.to_string(),
                }),
            ServiceError::Unexpected(message) =>
                json!({
                    "error": "Internal server error",
                    "message": message,
                }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_is_relayed() {
        let err = ServiceError::Upstream {
            service: "Azure OpenAI".into(),
            status: Some(429),
            body: "slow down".into(),
        };
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.to_string(), "Azure OpenAI returned 429: slow down");
    }

    #[test]
    fn unreachable_upstream_is_bad_gateway() {
        let err = ServiceError::Upstream {
            service: "Conversation save function".into(),
            status: None,
            body: "connection refused".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("no response"));
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ServiceError::validation("Invalid messages format", json!("nope"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid messages format");
    }
}
