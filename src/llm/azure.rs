use crate::config::DeploymentConfig;
use crate::error::ServiceError;
use crate::models::chat::first_choice_message;
use log::{ debug, error, info, warn };
use reqwest::Client as HttpClient;
use serde_json::Value;
use url::Url;

const API_KEY_HEADER: &str = "api-key";

struct ResolvedDeployment<'a> {
    label: &'a str,
    endpoint: &'a str,
    deployment: &'a str,
    api_version: &'a str,
    api_key: &'a str,
}

fn resolve(target: &DeploymentConfig) -> Result<ResolvedDeployment<'_>, ServiceError> {
    match (&target.endpoint, &target.deployment, &target.api_version, &target.api_key) {
        (Some(endpoint), Some(deployment), Some(api_version), Some(api_key)) =>
            Ok(ResolvedDeployment {
                label: &target.label,
                endpoint,
                deployment,
                api_version,
                api_key,
            }),
        _ => {
            error!("Missing {} configuration: {}", target.label, target.missing().join(", "));
            Err(ServiceError::Configuration(format!("{} is not properly configured", target.label)))
        }
    }
}

fn build_completion_url(target: &ResolvedDeployment<'_>) -> Result<Url, ServiceError> {
    let invalid = |reason: String| {
        ServiceError::Configuration(format!("{} endpoint is invalid: {}", target.label, reason))
    };

    let mut url = Url::parse(target.endpoint).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base URL".to_string()))?
        .pop_if_empty()
        .extend(&["openai", "deployments", target.deployment, "chat", "completions"]);
    url.query_pairs_mut().append_pair("api-version", target.api_version);
    Ok(url)
}

/// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={version}`
pub fn completion_url(target: &DeploymentConfig) -> Result<Url, ServiceError> {
    build_completion_url(&resolve(target)?)
}

/// Pass-through client for Azure OpenAI chat completions. The same client
/// serves every deployment; the target settings are passed per call.
#[derive(Clone)]
pub struct AzureOpenAiProxy {
    http: HttpClient,
}

impl AzureOpenAiProxy {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Forwards `payload` unchanged and returns the upstream JSON.
    ///
    /// Settings are checked before anything is sent. A non-2xx upstream
    /// answer comes back as `ServiceError::Upstream` with its status and body.
    pub async fn chat(
        &self,
        target: &DeploymentConfig,
        payload: &Value
    ) -> Result<Value, ServiceError> {
        let resolved = resolve(target)?;
        let url = build_completion_url(&resolved)?;

        info!("Sending request to {} deployment '{}'", resolved.label, resolved.deployment);
        debug!("Request body: {}", payload);

        let resp = self.http
            .post(url)
            .header(API_KEY_HEADER, resolved.api_key)
            .json(payload)
            .send().await
            .map_err(|e| {
                error!("{} request failed: {}", resolved.label, e);
                ServiceError::from_transport(resolved.label, e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text().await
                .unwrap_or_else(|e| format!("<failed to read error body: {}>", e));
            error!("{} API error: {} {}", resolved.label, status, body);
            return Err(ServiceError::Upstream {
                service: resolved.label.to_string(),
                status: Some(status.as_u16()),
                body,
            });
        }

        let data = resp.json::<Value>().await.map_err(|e| {
            error!("{} returned a body that is not JSON: {}", resolved.label, e);
            ServiceError::from_transport(resolved.label, e)
        })?;

        if first_choice_message(&data).is_none() {
            warn!("{} response contained no choices; relaying as-is", resolved.label);
        } else {
            info!("{} response received successfully", resolved.label);
        }
        Ok(data)
    }
}
