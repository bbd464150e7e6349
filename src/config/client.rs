use super::{ DeploymentConfig, ServiceConfig };
use serde::Serialize;

/// Browser-safe view of one chat target. Carries whether a key exists, never the key.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientTarget {
    pub endpoint: String,
    pub deployment_name: String,
    pub api_version: String,
    pub has_api_key: bool,
}

impl From<&DeploymentConfig> for ClientTarget {
    fn from(target: &DeploymentConfig) -> Self {
        Self {
            endpoint: target.endpoint.clone().unwrap_or_default(),
            deployment_name: target.deployment.clone().unwrap_or_default(),
            api_version: target.api_version.clone().unwrap_or_default(),
            has_api_key: target.api_key.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub azure_open_ai: ClientTarget,
    pub brokerage_open_ai: ClientTarget,
    pub api_url: String,
}

impl ClientConfig {
    pub fn from_service(config: &ServiceConfig) -> Self {
        Self {
            azure_open_ai: ClientTarget::from(&config.general),
            brokerage_open_ai: ClientTarget::from(&config.brokerage),
            api_url: config.public_api_url.clone(),
        }
    }
}
