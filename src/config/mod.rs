pub mod client;

use crate::cli::Args;
use log::{ info, warn };
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Settings for one Azure OpenAI chat deployment.
///
/// Fields stay optional so an incomplete target can still be served a
/// configuration error per request instead of refusing to boot.
#[derive(Clone, Default)]
pub struct DeploymentConfig {
    pub label: String,
    pub endpoint: Option<String>,
    pub deployment: Option<String>,
    pub api_version: Option<String>,
    pub api_key: Option<String>,
}

impl DeploymentConfig {
    pub fn new(
        label: &str,
        endpoint: Option<String>,
        deployment: Option<String>,
        api_version: Option<String>,
        api_key: Option<String>
    ) -> Self {
        Self {
            label: label.to_string(),
            endpoint: non_empty(endpoint),
            deployment: non_empty(deployment),
            api_version: non_empty(api_version),
            api_key: non_empty(api_key),
        }
    }

    /// Names of the settings that are still unset.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.endpoint.is_none() {
            missing.push("endpoint");
        }
        if self.deployment.is_none() {
            missing.push("deployment name");
        }
        if self.api_version.is_none() {
            missing.push("api version");
        }
        if self.api_key.is_none() {
            missing.push("api key");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

// Keys must never end up in logs.
impl fmt::Debug for DeploymentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentConfig")
            .field("label", &self.label)
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadLayout {
    /// The `ConversationRecord` as built from the request.
    Record,
    /// The flattened snapshot shape (`conversationState`, `messageCount`, ...).
    Snapshot,
}

impl FromStr for PayloadLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "record" => Ok(PayloadLayout::Record),
            "snapshot" => Ok(PayloadLayout::Snapshot),
            _ => Err(format!("Unsupported payload layout: '{}'", s)),
        }
    }
}

/// Where a conversation save function lives.
#[derive(Clone)]
pub struct FunctionEndpoint {
    pub url: String,
    pub key: Option<String>,
    pub layout: PayloadLayout,
}

impl fmt::Debug for FunctionEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionEndpoint")
            .field("url", &self.url)
            .field("key", &self.key.as_ref().map(|_| "<set>"))
            .field("layout", &self.layout)
            .finish()
    }
}

/// Immutable process configuration, built once at startup and passed to
/// every component that needs it.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub general: DeploymentConfig,
    pub brokerage: DeploymentConfig,
    pub conversation_function: Option<FunctionEndpoint>,
    pub mirror_function: Option<FunctionEndpoint>,
    pub upstream_timeout: Duration,
    pub environment: String,
    pub public_api_url: String,
}

impl ServiceConfig {
    pub fn from_args(args: &Args) -> Result<Self, String> {
        let general = DeploymentConfig::new(
            "Azure OpenAI",
            args.azure_openai_endpoint.clone(),
            args.azure_openai_deployment.clone(),
            args.azure_openai_api_version.clone(),
            args.azure_openai_api_key.clone()
        );
        let brokerage = DeploymentConfig::new(
            "Brokerage OpenAI",
            args.brokerage_openai_endpoint.clone(),
            args.brokerage_openai_deployment.clone(),
            args.brokerage_openai_api_version.clone(),
            args.brokerage_openai_api_key.clone()
        );

        let conversation_function = first_configured(
            args.conversation_function_url.as_deref(),
            args.legacy_conversation_function_url.as_deref()
        ).map(|url| FunctionEndpoint {
            url,
            key: first_configured(
                args.conversation_function_key.as_deref(),
                args.legacy_conversation_function_key.as_deref()
            ),
            layout: PayloadLayout::Record,
        });

        let mirror_layout: PayloadLayout = args.mirror_function_layout.parse()?;
        let mirror_function = non_empty(args.mirror_function_url.clone()).map(|url| FunctionEndpoint {
            url,
            key: non_empty(args.mirror_function_key.clone()),
            layout: mirror_layout,
        });

        Ok(Self {
            general,
            brokerage,
            conversation_function,
            mirror_function,
            upstream_timeout: Duration::from_secs(args.upstream_timeout_secs.max(1)),
            environment: args.environment.clone(),
            public_api_url: args.public_api_url.clone(),
        })
    }

    /// The authoritative save endpoint and the optional best-effort mirror.
    ///
    /// A mirror configured without a primary is the only persistence there
    /// is, so it is promoted to primary with its own layout.
    pub fn save_endpoints(&self) -> (Option<&FunctionEndpoint>, Option<&FunctionEndpoint>) {
        match (&self.conversation_function, &self.mirror_function) {
            (Some(primary), mirror) => (Some(primary), mirror.as_ref()),
            (None, mirror) => (mirror.as_ref(), None),
        }
    }

    /// Logs the resolved configuration and warns about targets that will
    /// answer every request with a configuration error.
    pub fn log_summary(&self) {
        info!("--- Gateway Configuration ---");
        info!("Environment: {}", self.environment);
        info!("Upstream Timeout: {:?}", self.upstream_timeout);
        for target in [&self.general, &self.brokerage] {
            if target.is_complete() {
                info!(
                    "{} target: {} (deployment {}, api-version {})",
                    target.label,
                    target.endpoint.as_deref().unwrap_or_default(),
                    target.deployment.as_deref().unwrap_or_default(),
                    target.api_version.as_deref().unwrap_or_default()
                );
            } else {
                warn!(
                    "{} target is NOT fully configured (missing: {}). Its proxy route will return 500.",
                    target.label,
                    target.missing().join(", ")
                );
            }
        }
        let (primary, mirror) = self.save_endpoints();
        match primary {
            Some(f) => info!(
                "Conversation save function: {} ({:?} layout, key configured: {})",
                f.url,
                f.layout,
                f.key.is_some()
            ),
            None => warn!("No conversation save function configured; conversations will not be persisted."),
        }
        if let Some(f) = mirror {
            info!("Mirror save function: {} ({:?} layout, key configured: {})", f.url, f.layout, f.key.is_some());
        }
        info!("-----------------------------");
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Returns the primary value if it is set, otherwise the legacy one.
/// Blank strings count as unset.
pub fn first_configured(primary: Option<&str>, legacy: Option<&str>) -> Option<String> {
    non_empty(primary.map(str::to_owned)).or_else(|| non_empty(legacy.map(str::to_owned)))
}
