pub mod azure;

use crate::config::{ DeploymentConfig, ServiceConfig };
use std::fmt;
use std::str::FromStr;

/// Which upstream deployment a chat request is routed to, named by the
/// last segment of its `/api/azure-openai/*` route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiTarget {
    General,
    Brokerage,
}

impl AiTarget {
    pub fn config<'a>(&self, config: &'a ServiceConfig) -> &'a DeploymentConfig {
        match self {
            AiTarget::General => &config.general,
            AiTarget::Brokerage => &config.brokerage,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseAiTargetError {
    message: String,
}

impl fmt::Display for ParseAiTargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseAiTargetError {}

impl FromStr for AiTarget {
    type Err = ParseAiTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(AiTarget::General),
            "brokerage" => Ok(AiTarget::Brokerage),
            _ =>
                Err(ParseAiTargetError {
                    message: format!("Unknown chat route: '{}'", s),
                }),
        }
    }
}

impl fmt::Display for AiTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiTarget::General => write!(f, "general"),
            AiTarget::Brokerage => write!(f, "brokerage"),
        }
    }
}
