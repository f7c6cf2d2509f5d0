use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConversionError;

/// Routing type of a service. Each type is served by one registered executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    ContentOptimization,
    Analytics,
    Inference,
    Transcoding,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [ServiceType::ContentOptimization, ServiceType::Analytics, ServiceType::Inference, ServiceType::Transcoding];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::ContentOptimization => "content_optimization",
            ServiceType::Analytics => "analytics",
            ServiceType::Inference => "inference",
            ServiceType::Transcoding => "transcoding",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content_optimization" => Ok(ServiceType::ContentOptimization),
            "analytics" => Ok(ServiceType::Analytics),
            "inference" => Ok(ServiceType::Inference),
            "transcoding" => Ok(ServiceType::Transcoding),
            _ => Err(ConversionError::UnknownServiceType(s.to_string())),
        }
    }
}
