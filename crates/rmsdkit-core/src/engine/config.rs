use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_THRESHOLD: f64 = 2.0;
pub const DEFAULT_CUTOFF: f64 = 2.0;
pub const DEFAULT_MAX_CYCLES: usize = 5;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("Unknown method '{0}'. Expected one of: default, kabsch, robust, external")]
    UnknownMethod(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Structured first-model read, falling back to [`Method::Kabsch`] on any failure.
    #[default]
    Default,
    Kabsch,
    Robust,
    External,
}

impl Method {
    pub const ALL: [Method; 4] = [Self::Default, Self::Kabsch, Self::Robust, Self::External];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Kabsch => "kabsch",
            Self::Robust => "robust",
            Self::External => "external",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == needle)
            .ok_or_else(|| ConfigError::UnknownMethod(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobustConfig {
    pub cutoff: f64,
    pub max_cycles: usize,
}

impl Default for RobustConfig {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonConfig {
    pub method: Method,
    pub threshold: f64,
    pub robust: RobustConfig,
    pub chain_reference: Option<String>,
    pub chain_candidate: Option<String>,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            method: Method::default(),
            threshold: DEFAULT_THRESHOLD,
            robust: RobustConfig::default(),
            chain_reference: None,
            chain_candidate: None,
        }
    }
}

#[derive(Default)]
pub struct ComparisonConfigBuilder {
    method: Option<Method>,
    threshold: Option<f64>,
    cutoff: Option<f64>,
    max_cycles: Option<usize>,
    chain_reference: Option<String>,
    chain_candidate: Option<String>,
}

impl ComparisonConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }
    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
    pub fn max_cycles(mut self, cycles: usize) -> Self {
        self.max_cycles = Some(cycles);
        self
    }
    pub fn chain_reference(mut self, chain: Option<String>) -> Self {
        self.chain_reference = chain;
        self
    }
    pub fn chain_candidate(mut self, chain: Option<String>) -> Self {
        self.chain_candidate = chain;
        self
    }

    pub fn build(self) -> Result<ComparisonConfig, ConfigError> {
        let threshold = self.threshold.unwrap_or(DEFAULT_THRESHOLD);
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(ConfigError::InvalidValue {
                name: "threshold",
                reason: format!("must be a non-negative finite number, got {threshold}"),
            });
        }
        let cutoff = self.cutoff.unwrap_or(DEFAULT_CUTOFF);
        if !(cutoff.is_finite() && cutoff > 0.0) {
            return Err(ConfigError::InvalidValue {
                name: "cutoff",
                reason: format!("must be a positive finite number, got {cutoff}"),
            });
        }
        let max_cycles = self.max_cycles.unwrap_or(DEFAULT_MAX_CYCLES);
        if max_cycles == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_cycles",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(ComparisonConfig {
            method: self.method.unwrap_or_default(),
            threshold,
            robust: RobustConfig { cutoff, max_cycles },
            chain_reference: self.chain_reference,
            chain_candidate: self.chain_candidate,
        })
    }
}
