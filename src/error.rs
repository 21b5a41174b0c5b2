use serde::{Serialize, Deserialize};
use std::fmt;

/// Unified error type for the whole PhyEM crate.
/// Collaborator modules return Result<T, PhyemError>; the lesson core never fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhyemError {
    pub message: String,
    pub stage: String,
    pub collaborator: Option<String>,
    pub context: Option<String>,
    pub source: Option<String>,
}

impl PhyemError {
    /// Create a new error with stage and message
    pub fn new<S: Into<String>>(message: S, stage: &'static str) -> Self {
        PhyemError {
            message: message.into(),
            stage: stage.to_string(),
            collaborator: None,
            context: None,
            source: None,
        }
    }

    /// Name the external collaborator that failed (report store, tutor, cloud sync...)
    pub fn with_collaborator<S: Into<String>>(mut self, collaborator: S) -> Self {
        self.collaborator = Some(collaborator.into());
        self
    }

    /// Add additional context information
    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add source error information
    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for PhyemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)?;
        if let Some(ref collaborator) = self.collaborator {
            write!(f, " (collaborator: {})", collaborator)?;
        }
        if let Some(ref context) = self.context {
            write!(f, " (context: {})", context)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (source: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for PhyemError {}

/// Rejections raised while building validated input values at the UI boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("learner name must not be empty")]
    EmptyName,
    #[error("student id must not be empty")]
    EmptyStudentId,
    #[error("star rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),
    #[error("unknown material '{0}'")]
    UnknownMaterial(String),
}

impl From<ValidationError> for PhyemError {
    fn from(err: ValidationError) -> Self {
        PhyemError::new(err.to_string(), "validation")
    }
}

impl From<anyhow::Error> for PhyemError {
    fn from(err: anyhow::Error) -> Self {
        PhyemError::new(
            err.to_string(),
            "unknown"
        ).with_source("anyhow")
    }
}

impl From<std::io::Error> for PhyemError {
    fn from(err: std::io::Error) -> Self {
        PhyemError::new(
            format!("I/O error: {}", err),
            "io"
        ).with_source("std::io")
    }
}

impl From<serde_json::Error> for PhyemError {
    fn from(err: serde_json::Error) -> Self {
        PhyemError::new(
            format!("JSON error: {}", err),
            "json_parse"
        ).with_source("serde_json")
    }
}

impl From<toml::de::Error> for PhyemError {
    fn from(err: toml::de::Error) -> Self {
        PhyemError::new(
            format!("TOML error: {}", err),
            "config"
        ).with_source("toml")
    }
}

impl From<reqwest::Error> for PhyemError {
    fn from(err: reqwest::Error) -> Self {
        PhyemError::new(
            format!("HTTP error: {}", err),
            "http"
        ).with_source("reqwest")
    }
}

impl From<tokio::time::error::Elapsed> for PhyemError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        PhyemError::new(
            "Operation timed out",
            "timeout"
        ).with_source("tokio::time")
    }
}
