//! Structured error types shared across ITC crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`ItcError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (experiment names, quantities, paths).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the ITC toolkit.
///
/// Planning-time failures (`Unit`, `Plan`) are raised synchronously at the
/// operation that detects them. Inference-time failures (`Model`, `Isotherm`,
/// `Sampler`) are fatal for the affected titration only; batch drivers catch
/// them at the experiment boundary. A MAP fit that fails to converge is not an
/// error and is reported through `MapFit::converged` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum ItcError {
    /// Arithmetic combined incompatible physical dimensions.
    #[error("unit error: {0}")]
    Unit(ErrorInfo),
    /// The concentration solver or rescaler cannot satisfy its constraints.
    #[error("planning error: {0}")]
    Plan(ErrorInfo),
    /// An inference model could not be built from experiment metadata.
    #[error("model error: {0}")]
    Model(ErrorInfo),
    /// The binding-heat function was evaluated at an invalid state.
    #[error("isotherm error: {0}")]
    Isotherm(ErrorInfo),
    /// Sampler state errors (bad configuration, corrupt resume state).
    #[error("sampler error: {0}")]
    Sampler(ErrorInfo),
    /// Serialization, deserialization, and file I/O errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        let mut separator = " {";
        for (key, value) in &self.context {
            write!(f, "{separator}{key}={value}")?;
            separator = ", ";
        }
        if !self.context.is_empty() {
            f.write_str("}")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

impl ItcError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            ItcError::Unit(info)
            | ItcError::Plan(info)
            | ItcError::Model(info)
            | ItcError::Isotherm(info)
            | ItcError::Sampler(info)
            | ItcError::Serde(info) => info,
        }
    }
}
