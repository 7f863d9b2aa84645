use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Top-level error type returned by the metadata registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Validation failed for one or more inputs. Nothing was mutated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The referenced object, field or record does not exist.
    #[error("{kind} '{key}' not found")]
    NotFound { kind: EntityKind, key: String },
}

impl RegistryError {
    pub fn not_found(kind: EntityKind, key: impl Into<String>) -> Self {
        Self::NotFound { kind, key: key.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns the validation issues carried by this error, if any.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Validation(err) => &err.issues,
            Self::NotFound { .. } => &[],
        }
    }
}

/// Kind of registry entity named in a [`RegistryError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Object,
    Field,
    Record,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Object => "object",
            Self::Field => "field",
            Self::Record => "record",
        })
    }
}

/// Collection of validation issues encountered while preparing a mutation.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{}", summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    if issues.is_empty() {
        return "validation failed".to_string();
    }
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.field, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if any issue carries the given code.
    pub fn has_code(&self, code: &str) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }

    /// Converts accumulated issues into a result: `Ok` when there are none.
    pub fn into_result(issues: Vec<ValidationIssue>) -> ValidationResult<()> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Self::new(issues))
        }
    }
}

/// Detailed validation failure for a single field or logical path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Re-roots the issue under a parent path, e.g. `options` -> `Status__c.options`.
    pub fn under(mut self, parent: &str) -> Self {
        self.field = format!("{parent}.{}", self.field);
        self
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

pub type RegistryResult<T> = Result<T, RegistryError>;
