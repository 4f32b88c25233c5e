use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest accepted message, in characters
pub const MESSAGE_MIN_LENGTH: usize = 5;
/// Longest accepted message, in characters
pub const MESSAGE_MAX_LENGTH: usize = 140;

/// A short message with a like counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    pub id: Uuid,
    pub message: String,
    pub hearts: i64,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a thought
///
/// `message` is optional at the serde level so that a missing field is reported
/// through [`ValidationErrors`] instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CreateThoughtRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// A validated thought that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewThought {
    message: String,
}

/// Envelope returned by a successful like
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub success: bool,
    pub response: Thought,
}

/// Reason a single field failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldErrorKind {
    Required,
    MinLength,
    MaxLength,
    Invalid,
}

/// Field-level validation failure, keyed by field name inside [`ValidationErrors`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub message: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// All validation failures of one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for an error set holding exactly one field failure
    pub fn single(
        path: impl Into<String>,
        kind: FieldErrorKind,
        message: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        let mut errors = Self::new();
        errors.add(path, kind, message, value);
        errors
    }

    pub fn add(
        &mut self,
        path: impl Into<String>,
        kind: FieldErrorKind,
        message: impl Into<String>,
        value: Option<String>,
    ) {
        let path = path.into();
        self.fields.insert(
            path.clone(),
            FieldError {
                kind,
                message: message.into(),
                path,
                value,
            },
        );
    }

    pub fn get(&self, path: &str) -> Option<&FieldError> {
        self.fields.get(path)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.fields.values().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl CreateThoughtRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// Check the message bounds and turn the request into a [`NewThought`]
    pub fn validate(self) -> Result<NewThought, ValidationErrors> {
        let message = match self.message {
            Some(message) => message,
            None => {
                return Err(ValidationErrors::single(
                    "message",
                    FieldErrorKind::Required,
                    "Path `message` is required.",
                    None,
                ))
            }
        };

        let length = message.chars().count();
        if length < MESSAGE_MIN_LENGTH {
            return Err(ValidationErrors::single(
                "message",
                FieldErrorKind::MinLength,
                format!(
                    "Path `message` (`{}`) is shorter than the minimum allowed length ({}).",
                    message, MESSAGE_MIN_LENGTH
                ),
                Some(message),
            ));
        }

        if length > MESSAGE_MAX_LENGTH {
            return Err(ValidationErrors::single(
                "message",
                FieldErrorKind::MaxLength,
                format!(
                    "Path `message` is longer than the maximum allowed length ({}).",
                    MESSAGE_MAX_LENGTH
                ),
                Some(message),
            ));
        }

        // PostgreSQL text cannot hold NUL, so no store accepts it
        if message.contains('\0') {
            return Err(ValidationErrors::single(
                "message",
                FieldErrorKind::Invalid,
                "Path `message` must not contain NUL characters.",
                None,
            ));
        }

        Ok(NewThought { message })
    }
}

impl NewThought {
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Materialize the thought with a store-assigned id and creation instant
    pub fn into_thought(self, id: Uuid, created_at: DateTime<Utc>) -> Thought {
        Thought {
            id,
            message: self.message,
            hearts: 0,
            created_at,
        }
    }
}

/// Parse a path identifier into a thought id
pub fn parse_thought_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}
