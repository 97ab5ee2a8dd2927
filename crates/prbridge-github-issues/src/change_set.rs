//! Extraction and fail-closed validation of model-proposed change-sets.
//!
//! A [`ValidatedChangeSet`] can only be obtained from [`validate_change_set`],
//! so anything that mutates the repository is unreachable on a rejected batch.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::path_policy::PathAllowlist;

pub const DEFAULT_PULL_REQUEST_TITLE: &str = "AI PR";
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore: AI changes";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates supported `ChangeSetError` values.
pub enum ChangeSetError {
    #[error("No JSON object found in model output.")]
    NoJsonObject,
    #[error("invalid JSON in model output: {0}")]
    InvalidJson(String),
    #[error("model output JSON must be an object")]
    NotAnObject,
    #[error("`{field}` must be a string")]
    InvalidField { field: &'static str },
    #[error("`changes` must be a non-empty list.")]
    EmptyChanges,
    #[error("each change must be an object (change #{index} is not).")]
    EntryNotObject { index: usize },
    #[error("invalid change entry #{index}: {reason}")]
    InvalidEntry { index: usize, reason: String },
    #[error("Path not allowed: {path} (allowed: {allowed})")]
    PathNotAllowed { path: String, allowed: String },
    #[error("Invalid path: {path} ({reason})")]
    InvalidPath { path: String, reason: &'static str },
    #[error("missing `content` for {path}")]
    MissingContent { path: String },
    #[error("`content` for {path} must be a string")]
    InvalidContent { path: String },
}

impl ChangeSetError {
    /// True when no JSON object could be recovered from the model output at all.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            Self::NoJsonObject | Self::InvalidJson(_) | Self::NotAnObject
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `ChangeAction` values.
pub enum ChangeAction {
    Upsert { content: String },
    Delete,
}

impl ChangeAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Upsert { .. } => "upsert",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `ChangeEntry` used across bridge components.
pub struct ChangeEntry {
    pub path: String,
    pub action: ChangeAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A change-set whose every entry passed schema and allowlist validation.
pub struct ValidatedChangeSet {
    title: String,
    body: String,
    commit_message: String,
    changes: Vec<ChangeEntry>,
}

impl ValidatedChangeSet {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn commit_message(&self) -> &str {
        &self.commit_message
    }

    pub fn changes(&self) -> &[ChangeEntry] {
        &self.changes
    }
}

fn first_object_span_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex must compile"))
}

/// Parses model text as JSON, falling back to the outermost `{...}` span when
/// the object is wrapped in prose or code fences.
pub fn extract_change_set_document(text: &str) -> Result<Map<String, Value>, ChangeSetError> {
    let text = text.trim();
    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(_) => {
            let span = first_object_span_regex()
                .find(text)
                .ok_or(ChangeSetError::NoJsonObject)?;
            serde_json::from_str::<Value>(span.as_str())
                .map_err(|error| ChangeSetError::InvalidJson(error.to_string()))?
        }
    };
    match value {
        Value::Object(document) => Ok(document),
        _ => Err(ChangeSetError::NotAnObject),
    }
}

/// Validates the whole batch, stopping at the first violation.
pub fn validate_change_set(
    document: &Map<String, Value>,
    allowlist: &PathAllowlist,
) -> Result<ValidatedChangeSet, ChangeSetError> {
    let entries = match document.get("changes") {
        Some(Value::Array(entries)) if !entries.is_empty() => entries,
        _ => return Err(ChangeSetError::EmptyChanges),
    };

    let mut changes = Vec::with_capacity(entries.len());
    for (offset, entry) in entries.iter().enumerate() {
        changes.push(validate_change_entry(offset + 1, entry, allowlist)?);
    }

    // Entry violations are reported before header field violations.
    let title = optional_string_field(document, "title")?
        .filter(|title| !title.is_empty())
        .unwrap_or(DEFAULT_PULL_REQUEST_TITLE)
        .to_string();
    let body = optional_string_field(document, "body")?
        .unwrap_or_default()
        .to_string();
    let commit_message = optional_string_field(document, "commit_message")?
        .filter(|message| !message.is_empty())
        .unwrap_or(DEFAULT_COMMIT_MESSAGE)
        .to_string();

    Ok(ValidatedChangeSet {
        title,
        body,
        commit_message,
        changes,
    })
}

/// Extraction followed by validation.
pub fn parse_and_validate_change_set(
    text: &str,
    allowlist: &PathAllowlist,
) -> Result<ValidatedChangeSet, ChangeSetError> {
    let document = extract_change_set_document(text)?;
    validate_change_set(&document, allowlist)
}

fn validate_change_entry(
    index: usize,
    entry: &Value,
    allowlist: &PathAllowlist,
) -> Result<ChangeEntry, ChangeSetError> {
    let Value::Object(entry) = entry else {
        return Err(ChangeSetError::EntryNotObject { index });
    };

    let path = entry
        .get("path")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if path.is_empty() {
        return Err(ChangeSetError::InvalidEntry {
            index,
            reason: "`path` must be a non-empty string".to_string(),
        });
    }
    let action = entry
        .get("action")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if action != "upsert" && action != "delete" {
        return Err(ChangeSetError::InvalidEntry {
            index,
            reason: format!("`action` for {path} must be \"upsert\" or \"delete\""),
        });
    }

    let decision = allowlist.evaluate(path);
    if !decision.accepted {
        return Err(match decision.reason_code {
            "deny_parent_traversal" => ChangeSetError::InvalidPath {
                path: path.to_string(),
                reason: "parent-directory traversal is not allowed",
            },
            "deny_absolute_path" => ChangeSetError::InvalidPath {
                path: path.to_string(),
                reason: "absolute paths are not allowed",
            },
            "deny_control_character" => ChangeSetError::InvalidPath {
                path: path.escape_debug().to_string(),
                reason: "control characters are not allowed",
            },
            "deny_missing_file_name" => ChangeSetError::InvalidPath {
                path: path.to_string(),
                reason: "path must name a file",
            },
            _ => ChangeSetError::PathNotAllowed {
                path: path.to_string(),
                allowed: allowlist.display_list(),
            },
        });
    }

    let action = if action == "delete" {
        ChangeAction::Delete
    } else {
        match entry.get("content") {
            None | Some(Value::Null) => {
                return Err(ChangeSetError::MissingContent {
                    path: path.to_string(),
                })
            }
            Some(Value::String(content)) => ChangeAction::Upsert {
                content: content.clone(),
            },
            Some(_) => {
                return Err(ChangeSetError::InvalidContent {
                    path: path.to_string(),
                })
            }
        }
    };

    Ok(ChangeEntry {
        path: path.to_string(),
        action,
    })
}

fn optional_string_field<'a>(
    document: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a str>, ChangeSetError> {
    match document.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.trim())),
        Some(_) => Err(ChangeSetError::InvalidField { field }),
    }
}
