//! Pure helpers for the issue-comment PR bridge.
//! This crate owns command parsing, prompt rendering, change-set extraction and
//! validation, and issue-comment rendering; it performs no I/O.

pub mod change_set;
pub mod github_transport_helpers;
pub mod issue_command_parser;
pub mod issue_prompt_helpers;
pub mod issue_render;
pub mod issue_runtime_helpers;
pub mod path_policy;
