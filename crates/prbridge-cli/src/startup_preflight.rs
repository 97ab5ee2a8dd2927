use std::path::Path;

use anyhow::{bail, Context, Result};
use prbridge_github_issues::path_policy::PathAllowlist;
use prbridge_github_issues_runtime::RepoRef;
use serde::Deserialize;

use crate::cli_args::Cli;

#[derive(Debug, Default, Deserialize)]
/// The parts of an `issue_comment` webhook payload the bridge reads.
pub(crate) struct IssueCommentEvent {
    #[serde(default)]
    comment: Option<EventComment>,
    #[serde(default)]
    issue: Option<EventIssue>,
    #[serde(default)]
    repository: Option<EventRepository>,
}

#[derive(Debug, Deserialize)]
struct EventComment {
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventIssue {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct EventRepository {
    full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Fully resolved inputs for one bridge run.
pub(crate) struct ResolvedBridgeInputs {
    pub openai_api_key: String,
    pub github_token: String,
    pub repo: RepoRef,
    pub issue_number: u64,
    pub comment_body: String,
    pub allowlist: PathAllowlist,
}

pub(crate) fn load_issue_comment_event(path: &Path) -> Result<IssueCommentEvent> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read event payload {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse event payload {}", path.display()))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

/// Merges explicit configuration with the trigger event and checks that every
/// required value is present. All missing names are reported together.
pub(crate) fn resolve_bridge_inputs(cli: &Cli) -> Result<ResolvedBridgeInputs> {
    let event = match cli.event_path.as_deref() {
        Some(path) => load_issue_comment_event(path)?,
        None => IssueCommentEvent::default(),
    };

    let openai_api_key = non_blank(cli.openai_api_key.as_deref());
    let github_token = non_blank(cli.github_token.as_deref());
    let repo = non_blank(cli.repo.as_deref()).or_else(|| {
        non_blank(
            event
                .repository
                .as_ref()
                .map(|repository| repository.full_name.as_str()),
        )
    });
    let issue_number = non_blank(cli.issue_number.as_deref())
        .or_else(|| event.issue.as_ref().map(|issue| issue.number.to_string()));
    // The body is kept verbatim; the parser does its own trimming.
    let comment_body = cli
        .comment_body
        .clone()
        .filter(|body| !body.trim().is_empty())
        .or_else(|| {
            event
                .comment
                .as_ref()
                .and_then(|comment| comment.body.clone())
                .filter(|body| !body.trim().is_empty())
        });

    let mut missing = Vec::new();
    if openai_api_key.is_none() {
        missing.push("OPENAI_API_KEY");
    }
    if github_token.is_none() {
        missing.push("GH_TOKEN");
    }
    if repo.is_none() {
        missing.push("REPO_FULL");
    }
    if issue_number.is_none() {
        missing.push("ISSUE_NUMBER");
    }
    if comment_body.is_none() {
        missing.push("COMMENT_BODY");
    }
    let (
        Some(openai_api_key),
        Some(github_token),
        Some(repo),
        Some(issue_number),
        Some(comment_body),
    ) = (openai_api_key, github_token, repo, issue_number, comment_body)
    else {
        bail!("missing required configuration: {}", missing.join(", "));
    };

    let repo = RepoRef::parse(&repo).context("invalid REPO_FULL")?;
    let issue_number = issue_number
        .parse::<u64>()
        .ok()
        .filter(|number| *number > 0)
        .with_context(|| format!("invalid ISSUE_NUMBER '{issue_number}', expected a positive integer"))?;
    let allowlist = PathAllowlist::new(&cli.allowed_prefixes)
        .map_err(|reason| anyhow::anyhow!("invalid PRBRIDGE_ALLOWED_PREFIXES: {reason}"))?;

    Ok(ResolvedBridgeInputs {
        openai_api_key,
        github_token,
        repo,
        issue_number,
        comment_body,
        allowlist,
    })
}
