use std::path::PathBuf;

use clap::Parser;
use prbridge_ai::DEFAULT_OPENAI_API_BASE;
use prbridge_github_issues::issue_command_parser::DEFAULT_COMMAND_PREFIX;
use prbridge_github_issues_runtime::{DEFAULT_GITHUB_API_BASE, DEFAULT_GITHUB_REQUEST_TIMEOUT_MS};

pub(crate) const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub(crate) const DEFAULT_MODEL_TIMEOUT_MS: u64 = 120_000;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "prbridge",
    about = "Turns `/ai plan` and `/ai propose` issue comments into plans and pull requests",
    version
)]
/// Command-line and environment configuration for one bridge run.
pub(crate) struct Cli {
    #[arg(
        long = "openai-api-key",
        env = "OPENAI_API_KEY",
        hide_env_values = true,
        help = "API key for the OpenAI Responses API"
    )]
    pub openai_api_key: Option<String>,

    #[arg(
        long = "github-token",
        env = "GH_TOKEN",
        hide_env_values = true,
        help = "GitHub token with contents, pull-request and issue write access"
    )]
    pub github_token: Option<String>,

    #[arg(
        long = "repo",
        env = "REPO_FULL",
        help = "Target repository in owner/repo form. Falls back to repository.full_name from the event payload"
    )]
    pub repo: Option<String>,

    #[arg(
        long = "issue-number",
        env = "ISSUE_NUMBER",
        help = "Issue the comment was posted on. Falls back to issue.number from the event payload"
    )]
    pub issue_number: Option<String>,

    #[arg(
        long = "comment-body",
        env = "COMMENT_BODY",
        help = "Raw comment body. Falls back to comment.body from the event payload"
    )]
    pub comment_body: Option<String>,

    #[arg(
        long = "event-path",
        env = "GITHUB_EVENT_PATH",
        help = "Path to an issue_comment webhook payload used to fill in repo, issue and comment"
    )]
    pub event_path: Option<PathBuf>,

    #[arg(
        long,
        env = "AI_MODEL",
        default_value = DEFAULT_MODEL,
        help = "Model identifier sent to the Responses API"
    )]
    pub model: String,

    #[arg(
        long = "base-branch",
        env = "BASE_BRANCH",
        default_value = "main",
        help = "Branch that proposal branches are cut from and pull requests target"
    )]
    pub base_branch: String,

    #[arg(
        long = "command-prefix",
        env = "PRBRIDGE_COMMAND_PREFIX",
        default_value = DEFAULT_COMMAND_PREFIX,
        help = "Leading token that addresses a comment to the bridge"
    )]
    pub command_prefix: String,

    #[arg(
        long = "allowed-prefix",
        env = "PRBRIDGE_ALLOWED_PREFIXES",
        value_delimiter = ',',
        default_values = ["docs/", ".github/"],
        help = "Repository path prefixes a proposal may touch (repeatable or comma-separated)"
    )]
    pub allowed_prefixes: Vec<String>,

    #[arg(
        long = "openai-api-base",
        env = "PRBRIDGE_OPENAI_API_BASE",
        default_value = DEFAULT_OPENAI_API_BASE,
        help = "Base URL for the Responses API"
    )]
    pub openai_api_base: String,

    #[arg(
        long = "github-api-base",
        env = "PRBRIDGE_GITHUB_API_BASE",
        default_value = DEFAULT_GITHUB_API_BASE,
        help = "Base URL for the GitHub REST API"
    )]
    pub github_api_base: String,

    #[arg(
        long = "model-timeout-ms",
        default_value_t = DEFAULT_MODEL_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Per-request timeout for completion calls"
    )]
    pub model_timeout_ms: u64,

    #[arg(
        long = "github-timeout-ms",
        default_value_t = DEFAULT_GITHUB_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Per-request timeout for GitHub calls"
    )]
    pub github_timeout_ms: u64,
}
