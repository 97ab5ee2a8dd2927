//! Issue-comment bridge runtime: one comment event in, one outcome out.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use prbridge_ai::{CompletionClient, CompletionRequest};
use prbridge_github_issues::change_set::{parse_and_validate_change_set, ChangeSetError};
use prbridge_github_issues::issue_command_parser::{
    parse_bridge_command, BridgeCommand, CommandVerb, ParsedBridgeCommand,
};
use prbridge_github_issues::issue_prompt_helpers::build_bridge_prompt;
use prbridge_github_issues::issue_render::{
    render_mutation_failure_comment, render_parse_failure_comment, render_plan_comment,
    render_pull_request_created_comment, render_usage_comment,
    render_validation_rejection_comment,
};
use prbridge_github_issues::issue_runtime_helpers::branch_name_for_run;
use prbridge_github_issues::path_policy::PathAllowlist;

mod github_api_client;
mod issue_notifier;
mod repository_mutator;

pub use github_api_client::{GithubApiClient, GithubCommentCreateResponse};
pub use issue_notifier::IssueNotifier;
pub use repository_mutator::{
    BranchRef, MutationError, MutationStep, PullRequestResult, RepositoryMutator,
};

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_REQUEST_TIMEOUT_MS: u64 = 60_000;

#[derive(Clone)]
/// Runtime configuration for one issue-comment bridge invocation.
pub struct BridgeRuntimeConfig {
    pub client: Arc<dyn CompletionClient>,
    pub model: String,
    pub repo_slug: String,
    pub issue_number: u64,
    pub base_branch: String,
    pub api_base: String,
    pub token: String,
    pub request_timeout_ms: u64,
    pub command_prefix: String,
    pub allowlist: PathAllowlist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `RepoRef` identifying the target repository.
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| anyhow!("invalid repository '{raw}', expected owner/repo"))?;
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid repository '{raw}', expected owner/repo");
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn as_slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Terminal state of a handled comment. Every variant except `Ignored`
/// corresponds to exactly one posted issue comment.
pub enum BridgeOutcome {
    Ignored,
    UsageReported { verb: CommandVerb },
    PlanPosted,
    ParseFailed { reason: String },
    ValidationRejected { reason: String },
    MutationFailed { step: String, branch: Option<String> },
    PullRequestOpened { branch: String, url: String },
}

/// Handles a single issue comment end to end.
pub struct IssueCommentBridge {
    config: BridgeRuntimeConfig,
    repo: RepoRef,
    github: GithubApiClient,
    notifier: IssueNotifier,
}

impl IssueCommentBridge {
    pub fn new(config: BridgeRuntimeConfig) -> Result<Self> {
        let repo = RepoRef::parse(&config.repo_slug)?;
        let github = GithubApiClient::new(
            &config.api_base,
            &config.token,
            repo.clone(),
            config.request_timeout_ms,
        )?;
        let notifier = IssueNotifier::new(github.clone(), config.issue_number);
        Ok(Self {
            config,
            repo,
            github,
            notifier,
        })
    }

    /// Returns `Err` only for fatal conditions (model or notifier failures);
    /// user-facing failures are posted to the issue and reported as outcomes.
    pub async fn handle_comment(&self, body: &str) -> Result<BridgeOutcome> {
        let Some(parsed) = parse_bridge_command(body, &self.config.command_prefix) else {
            tracing::info!(
                prefix = %self.config.command_prefix,
                "comment is not a bridge command, nothing to do"
            );
            return Ok(BridgeOutcome::Ignored);
        };

        match parsed {
            ParsedBridgeCommand::Usage { verb } => {
                tracing::info!(verb = verb.as_str(), "command is missing a request");
                self.notifier
                    .post(&render_usage_comment(&self.config.command_prefix, verb))
                    .await?;
                Ok(BridgeOutcome::UsageReported { verb })
            }
            ParsedBridgeCommand::Run(command) => {
                tracing::info!(
                    verb = command.verb.as_str(),
                    repo = %self.repo.as_slug(),
                    issue = self.config.issue_number,
                    "handling bridge command"
                );
                match command.verb {
                    CommandVerb::Plan => self.run_plan(&command).await,
                    CommandVerb::Propose => self.run_propose(&command).await,
                }
            }
        }
    }

    async fn complete(&self, command: &BridgeCommand) -> Result<String> {
        let prompt = build_bridge_prompt(
            command.verb,
            &command.request_text,
            &self.repo.as_slug(),
            &self.config.base_branch,
            &self.config.allowlist,
        );
        self.config
            .client
            .complete_text(CompletionRequest::new(self.config.model.clone(), prompt))
            .await
            .with_context(|| format!("model {} completion failed", self.config.model))
    }

    async fn run_plan(&self, command: &BridgeCommand) -> Result<BridgeOutcome> {
        let plan = self.complete(command).await?;
        self.notifier.post(&render_plan_comment(&plan)).await?;
        Ok(BridgeOutcome::PlanPosted)
    }

    async fn run_propose(&self, command: &BridgeCommand) -> Result<BridgeOutcome> {
        let raw = self.complete(command).await?;
        let change_set = match parse_and_validate_change_set(&raw, &self.config.allowlist) {
            Ok(change_set) => change_set,
            Err(error) => return self.report_change_set_error(error).await,
        };
        tracing::info!(
            changes = change_set.changes().len(),
            "change-set passed validation"
        );

        let branch_name =
            branch_name_for_run(self.config.issue_number, chrono::Utc::now().timestamp());
        let mutator = RepositoryMutator::new(
            &self.github,
            &self.config.base_branch,
            self.config.issue_number,
        );
        match mutator.apply(change_set, &branch_name).await {
            Ok(result) => {
                tracing::info!(
                    branch = %result.branch.name,
                    url = %result.url,
                    skipped_deletes = result.skipped_deletes.len(),
                    "pull request opened"
                );
                self.notifier
                    .post(&render_pull_request_created_comment(
                        &result.branch.name,
                        &result.url,
                    ))
                    .await?;
                Ok(BridgeOutcome::PullRequestOpened {
                    branch: result.branch.name,
                    url: result.url,
                })
            }
            Err(error) => {
                tracing::error!(
                    step = %error.step,
                    branch = error.branch.as_deref().unwrap_or("none"),
                    error = %error.message,
                    "repository mutation failed"
                );
                self.notifier
                    .post(&render_mutation_failure_comment(
                        &error.step.to_string(),
                        error.branch.as_deref(),
                        &error.message,
                    ))
                    .await?;
                Ok(BridgeOutcome::MutationFailed {
                    step: error.step.to_string(),
                    branch: error.branch,
                })
            }
        }
    }

    async fn report_change_set_error(&self, error: ChangeSetError) -> Result<BridgeOutcome> {
        let reason = error.to_string();
        if error.is_parse_failure() {
            tracing::warn!(reason = %reason, "model output could not be parsed");
            self.notifier
                .post(&render_parse_failure_comment(&error))
                .await?;
            return Ok(BridgeOutcome::ParseFailed { reason });
        }
        tracing::warn!(reason = %reason, "change-set rejected");
        self.notifier
            .post(&render_validation_rejection_comment(&error))
            .await?;
        Ok(BridgeOutcome::ValidationRejected { reason })
    }
}

#[cfg(test)]
mod tests;
