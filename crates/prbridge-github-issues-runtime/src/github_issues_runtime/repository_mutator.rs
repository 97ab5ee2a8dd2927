//! Branch + contents + pull-request protocol for one validated change-set.

use std::fmt;

use prbridge_github_issues::change_set::{ChangeAction, ValidatedChangeSet};
use prbridge_github_issues::issue_runtime_helpers::render_pull_request_body;
use thiserror::Error;

use super::GithubApiClient;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `MutationStep` values.
pub enum MutationStep {
    ResolveBaseBranch { base: String },
    CreateBranch { name: String },
    DeleteFile { path: String },
    UpsertFile { path: String },
    OpenPullRequest,
}

impl fmt::Display for MutationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResolveBaseBranch { base } => write!(f, "resolve base branch `{base}`"),
            Self::CreateBranch { name } => write!(f, "create branch `{name}`"),
            Self::DeleteFile { path } => write!(f, "delete {path}"),
            Self::UpsertFile { path } => write!(f, "upsert {path}"),
            Self::OpenPullRequest => write!(f, "open pull request"),
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to {step}: {message}")]
/// A mutation step failure. `branch` names the branch already created, which
/// is left in place.
pub struct MutationError {
    pub step: MutationStep,
    pub branch: Option<String>,
    pub message: String,
}

impl MutationError {
    fn new(step: MutationStep, branch: Option<&str>, error: anyhow::Error) -> Self {
        Self {
            step,
            branch: branch.map(ToOwned::to_owned),
            message: format!("{error:#}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `BranchRef` describing the branch created for a run.
pub struct BranchRef {
    pub name: String,
    pub base_sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `PullRequestResult` returned by a successful mutation.
pub struct PullRequestResult {
    pub url: String,
    pub branch: BranchRef,
    pub skipped_deletes: Vec<String>,
}

/// Applies a validated change-set on a fresh branch and opens a pull request.
pub struct RepositoryMutator<'a> {
    github: &'a GithubApiClient,
    base_branch: &'a str,
    issue_number: u64,
}

impl<'a> RepositoryMutator<'a> {
    pub fn new(github: &'a GithubApiClient, base_branch: &'a str, issue_number: u64) -> Self {
        Self {
            github,
            base_branch,
            issue_number,
        }
    }

    pub async fn apply(
        &self,
        change_set: ValidatedChangeSet,
        branch_name: &str,
    ) -> Result<PullRequestResult, MutationError> {
        let base_sha = self
            .github
            .resolve_branch_head_sha(self.base_branch)
            .await
            .map_err(|error| {
                MutationError::new(
                    MutationStep::ResolveBaseBranch {
                        base: self.base_branch.to_string(),
                    },
                    None,
                    error,
                )
            })?;

        self.github
            .create_branch(branch_name, &base_sha)
            .await
            .map_err(|error| {
                MutationError::new(
                    MutationStep::CreateBranch {
                        name: branch_name.to_string(),
                    },
                    None,
                    error,
                )
            })?;
        tracing::info!(branch = branch_name, base_sha = %base_sha, "created branch");

        let commit_message = change_set.commit_message();
        let mut skipped_deletes = Vec::new();
        for entry in change_set.changes() {
            match &entry.action {
                ChangeAction::Delete => {
                    let step = MutationStep::DeleteFile {
                        path: entry.path.clone(),
                    };
                    let existing_sha = self
                        .github
                        .get_file_sha(&entry.path, branch_name)
                        .await
                        .map_err(|error| {
                            MutationError::new(step.clone(), Some(branch_name), error)
                        })?;
                    let Some(existing_sha) = existing_sha else {
                        tracing::info!(path = %entry.path, "delete skipped, file not found");
                        skipped_deletes.push(entry.path.clone());
                        continue;
                    };
                    self.github
                        .delete_file(&entry.path, commit_message, branch_name, &existing_sha)
                        .await
                        .map_err(|error| MutationError::new(step, Some(branch_name), error))?;
                }
                ChangeAction::Upsert { content } => {
                    let step = MutationStep::UpsertFile {
                        path: entry.path.clone(),
                    };
                    let existing_sha = self
                        .github
                        .get_file_sha(&entry.path, branch_name)
                        .await
                        .map_err(|error| {
                            MutationError::new(step.clone(), Some(branch_name), error)
                        })?;
                    self.github
                        .put_file(
                            &entry.path,
                            content,
                            commit_message,
                            branch_name,
                            existing_sha.as_deref(),
                        )
                        .await
                        .map_err(|error| MutationError::new(step, Some(branch_name), error))?;
                }
            }
            tracing::info!(
                path = %entry.path,
                action = entry.action.label(),
                "applied change"
            );
        }

        let body = render_pull_request_body(change_set.body(), self.issue_number);
        let url = self
            .github
            .create_pull_request(change_set.title(), &body, branch_name, self.base_branch)
            .await
            .map_err(|error| {
                MutationError::new(MutationStep::OpenPullRequest, Some(branch_name), error)
            })?;

        Ok(PullRequestResult {
            url,
            branch: BranchRef {
                name: branch_name.to_string(),
                base_sha,
            },
            skipped_deletes,
        })
    }
}
