use anyhow::{Context, Result};

use super::GithubApiClient;

#[derive(Clone)]
/// Posts status comments back to the issue that triggered the run.
pub struct IssueNotifier {
    github: GithubApiClient,
    issue_number: u64,
}

impl IssueNotifier {
    pub fn new(github: GithubApiClient, issue_number: u64) -> Self {
        Self {
            github,
            issue_number,
        }
    }

    pub async fn post(&self, text: &str) -> Result<()> {
        let response = self
            .github
            .create_issue_comment(self.issue_number, text)
            .await
            .with_context(|| {
                format!(
                    "failed to post status comment on {} issue #{}",
                    self.github.repo().as_slug(),
                    self.issue_number
                )
            })?;
        tracing::info!(
            issue = self.issue_number,
            comment_id = response.id,
            url = response.html_url.as_deref().unwrap_or_default(),
            "posted issue comment"
        );
        Ok(())
    }
}
