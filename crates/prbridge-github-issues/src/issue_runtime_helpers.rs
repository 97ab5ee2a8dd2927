/// Branch name for one `propose` run; the timestamp keeps repeated runs on the
/// same issue from colliding.
pub fn branch_name_for_run(issue_number: u64, unix_seconds: i64) -> String {
    format!("ai/pr-{issue_number}-{unix_seconds}")
}

/// Appends the provenance footer naming the originating issue.
pub fn render_pull_request_body(body: &str, issue_number: u64) -> String {
    format!("{}\n\n---\nTriggered from Issue #{}.", body.trim(), issue_number)
        .trim()
        .to_string()
}
