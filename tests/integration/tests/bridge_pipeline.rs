use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use httpmock::prelude::*;
use httpmock::Mock;
use prbridge_ai::{OpenAiResponsesClient, OpenAiResponsesConfig};
use prbridge_github_issues::path_policy::PathAllowlist;
use prbridge_github_issues_runtime::{BridgeOutcome, BridgeRuntimeConfig, IssueCommentBridge};
use proptest::prelude::*;
use serde_json::{json, Value};

const COMMENTS_PATH: &str = "/repos/owner/repo/issues/7/comments";
const PULL_REQUEST_URL: &str = "https://github.com/owner/repo/pull/3";

fn responses_body(text: &str) -> Value {
    json!({
        "id": "resp_1",
        "output": [{
            "type": "message",
            "role": "assistant",
            "content": [{"type": "output_text", "text": text}]
        }]
    })
}

fn bridge(model_server: &MockServer, github_server: &MockServer) -> IssueCommentBridge {
    let client = OpenAiResponsesClient::new(OpenAiResponsesConfig {
        api_base: format!("{}/v1", model_server.base_url()),
        api_key: "sk-test".to_string(),
        request_timeout_ms: 5_000,
        max_attempts: 6,
        backoff_unit_ms: 1,
        jitter_max_ms: 0,
    })
    .expect("completion client");
    IssueCommentBridge::new(BridgeRuntimeConfig {
        client: Arc::new(client),
        model: "gpt-4.1-mini".to_string(),
        repo_slug: "owner/repo".to_string(),
        issue_number: 7,
        base_branch: "main".to_string(),
        api_base: github_server.base_url(),
        token: "gh-test".to_string(),
        request_timeout_ms: 5_000,
        command_prefix: "/ai".to_string(),
        allowlist: PathAllowlist::default(),
    })
    .expect("bridge")
}

fn mock_model_reply<'a>(server: &'a MockServer, text: &str) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(POST).path("/v1/responses");
        then.status(200).json_body(responses_body(text));
    })
}

/// Every repository-mutating endpoint plus contents lookups. None may be hit
/// unless a change-set has passed validation.
fn forbidden_mutation_calls(server: &MockServer) -> Vec<Mock<'_>> {
    let mut mocks = [GET, PUT, DELETE]
        .into_iter()
        .map(|method| {
            server.mock(|when, then| {
                when.method(method);
                then.status(500).body("unexpected call");
            })
        })
        .collect::<Vec<_>>();
    for path in ["/repos/owner/repo/git/refs", "/repos/owner/repo/pulls"] {
        mocks.push(server.mock(|when, then| {
            when.method(POST).path(path);
            then.status(500).body("unexpected call");
        }));
    }
    mocks
}

fn forbidden_comment_calls(server: &MockServer) -> Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path(COMMENTS_PATH);
        then.status(500).body("unexpected call");
    })
}

struct HappyPathGithub<'a> {
    base_ref: Mock<'a>,
    branch_create: Mock<'a>,
    pull_request: Mock<'a>,
    comment: Mock<'a>,
}

fn mock_happy_path_github(server: &MockServer) -> HappyPathGithub<'_> {
    HappyPathGithub {
        base_ref: server.mock(|when, then| {
            when.method(GET).path("/repos/owner/repo/git/ref/heads/main");
            then.status(200).json_body(json!({"object": {"sha": "base-sha"}}));
        }),
        branch_create: server.mock(|when, then| {
            when.method(POST).path("/repos/owner/repo/git/refs");
            then.status(201).json_body(json!({"ref": "refs/heads/ai/pr-7-1"}));
        }),
        pull_request: server.mock(|when, then| {
            when.method(POST).path("/repos/owner/repo/pulls");
            then.status(201).json_body(json!({"html_url": PULL_REQUEST_URL}));
        }),
        comment: server.mock(|when, then| {
            when.method(POST)
                .path(COMMENTS_PATH)
                .body_includes("**AI PR created**");
            then.status(201).json_body(json!({"id": 1}));
        }),
    }
}

#[tokio::test]
async fn integration_plan_scenario_posts_bullets_and_creates_nothing() {
    let model = MockServer::start();
    let github = MockServer::start();
    let completion = model.mock(|when, then| {
        when.method(POST)
            .path("/v1/responses")
            .body_includes("add a FAQ section");
        then.status(200)
            .json_body(responses_body("- Create docs/faq.md\n- Link it from docs/index.md"));
    });
    let comment = github.mock(|when, then| {
        when.method(POST)
            .path(COMMENTS_PATH)
            .body_includes("**AI PLAN**")
            .body_includes("- Create docs/faq.md");
        then.status(201).json_body(json!({"id": 1}));
    });
    let refs = github.mock(|when, then| {
        when.method(POST).path("/repos/owner/repo/git/refs");
        then.status(201);
    });
    let pulls = github.mock(|when, then| {
        when.method(POST).path("/repos/owner/repo/pulls");
        then.status(201);
    });

    let outcome = bridge(&model, &github)
        .handle_comment("/ai plan add a FAQ section")
        .await
        .expect("plan run");

    assert_eq!(outcome, BridgeOutcome::PlanPosted);
    completion.assert_calls(1);
    comment.assert_calls(1);
    refs.assert_calls(0);
    pulls.assert_calls(0);
}

#[tokio::test]
async fn integration_propose_survives_five_transient_failures() {
    let model = MockServer::start();
    let github = MockServer::start();
    let transient = (0..5)
        .map(|attempt| {
            model.mock(|when, then| {
                when.method(POST)
                    .path("/v1/responses")
                    .header("x-prbridge-retry-attempt", attempt.to_string());
                then.status(503).body("overloaded");
            })
        })
        .collect::<Vec<_>>();
    let reply = json!({
        "title": "Add FAQ",
        "changes": [{"path": "docs/faq.md", "action": "upsert", "content": "# FAQ\n"}]
    })
    .to_string();
    let success = model.mock(|when, then| {
        when.method(POST)
            .path("/v1/responses")
            .header("x-prbridge-retry-attempt", "5");
        then.status(200).json_body(responses_body(&reply));
    });
    let happy = mock_happy_path_github(&github);
    github.mock(|when, then| {
        when.method(GET).path("/repos/owner/repo/contents/docs/faq.md");
        then.status(404);
    });
    let put = github.mock(|when, then| {
        when.method(PUT).path("/repos/owner/repo/contents/docs/faq.md");
        then.status(201).json_body(json!({}));
    });

    let outcome = bridge(&model, &github)
        .handle_comment("/ai propose add a FAQ")
        .await
        .expect("propose run");

    assert!(matches!(outcome, BridgeOutcome::PullRequestOpened { .. }));
    for mock in &transient {
        mock.assert_calls(1);
    }
    success.assert_calls(1);
    happy.base_ref.assert_calls(1);
    happy.branch_create.assert_calls(1);
    put.assert_calls(1);
    happy.pull_request.assert_calls(1);
    happy.comment.assert_calls(1);
}

#[tokio::test]
async fn regression_exhausted_retries_fail_without_any_github_call() {
    let model = MockServer::start();
    let github = MockServer::start();
    let overloaded = model.mock(|when, then| {
        when.method(POST).path("/v1/responses");
        then.status(503).body("overloaded");
    });
    let forbidden = forbidden_mutation_calls(&github);
    let comments = forbidden_comment_calls(&github);

    let error = bridge(&model, &github)
        .handle_comment("/ai propose add a FAQ")
        .await
        .expect_err("exhaustion is fatal");

    overloaded.assert_calls(6);
    assert!(format!("{error:#}").contains("after 6 attempts"));
    comments.assert_calls(0);
    for mock in &forbidden {
        mock.assert_calls(0);
    }
}

#[tokio::test]
async fn integration_disallowed_path_scenario_rejects_whole_batch() {
    let model = MockServer::start();
    let github = MockServer::start();
    mock_model_reply(
        &model,
        r#"{"title":"x","changes":[{"path":"src/main.py","action":"upsert","content":"..."}]}"#,
    );
    let rejection = github.mock(|when, then| {
        when.method(POST)
            .path(COMMENTS_PATH)
            .body_includes("Path not allowed: src/main.py");
        then.status(201).json_body(json!({"id": 1}));
    });
    let forbidden = forbidden_mutation_calls(&github);

    let outcome = bridge(&model, &github)
        .handle_comment("/ai propose edit the entrypoint")
        .await
        .expect("rejection is reported");

    assert!(matches!(outcome, BridgeOutcome::ValidationRejected { .. }));
    rejection.assert_calls(1);
    for mock in &forbidden {
        mock.assert_calls(0);
    }
}

#[tokio::test]
async fn integration_delete_of_missing_file_still_opens_pull_request() {
    let model = MockServer::start();
    let github = MockServer::start();
    mock_model_reply(
        &model,
        r#"{"changes":[{"path":"docs/faq.md","action":"delete"}]}"#,
    );
    let happy = mock_happy_path_github(&github);
    let lookup = github.mock(|when, then| {
        when.method(GET)
            .path("/repos/owner/repo/contents/docs/faq.md")
            .query_param_exists("ref");
        then.status(404).json_body(json!({"message": "Not Found"}));
    });
    let delete = github.mock(|when, then| {
        when.method(DELETE).path("/repos/owner/repo/contents/docs/faq.md");
        then.status(200).json_body(json!({}));
    });

    let outcome = bridge(&model, &github)
        .handle_comment("/ai propose remove the FAQ")
        .await
        .expect("propose run");

    match outcome {
        BridgeOutcome::PullRequestOpened { url, .. } => assert_eq!(url, PULL_REQUEST_URL),
        other => panic!("unexpected outcome {other:?}"),
    }
    lookup.assert_calls(1);
    delete.assert_calls(0);
    happy.pull_request.assert_calls(1);
    happy.comment.assert_calls(1);
}

#[tokio::test]
async fn integration_upsert_content_reaches_github_byte_for_byte() {
    let model = MockServer::start();
    let github = MockServer::start();
    let content = "# Guide\n\n- caf\u{e9}\n- \"quoted\" and \\ backslash\n\ttabbed\n";
    let reply = json!({
        "changes": [{"path": ".github/GUIDE.md", "action": "upsert", "content": content}]
    })
    .to_string();
    mock_model_reply(&model, &reply);
    let happy = mock_happy_path_github(&github);
    github.mock(|when, then| {
        when.method(GET).path("/repos/owner/repo/contents/.github/GUIDE.md");
        then.status(404);
    });
    let put = github.mock(|when, then| {
        when.method(PUT)
            .path("/repos/owner/repo/contents/.github/GUIDE.md")
            .json_body_includes(
                json!({
                    "content": BASE64.encode(content.as_bytes()),
                    "message": "chore: AI changes",
                })
                .to_string(),
            );
        then.status(201).json_body(json!({}));
    });

    let outcome = bridge(&model, &github)
        .handle_comment("/ai propose write the guide")
        .await
        .expect("propose run");

    assert!(matches!(outcome, BridgeOutcome::PullRequestOpened { .. }));
    put.assert_calls(1);
    happy.pull_request.assert_calls(1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn property_unaddressed_comments_never_touch_the_network(
        body in "[a-zA-Z0-9 .,!?\n]{0,80}"
    ) {
        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        let model = MockServer::start();
        let github = MockServer::start();
        let model_calls = model.mock(|when, then| {
            when.method(POST);
            then.status(500);
        });
        let github_calls = forbidden_mutation_calls(&github);
        let comments = forbidden_comment_calls(&github);

        let outcome = runtime
            .block_on(bridge(&model, &github).handle_comment(&body))
            .expect("ignored");

        prop_assert_eq!(outcome, BridgeOutcome::Ignored);
        model_calls.assert_calls(0);
        comments.assert_calls(0);
        for mock in &github_calls {
            mock.assert_calls(0);
        }
    }
}
