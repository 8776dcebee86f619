//! Tool calls end to end against a real git upstream.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use reporef_core::{Config, RepoService};
use reporef_fs::HomeLayout;
use reporef_git::{GitTimeouts, RepoStore};
use reporef_mcp::handlers::handle_tool_call;
use reporef_mcp::{ReporefServer, ToolResult};
use reporef_test_utils::{TestHome, Upstream};
use serde_json::{Value, json};

struct Fixture {
    home: TestHome,
    _upstream: Upstream,
    service: Arc<RepoService>,
}

fn fixture() -> Fixture {
    let home = TestHome::new();
    let upstream = Upstream::with_branches(
        &[
            ("README.md", "# main"),
            ("src/main.rs", "fn main() {}"),
            ("src/.rr.md", "Entry point lives here"),
        ],
        &[("dev", &[("README.md", "# dev"), ("src/feature.rs", "// wip")])],
    );
    home.write_config(&format!(
        r#"
globalDescription: the demo workspace
repos:
  - name: demo
    alias: d
    url: {url}
    description: Demo repository
    branches:
      - name: main
        description: Stable
      - name: dev
        description: Work in progress
"#,
        url = upstream.url()
    ));
    let config = Config::load(&home.config_path()).unwrap();
    let store = RepoStore::with_cli(HomeLayout::new(home.root()), GitTimeouts::default());
    Fixture {
        home,
        _upstream: upstream,
        service: Arc::new(RepoService::new(config, store)),
    }
}

async fn tool(fixture: &Fixture, name: &str, arguments: Value) -> ToolResult {
    handle_tool_call(&fixture.service, name, arguments).await.unwrap()
}

fn parsed(result: &ToolResult) -> Value {
    assert!(!result.is_error(), "unexpected error: {}", result.first_text());
    serde_json::from_str(result.first_text()).unwrap()
}

#[tokio::test]
async fn get_repo_without_name_lists_repositories() {
    let fixture = fixture();

    let result = tool(&fixture, "get_repo", Value::Null).await;

    assert_eq!(
        parsed(&result),
        json!({"repos": [{"name": "demo", "alias": "d", "description": "Demo repository"}]})
    );
}

#[tokio::test]
async fn get_repo_by_alias_includes_branches() {
    let fixture = fixture();

    let result = tool(&fixture, "get_repo", json!({"name": "d"})).await;

    let value = parsed(&result);
    assert_eq!(value["name"], "demo");
    assert_eq!(value["branches"][1], json!({"name": "dev", "description": "Work in progress"}));
}

#[tokio::test]
async fn get_repo_unknown_lists_available_repositories() {
    let fixture = fixture();

    let result = tool(&fixture, "get_repo", json!({"name": "nope"})).await;

    assert!(result.is_error());
    let value: Value = serde_json::from_str(result.first_text()).unwrap();
    assert_eq!(value["message"], "Repository \"nope\" not found");
    assert_eq!(value["availableRepos"][0]["name"], "demo");
}

#[tokio::test]
async fn file_list_includes_hint_files() {
    let fixture = fixture();

    let result = tool(
        &fixture,
        "get_file_list",
        json!({"repo": "demo", "branch": "main", "path": "src"}),
    )
    .await;

    let value = parsed(&result);
    assert_eq!(value["entries"], json!([".rr.md", "main.rs"]));
    assert_eq!(value["prompts"][0]["path"], "src/.rr.md");
}

#[tokio::test]
async fn file_content_is_fenced_and_followed_by_notes() {
    let fixture = fixture();

    let result = tool(
        &fixture,
        "get_file_content",
        json!({"repo": "demo", "branch": "main", "path": "src/main.rs"}),
    )
    .await;

    assert_eq!(
        result.first_text(),
        "```rs\nfn main() {}\n```\n\n---\n\n## Repository notes\n\n### src/.rr.md\n\nEntry point lives here\n"
    );
}

#[tokio::test]
async fn markdown_content_is_returned_verbatim_per_branch() {
    let fixture = fixture();

    let dev = tool(
        &fixture,
        "get_file_content",
        json!({"repo": "demo", "branch": "dev", "path": "README.md"}),
    )
    .await;
    let main = tool(
        &fixture,
        "get_file_content",
        json!({"repo": "demo", "branch": "main", "path": "README.md"}),
    )
    .await;

    assert_eq!(dev.first_text(), "# dev");
    assert_eq!(main.first_text(), "# main");
}

#[tokio::test]
async fn missing_file_is_an_error_result() {
    let fixture = fixture();

    let result = tool(
        &fixture,
        "get_file_content",
        json!({"repo": "demo", "branch": "main", "path": "missing.txt"}),
    )
    .await;

    assert!(result.is_error());
    assert_eq!(result.first_text(), "Path \"missing.txt\" not found");
}

#[tokio::test]
async fn unconfigured_branch_names_the_alternatives() {
    let fixture = fixture();

    let result = tool(
        &fixture,
        "get_file_list",
        json!({"repo": "demo", "branch": "release"}),
    )
    .await;

    assert!(result.is_error());
    assert!(result.first_text().ends_with("available branches: main, dev"));
    assert!(!fixture.home.repo_dir("demo").exists());
}

#[tokio::test]
async fn search_then_status_then_refresh() {
    let fixture = fixture();

    let search = tool(
        &fixture,
        "search_repo",
        json!({"repo": "demo", "branch": "dev", "pattern": r"\.RS$", "limit": 1}),
    )
    .await;
    let search = parsed(&search);
    assert_eq!(search["total"], 2);
    assert_eq!(search["matches"], json!(["src/feature.rs"]));

    let status = parsed(&tool(&fixture, "manage_cache", json!({"action": "status"})).await);
    assert_eq!(status, json!({"demo_dev": 4}));

    let refresh = parsed(
        &tool(
            &fixture,
            "manage_cache",
            json!({"action": "refresh", "repo": "demo", "branch": "main"}),
        )
        .await,
    );
    assert_eq!(refresh["refreshed"], json!([{"key": "demo_main", "files": 3}]));
    assert_eq!(refresh["failed"], json!([]));
}

#[tokio::test]
async fn invalid_pattern_is_an_error_result() {
    let fixture = fixture();

    let result = tool(
        &fixture,
        "search_repo",
        json!({"repo": "demo", "branch": "main", "pattern": "[unclosed"}),
    )
    .await;

    assert!(result.is_error());
    assert!(result.first_text().starts_with("Invalid search pattern"));
}

#[tokio::test]
async fn initialize_instructions_describe_configured_repositories() {
    let fixture = fixture();
    let server = ReporefServer::new(Arc::clone(&fixture.service));

    let response = server
        .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
        .await
        .unwrap();
    let response: Value = serde_json::from_str(&response).unwrap();
    let instructions = response["result"]["instructions"].as_str().unwrap();

    assert!(instructions.contains("Reach for it when: the demo workspace"));
    assert!(instructions.contains("- demo (alias: d): Demo repository"));
}
