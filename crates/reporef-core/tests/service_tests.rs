//! RepoService against real git upstreams.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use reporef_core::{Config, Error, RepoService};
use reporef_fs::HomeLayout;
use reporef_git::{GitTimeouts, RepoStore};
use reporef_test_utils::git::run_git;
use reporef_test_utils::{TestHome, Upstream};

fn upstream() -> Upstream {
    Upstream::with_branches(
        &[
            ("README.md", "# main"),
            ("src/test/index.ts", "export const main = 1;"),
            (".reporef.md", "root hint"),
            ("src/.rr.md", "src hint"),
        ],
        &[(
            "dev",
            &[
                ("README.md", "# dev"),
                ("lib/TEST/type.ts", "export type T = string;"),
            ],
        )],
    )
}

fn service(home: &TestHome, upstream: &Upstream) -> RepoService {
    home.write_config(&format!(
        r#"
globalDescription: test repositories
repos:
  - name: demo
    alias: [d, sample]
    url: {url}
    description: Demo repository
    defaultPath: src
    branches:
      - name: main
        description: Stable
      - name: dev
        description: Next
"#,
        url = upstream.url()
    ));
    let config = Config::load(&home.config_path()).unwrap();
    let store = RepoStore::with_cli(HomeLayout::new(home.root()), GitTimeouts::default());
    RepoService::new(config, store)
}

// ============================================================================
// Lookup and validation
// ============================================================================

#[tokio::test]
async fn unknown_repository_is_rejected_before_cloning() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);

    let err = service.list_directory("ghost", "main", None).await.unwrap_err();

    assert!(matches!(err, Error::RepoNotFound { ref name } if name == "ghost"));
    assert!(!home.repo_dir("demo").exists());
}

#[tokio::test]
async fn unconfigured_branch_lists_available_branches() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);

    let err = service.read_file("demo", "feature", "README.md").await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Branch \"feature\" not found in \"demo\", available branches: main, dev"
    );
    assert!(!home.repo_dir("demo").exists());
}

#[tokio::test]
async fn alias_resolves_to_the_same_working_tree() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);

    let file = service.read_file("sample", "main", "README.md").await.unwrap();

    assert_eq!(file.content, "# main");
    home.assert_repo_file_exists("demo", "README.md");
}

// ============================================================================
// Listing and reading
// ============================================================================

#[tokio::test]
async fn listing_switches_to_the_requested_branch() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);
    service.read_file("demo", "dev", "README.md").await.unwrap();

    let list = service.list_directory("demo", "main", Some("")).await.unwrap();

    assert_eq!(list.path, "src");
    assert_eq!(list.entries, vec![".rr.md", "test/"]);
    let prompts: Vec<_> = list.prompts.iter().map(|p| p.path.as_str()).collect();
    assert_eq!(prompts, vec![".reporef.md", "src/.rr.md"]);
    assert_eq!(
        service.store().current_branch("demo").unwrap().as_deref(),
        Some("main")
    );
}

#[tokio::test]
async fn reading_a_missing_file_is_not_found() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);

    let err = service.read_file("demo", "main", "nope.md").await.unwrap_err();

    assert!(matches!(err, Error::PathNotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn escaping_path_is_rejected() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);

    let err = service
        .read_file("demo", "main", "../../config.yml")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidPath(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reads_of_different_branches_see_their_own_content() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = Arc::new(service(&home, &upstream));
    service.clone_repo("demo").await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let service = Arc::clone(&service);
        let branch = if i % 2 == 0 { "main" } else { "dev" };
        tasks.push(tokio::spawn(async move {
            let file = service.read_file("demo", branch, "README.md").await.unwrap();
            (branch, file.content)
        }));
    }

    for task in tasks {
        let (branch, content) = task.await.unwrap();
        assert_eq!(content, format!("# {branch}"));
    }
}

// ============================================================================
// Search and cache
// ============================================================================

#[tokio::test]
async fn search_is_case_insensitive_and_per_branch() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);

    let main = service.search("demo", "main", "test", None).await.unwrap();
    let dev = service.search("demo", "dev", "test", None).await.unwrap();

    assert_eq!(main.matches, vec!["src/test/index.ts"]);
    assert_eq!(dev.matches, vec!["lib/TEST/type.ts", "src/test/index.ts"]);
    assert_eq!(dev.total, 2);
}

#[tokio::test]
async fn cached_search_does_not_touch_the_working_tree() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);
    service.search("demo", "dev", ".", None).await.unwrap();
    service.read_file("demo", "main", "README.md").await.unwrap();

    let result = service.search("demo", "dev", r"\.ts$", None).await.unwrap();

    assert_eq!(result.total, 2);
    assert_eq!(
        service.store().current_branch("demo").unwrap().as_deref(),
        Some("main")
    );
}

#[tokio::test]
async fn invalid_pattern_is_reported_before_cloning() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);

    let err = service.search("demo", "main", "(oops", None).await.unwrap_err();

    assert!(matches!(err, Error::InvalidPattern(_)));
    assert!(!home.repo_dir("demo").exists());
}

#[tokio::test]
async fn status_lists_built_keys_in_order() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);

    service.build_cache("demo", "main").await.unwrap();
    service.build_cache("demo", "dev").await.unwrap();

    let status = service.cache_status();
    let keys: Vec<_> = status.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["demo_dev", "demo_main"]);
    assert_eq!(status["demo_main"], 4);
    assert_eq!(status["demo_dev"], 5);
}

#[tokio::test]
async fn refresh_picks_up_upstream_changes() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);
    service.build_cache("demo", "main").await.unwrap();
    upstream.commit("main", &[("docs/new-test.md", "new")]);

    let stale = service.search("demo", "main", "new-test", None).await.unwrap();
    let report = service.refresh(Some("d"), Some("main")).await.unwrap();
    let fresh = service.search("demo", "main", "new-test", None).await.unwrap();

    assert_eq!(stale.total, 0);
    assert!(report.failed.is_empty());
    assert_eq!(report.refreshed.len(), 1);
    assert_eq!(report.refreshed[0].key, "demo_main");
    assert_eq!(report.refreshed[0].files, 5);
    assert_eq!(fresh.matches, vec!["docs/new-test.md"]);
}

#[tokio::test]
async fn refresh_without_arguments_covers_every_configured_branch() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);

    let report = service.refresh(None, None).await.unwrap();

    let keys: Vec<_> = report.refreshed.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["demo_main", "demo_dev"]);
    assert_eq!(service.cache_status().len(), 2);
}

#[tokio::test]
async fn refresh_reports_branches_missing_upstream() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);
    service.clone_repo("demo").await.unwrap();
    run_git(upstream.path(), &["branch", "-D", "dev"]);
    let report = service.refresh(Some("demo"), None).await.unwrap();

    assert_eq!(report.refreshed.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].key, "demo_dev");
    assert!(report.failed[0].error.contains("available branches: main, dev"));
}

#[tokio::test]
async fn update_clears_the_cache_entry_of_a_moved_branch() {
    let home = TestHome::new();
    let upstream = upstream();
    let service = service(&home, &upstream);
    service.build_cache("demo", "main").await.unwrap();
    service.build_cache("demo", "dev").await.unwrap();
    service.build_cache("demo", "main").await.unwrap();
    upstream.commit("main", &[("CHANGELOG.md", "v2")]);

    let report = service.update_repo("demo").await.unwrap();

    assert!(report.changed);
    assert!(!service.cache().contains("demo", "main"));
    assert!(service.cache().contains("demo", "dev"));
}
