//! MCP Tool Handlers
//!
//! Each handler parses its typed arguments, delegates to [`RepoService`] and
//! renders the outcome as a [`ToolResult`]. Repository errors surface as
//! `isError` results; only malformed arguments and unknown tools return `Err`.

use reporef_core::{Config, HintFile, RepoService};
use reporef_fs::NormalizedPath;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::tools::ToolResult;
use crate::{Error, Result};

/// Handle a tool call by dispatching to the appropriate handler
pub async fn handle_tool_call(
    service: &RepoService,
    tool_name: &str,
    arguments: Value,
) -> Result<ToolResult> {
    tracing::debug!(tool = %tool_name, "Handling tool call");
    let outcome = match tool_name {
        "get_repo" => handle_get_repo(service, parse_args(arguments)?),
        "get_file_list" => handle_get_file_list(service, parse_args(arguments)?).await,
        "get_file_content" => handle_get_file_content(service, parse_args(arguments)?).await,
        "search_repo" => handle_search_repo(service, parse_args(arguments)?).await,
        "manage_cache" => handle_manage_cache(service, parse_args(arguments)?).await,
        _ => return Err(Error::UnknownTool(tool_name.to_string())),
    };

    match outcome {
        Ok(result) => Ok(result),
        Err(Error::Core(e)) => {
            tracing::warn!(tool = %tool_name, error = %e, "Tool call failed");
            Ok(ToolResult::error(e.to_string()))
        }
        Err(e) => Err(e),
    }
}

/// Missing `arguments` count as an empty object.
fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| Error::InvalidArguments {
        message: e.to_string(),
    })
}

fn json_result(value: &impl Serialize) -> Result<ToolResult> {
    Ok(ToolResult::text(serde_json::to_string_pretty(value)?))
}

// ============================================================================
// get_repo
// ============================================================================

#[derive(Debug, Deserialize)]
struct GetRepoArgs {
    #[serde(default)]
    name: Option<String>,
}

fn repo_summaries(config: &Config) -> Vec<Value> {
    config
        .repos
        .iter()
        .map(|repo| {
            json!({
                "name": repo.name,
                "alias": repo.alias,
                "description": repo.description,
            })
        })
        .collect()
}

fn handle_get_repo(service: &RepoService, args: GetRepoArgs) -> Result<ToolResult> {
    let config = service.config();
    let Some(name) = args.name.filter(|n| !n.is_empty()) else {
        return json_result(&json!({ "repos": repo_summaries(config) }));
    };

    match config.find(&name) {
        Some(repo) => json_result(&json!({
            "name": repo.name,
            "alias": repo.alias,
            "description": repo.description,
            "branches": repo.branches,
        })),
        None => {
            let payload = json!({
                "message": format!("Repository \"{name}\" not found"),
                "availableRepos": repo_summaries(config),
            });
            Ok(ToolResult::error(serde_json::to_string_pretty(&payload)?))
        }
    }
}

// ============================================================================
// get_file_list / get_file_content
// ============================================================================

#[derive(Debug, Deserialize)]
struct FileListArgs {
    repo: String,
    branch: String,
    #[serde(default)]
    path: Option<String>,
}

async fn handle_get_file_list(service: &RepoService, args: FileListArgs) -> Result<ToolResult> {
    let list = service
        .list_directory(&args.repo, &args.branch, args.path.as_deref())
        .await?;
    json_result(&list)
}

#[derive(Debug, Deserialize)]
struct FileContentArgs {
    repo: String,
    branch: String,
    path: String,
}

async fn handle_get_file_content(
    service: &RepoService,
    args: FileContentArgs,
) -> Result<ToolResult> {
    let file = service
        .read_file(&args.repo, &args.branch, &args.path)
        .await?;
    let mut text = format_file_content(&file.path, &file.content);
    text.push_str(&format_hints(&file.prompts));
    Ok(ToolResult::text(text))
}

/// Markdown is returned as is; anything else is fenced and tagged with its
/// extension.
fn format_file_content(path: &str, content: &str) -> String {
    let extension = NormalizedPath::new(path)
        .extension()
        .map(str::to_lowercase)
        .unwrap_or_default();
    if extension == "md" || extension == "markdown" {
        content.to_string()
    } else {
        format!("```{extension}\n{content}\n```")
    }
}

fn format_hints(hints: &[HintFile]) -> String {
    if hints.is_empty() {
        return String::new();
    }
    let mut section = String::from("\n\n---\n\n## Repository notes\n");
    for hint in hints {
        section.push_str(&format!("\n### {}\n\n{}\n", hint.path, hint.content.trim_end()));
    }
    section
}

// ============================================================================
// search_repo
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchArgs {
    repo: String,
    branch: String,
    pattern: String,
    #[serde(default)]
    limit: Option<usize>,
}

async fn handle_search_repo(service: &RepoService, args: SearchArgs) -> Result<ToolResult> {
    let result = service
        .search(&args.repo, &args.branch, &args.pattern, args.limit)
        .await?;
    json_result(&result)
}

// ============================================================================
// manage_cache
// ============================================================================

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CacheAction {
    Status,
    Refresh,
}

#[derive(Debug, Deserialize)]
struct ManageCacheArgs {
    action: CacheAction,
    #[serde(default)]
    repo: Option<String>,
    #[serde(default)]
    branch: Option<String>,
}

async fn handle_manage_cache(service: &RepoService, args: ManageCacheArgs) -> Result<ToolResult> {
    match args.action {
        CacheAction::Status => json_result(&service.cache_status()),
        CacheAction::Refresh => {
            let report = service
                .refresh(args.repo.as_deref(), args.branch.as_deref())
                .await?;
            tracing::info!(
                refreshed = report.refreshed.len(),
                failed = report.failed.len(),
                "Cache refreshed"
            );
            json_result(&report)
        }
    }
}
