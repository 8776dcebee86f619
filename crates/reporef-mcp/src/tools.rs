//! MCP tool definitions and results
//!
//! - `get_repo` - Repository metadata, or the list of repositories
//! - `get_file_list` - Directory entries of one branch
//! - `get_file_content` - File text of one branch
//! - `search_repo` - Regex search over the file paths of one branch
//! - `manage_cache` - Path cache status and refresh

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Tool definition for MCP protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Result from a tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// Content types for tool results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: content.into(),
            }],
            is_error: None,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// Text of the first content block.
    pub fn first_text(&self) -> &str {
        match self.content.first() {
            Some(ToolContent::Text { text }) => text,
            None => "",
        }
    }
}

fn repo_and_branch() -> serde_json::Value {
    json!({
        "repo": {
            "type": "string",
            "description": "The name or alias of the repository"
        },
        "branch": {
            "type": "string",
            "description": "The name of the branch"
        }
    })
}

fn schema(extra: serde_json::Value, required: &[&str]) -> serde_json::Value {
    let mut properties = repo_and_branch();
    if let (Some(base), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
        base.extend(extra.clone());
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Get all available tool definitions
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_repo".to_string(),
            description: "Get a repository's description and branches. Without a name, or with an \
                          unknown one, lists every available repository"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "The name or alias of the repository"
                    }
                }
            }),
        },
        ToolDefinition {
            name: "get_file_list".to_string(),
            description: "List the files and directories at a path of a repository branch. \
                          Directories end with '/'"
                .to_string(),
            input_schema: schema(
                json!({
                    "path": {
                        "type": "string",
                        "description": "The path of the directory, default is the default entry directory"
                    }
                }),
                &["repo", "branch"],
            ),
        },
        ToolDefinition {
            name: "get_file_content".to_string(),
            description: "Get the content of a file in a repository branch".to_string(),
            input_schema: schema(
                json!({
                    "path": {
                        "type": "string",
                        "description": "The path of the file, with the extension"
                    }
                }),
                &["repo", "branch", "path"],
            ),
        },
        ToolDefinition {
            name: "search_repo".to_string(),
            description: "Search the file paths of a repository branch with a case-insensitive \
                          regular expression"
                .to_string(),
            input_schema: schema(
                json!({
                    "pattern": {
                        "type": "string",
                        "description": "Regular expression matched against relative file paths"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Maximum number of matches to return"
                    }
                }),
                &["repo", "branch", "pattern"],
            ),
        },
        ToolDefinition {
            name: "manage_cache".to_string(),
            description: "Show the path cache status, or refresh it by pulling the latest \
                          upstream content"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": ["status", "refresh"],
                        "description": "What to do with the cache"
                    },
                    "repo": {
                        "type": "string",
                        "description": "Limit refresh to this repository"
                    },
                    "branch": {
                        "type": "string",
                        "description": "Limit refresh to this branch"
                    }
                },
                "required": ["action"]
            }),
        },
    ]
}
