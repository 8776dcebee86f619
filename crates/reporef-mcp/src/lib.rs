//! MCP server for reporef
//!
//! Exposes the configured repositories to model clients over the Model
//! Context Protocol:
//!
//! ```text
//! [ MCP Client ]
//!        | (JSON-RPC over stdio)
//!        v
//! [ reporef-mcp (ReporefServer) ]
//!        | (Rust API)
//!        v
//! [ reporef-core (RepoService) ]
//!        |
//!        +--> [ ~/.repo-ref/config.yml ]
//!        +--> [ ~/.repo-ref/repos/<name> (working trees) ]
//! ```
//!
//! # Tools
//!
//! - `get_repo`, `get_file_list`, `get_file_content`, `search_repo`,
//!   `manage_cache` (see [`tools`])

pub mod error;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;

pub use error::{Error, Result};
pub use server::{ReporefServer, build_instructions};
pub use tools::{ToolContent, ToolDefinition, ToolResult, get_tool_definitions};
