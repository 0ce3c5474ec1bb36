//! Tool registry - manages and dispatches tool calls
//!
//! Central hub for registering tools and routing tool calls to handlers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Result, ToolCall, ToolDefinition, ToolResult};
use crate::tools::search::WebSearch;

/// Name of the web search tool exposed to the model
pub const WEB_SEARCH: &str = "web_search";

/// Registry of available tools
pub struct ToolRegistry {
    /// Tool definitions indexed by name
    definitions: HashMap<String, ToolDefinition>,
    /// Search backend, when web search is enabled
    search: Option<Arc<dyn WebSearch>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
            search: None,
        }
    }

    /// Create a registry with the web search tool
    pub fn with_search(search: Arc<dyn WebSearch>) -> Self {
        let mut registry = Self::new();
        registry.search = Some(search);
        registry.register_search_tool();
        registry
    }

    fn register_search_tool(&mut self) {
        self.register(ToolDefinition::function(
            WEB_SEARCH,
            "Search the web for AWS CLI usage, service documentation and known misconfigurations",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
        ));
    }

    /// Register a tool definition
    pub fn register(&mut self, definition: ToolDefinition) {
        self.definitions
            .insert(definition.function.name.clone(), definition);
    }

    /// Get all tool definitions
    pub fn all_definitions(&self) -> Vec<&ToolDefinition> {
        self.definitions.values().collect()
    }

    /// Check if web search is enabled
    pub fn has_search(&self) -> bool {
        self.search.is_some()
    }

    /// Execute a tool call.
    ///
    /// Tool failures come back as failed results so the model can see them.
    pub async fn execute(&self, tool_call: &ToolCall) -> Result<ToolResult> {
        if let Some(ref error) = tool_call.argument_error {
            return Ok(ToolResult::failure(
                &tool_call.name,
                format!("Invalid arguments, expected a JSON object: {}", error),
            ));
        }

        match (tool_call.name.as_str(), &self.search) {
            (WEB_SEARCH, Some(search)) => {
                let query = match tool_call.get_string("query") {
                    Some(q) if !q.trim().is_empty() => q,
                    _ => {
                        return Ok(ToolResult::failure(
                            WEB_SEARCH,
                            "Missing required argument: query",
                        ))
                    }
                };

                tracing::info!(query = %query, "web search");
                match search.search(&query).await {
                    Ok(output) => Ok(ToolResult::success(WEB_SEARCH, output)),
                    Err(e) => {
                        tracing::warn!(error = %e, "web search failed");
                        Ok(ToolResult::failure(WEB_SEARCH, e.to_string()))
                    }
                }
            }
            _ => Ok(ToolResult::failure(
                &tool_call.name,
                format!("Unknown tool: {}", tool_call.name),
            )),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
