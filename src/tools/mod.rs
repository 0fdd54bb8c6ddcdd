pub mod args;
pub mod builtin;
pub mod traits;

pub use args::ArgumentPolicy;
pub use builtin::{register_builtins, BuiltinDeps};
pub use traits::{ParamSpec, ParamType, Tool, ToolArgs, ToolDefinition, ToolOutput, ToolSpec};

use crate::error::ToolError;
use crate::types::ToolResult;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Name-indexed set of tools with uniform validation and dispatch.
///
/// Tools keep their registration order; names are unique and a registered
/// tool is never replaced.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
    policy: ArgumentPolicy,
}

impl ToolRegistry {
    pub fn new(policy: ArgumentPolicy) -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            policy,
        }
    }

    /// Register a tool. Fails if the name is taken; the first tool stays.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.spec().name.clone();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }
        debug!("Registered tool '{}'", name);
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Register several tools, skipping (and reporting) name collisions.
    ///
    /// Returns the errors for the tools that were not registered.
    pub fn register_all(&mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Vec<ToolError> {
        let mut rejected = Vec::new();
        for tool in tools {
            if let Err(e) = self.register(tool) {
                warn!("Skipping tool: {}", e);
                rejected.push(e);
            }
        }
        rejected
    }

    /// Tool specs in registration order.
    pub fn describe_all(&self) -> Vec<&ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    /// Wire definitions for the catalog (MCP `tools/list`, inference `tools`).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.spec().definition()).collect()
    }

    /// One `- name: description` line per tool, for prompts and the CLI.
    pub fn describe_text(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.spec().name, t.spec().description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate and dispatch, surfacing the typed error.
    pub async fn try_invoke(&self, name: &str, arguments: &Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let args = args::validate(tool.spec(), arguments, self.policy)?;
        tool.execute(args).await
    }

    /// Validate and dispatch; every failure becomes an unsuccessful result.
    pub async fn invoke(&self, name: &str, arguments: &Value) -> ToolResult {
        match self.try_invoke(name, arguments).await {
            Ok(output) => ToolResult::ok(output.text, output.raw),
            Err(e) => {
                warn!("Tool '{}' failed: {}", name, e);
                ToolResult::failure(format!("Error: {}", e))
            }
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.iter().map(|t| &t.spec().name).collect::<Vec<_>>())
            .field("policy", &self.policy)
            .finish()
    }
}
