//! Built-in research tools.

pub mod activity;
pub mod report;
pub mod summarize;
pub mod web;

pub use activity::{LogActivityTool, QueryLogsTool};
pub use report::GenerateReportTool;
pub use summarize::SummarizeTool;
pub use web::{FetchUrlTool, WebSearchTool};

use crate::error::ToolError;
use crate::state::ActivityStore;
use crate::tools::{Tool, ToolRegistry};
use crate::web::{PageFetcher, SearchProvider};
use std::path::PathBuf;
use std::sync::Arc;

/// External collaborators the built-in tools delegate to.
pub struct BuiltinDeps {
    pub search: Arc<dyn SearchProvider>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub store: Arc<dyn ActivityStore>,
    pub reports_dir: PathBuf,
    pub agent_name: String,
}

/// The built-in tools, in catalog order.
pub fn builtin_tools(deps: BuiltinDeps) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(WebSearchTool::new(deps.search)),
        Arc::new(FetchUrlTool::new(deps.fetcher)),
        Arc::new(LogActivityTool::new(deps.store.clone())),
        Arc::new(QueryLogsTool::new(deps.store)),
        Arc::new(GenerateReportTool::new(deps.reports_dir, deps.agent_name)),
        Arc::new(SummarizeTool::new()),
    ]
}

/// Register every built-in tool. Fails on the first name collision.
pub fn register_builtins(registry: &mut ToolRegistry, deps: BuiltinDeps) -> Result<(), ToolError> {
    for tool in builtin_tools(deps) {
        registry.register(tool)?;
    }
    Ok(())
}
