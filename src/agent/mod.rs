pub mod context;
pub mod loop_;
pub mod system_prompt;

pub use loop_::{run_interactive, ResearchAgent};
pub use system_prompt::build_system_prompt;
