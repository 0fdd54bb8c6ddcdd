//! System prompt builder.
//!
//! Sections (in order):
//! 1. Role
//! 2. Tool catalog (whatever the registry holds, remote tools included)
//! 3. Collaboration workflow, only when connected
//! 4. Guidelines and identity

use crate::types::ConnectionState;
use tracing::debug;

const ROLE: &str = r#"
# Role

You are a Research Assistant agent. You research topics on the web, keep a
log of activity observed for the subjects you track, summarize long documents
and write reports.
"#;

const COLLABORATION: &str = r#"
# Collaboration

You are connected to a collaboration server. Other agents may be able to help
with a task:
1. List the connected agents to see who is available.
2. Create a thread and add the agents that are relevant.
3. Send your request as a message and wait for mentions before continuing.
4. Fold their answers into your own findings.
"#;

const GUIDELINES: &str = r#"
# Guidelines

- Cite the URLs you used.
- Log notable activity with log_activity when you learn something about a tracked subject.
- Keep answers concise; offer a report when the research is substantial.
- End each answer by asking whether more research is needed.
"#;

/// Build the system prompt for a session.
pub fn build_system_prompt(tool_catalog: &str, agent_id: &str, state: ConnectionState) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(ROLE);

    prompt.push_str("\n# Available Tools\n\n");
    if tool_catalog.is_empty() {
        prompt.push_str("(none)\n");
    } else {
        prompt.push_str(tool_catalog);
        prompt.push('\n');
    }

    if state == ConnectionState::Connected {
        prompt.push_str(COLLABORATION);
    }

    prompt.push_str(GUIDELINES);
    prompt.push_str(&format!("\nYour agent ID is: {}\n", agent_id));

    debug!("System prompt: {} chars", prompt.len());
    prompt
}
