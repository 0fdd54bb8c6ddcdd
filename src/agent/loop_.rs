//! Interactive research loop.
//!
//! Each user line starts a turn:
//! 1. Build messages (system prompt, bounded history, the question)
//! 2. Call inference with the registry's tool catalog
//! 3. Execute requested tool calls through the registry, feed results back
//! 4. Repeat until the model answers without tool calls
//!
//! A failed turn is reported and the session goes on.

use crate::agent::context;
use crate::llm::ChatModel;
use crate::tools::ToolRegistry;
use crate::types::*;
use anyhow::{bail, Result};
use colored::Colorize;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Inputs that end the session.
const EXIT_WORDS: &[&str] = &["exit", "quit", "q"];

pub struct ResearchAgent {
    model: Arc<dyn ChatModel>,
    registry: Arc<ToolRegistry>,
    system_prompt: String,
    max_iterations: u32,
    history_limit: usize,
    history: Vec<ChatMessage>,
}

impl ResearchAgent {
    pub fn new(
        model: Arc<dyn ChatModel>,
        registry: Arc<ToolRegistry>,
        system_prompt: String,
        max_iterations: u32,
        history_limit: usize,
    ) -> Self {
        Self {
            model,
            registry,
            system_prompt,
            max_iterations: max_iterations.max(1),
            history_limit,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Answer one question, running tool calls as the model requests them.
    ///
    /// History is only updated when the turn completes.
    pub async fn run_turn(&mut self, input: &str) -> Result<String> {
        let tool_defs = self.registry.definitions();
        let mut messages =
            context::build_messages(&self.system_prompt, &self.history, self.history_limit, input);

        for iteration in 1..=self.max_iterations {
            let response = self.model.chat(&messages, &tool_defs).await?;

            if response.tool_calls.is_empty() {
                let answer = response.content.unwrap_or_default();
                context::record_turn(&mut self.history, input, &answer, self.history_limit);
                return Ok(answer);
            }

            let mut assistant = ChatMessage::assistant(response.content.unwrap_or_default());
            assistant.tool_calls = response.tool_calls;
            let calls = assistant.tool_calls.clone();
            messages.push(assistant);

            for tc in &calls {
                info!("[Step {}] Tool: {}({})", iteration, tc.name, tc.arguments);
                let result = self.registry.invoke(&tc.name, &tc.arguments).await;
                if result.success {
                    debug!("[Step {}] Tool result: {} chars", iteration, result.text.len());
                } else {
                    warn!("[Step {}] Tool error: {}", iteration, result.text);
                }
                messages.push(ChatMessage::tool(&tc.id, result.text));
            }
        }

        bail!(
            "Stopped after {} tool rounds without a final answer",
            self.max_iterations
        )
    }
}

/// Read questions line by line until an exit word, EOF or cancellation.
pub async fn run_interactive<R>(agent: &mut ResearchAgent, reader: R, cancel: CancellationToken) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    println!("Enter your research questions (type 'exit' to quit):");

    loop {
        print_prompt();

        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_word(input) {
            break;
        }

        println!("\n{}\n", "Researching...".dimmed());
        match agent.run_turn(input).await {
            Ok(answer) => println!("\n{} {}\n", "Agent:".cyan().bold(), answer),
            Err(e) => println!("\n{} {:#}\n", "Error:".red().bold(), e),
        }

        if cancel.is_cancelled() {
            break;
        }
    }

    println!("\nGoodbye!");
    info!("Session ended");
    Ok(())
}

pub fn is_exit_word(input: &str) -> bool {
    EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

fn print_prompt() {
    use std::io::Write;
    print!("{} ", "You:".green().bold());
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::SummarizeTool;
    use crate::tools::ToolDefinition;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records what it was sent.
    struct Scripted {
        replies: Mutex<VecDeque<InferenceResponse>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl Scripted {
        fn new(replies: Vec<InferenceResponse>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for Scripted {
        async fn chat(&self, messages: &[ChatMessage], _tools: &[ToolDefinition]) -> Result<InferenceResponse> {
            self.seen.lock().unwrap().push(messages.to_vec());
            match self.replies.lock().unwrap().pop_front() {
                Some(r) => Ok(r),
                None => bail!("no scripted reply left"),
            }
        }
    }

    fn answer(text: &str) -> InferenceResponse {
        InferenceResponse {
            content: Some(text.into()),
            tool_calls: Vec::new(),
            usage: TokenUsage::default(),
        }
    }

    fn call(id: &str, name: &str, arguments: serde_json::Value) -> InferenceResponse {
        InferenceResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: id.into(),
                name: name.into(),
                arguments,
            }],
            usage: TokenUsage::default(),
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::default();
        registry.register(Arc::new(SummarizeTool::new())).unwrap();
        Arc::new(registry)
    }

    #[tokio::test]
    async fn tool_results_are_fed_back() {
        let model = Scripted::new(vec![
            call("c1", "summarize", json!({"text": "alpha beta gamma", "max_length": 2})),
            answer("done"),
        ]);
        let mut agent = ResearchAgent::new(model.clone(), registry(), "sys".into(), 5, 20);

        assert_eq!(agent.run_turn("summarize it").await.unwrap(), "done");

        let seen = model.seen.lock().unwrap();
        let second = &seen[1];
        let tool_msg = second.last().unwrap();
        assert_eq!(tool_msg.role, ChatRole::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("c1"));
        assert!(tool_msg.content.contains("alpha beta..."));
        assert_eq!(second[second.len() - 2].tool_calls.len(), 1);

        assert_eq!(agent.history().len(), 2);
        assert_eq!(agent.history()[1].content, "done");
    }

    #[tokio::test]
    async fn failed_tools_do_not_abort_the_turn() {
        let model = Scripted::new(vec![call("c1", "no_such_tool", json!({})), answer("recovered")]);
        let mut agent = ResearchAgent::new(model.clone(), registry(), "sys".into(), 5, 20);

        assert_eq!(agent.run_turn("go").await.unwrap(), "recovered");
        let seen = model.seen.lock().unwrap();
        assert!(seen[1].last().unwrap().content.starts_with("Error: unknown tool"));
    }

    #[tokio::test]
    async fn malformed_arguments_are_reported_to_the_model() {
        let model = Scripted::new(vec![
            call("c1", "summarize", json!("{\"text\": \"unterminated")),
            answer("retrying"),
        ]);
        let mut agent = ResearchAgent::new(model.clone(), registry(), "sys".into(), 5, 20);

        assert_eq!(agent.run_turn("go").await.unwrap(), "retrying");
        let seen = model.seen.lock().unwrap();
        let tool_msg = seen[1].last().unwrap();
        assert!(tool_msg.content.starts_with("Error: "));
        assert!(tool_msg.content.contains("arguments must be a JSON object, got string"));
    }

    #[tokio::test]
    async fn iteration_limit_ends_the_turn() {
        let model = Scripted::new(vec![
            call("c1", "summarize", json!({"text": "x"})),
            call("c2", "summarize", json!({"text": "y"})),
        ]);
        let mut agent = ResearchAgent::new(model, registry(), "sys".into(), 2, 20);

        let err = agent.run_turn("loop").await.unwrap_err();
        assert!(err.to_string().contains("2 tool rounds"));
        assert!(agent.history().is_empty());
    }

    #[tokio::test]
    async fn session_survives_errors_and_stops_on_exit() {
        let model = Scripted::new(vec![answer("first")]);
        let mut agent = ResearchAgent::new(model.clone(), registry(), "sys".into(), 3, 20);

        // Second question has no scripted reply: printed as an error, not fatal.
        let input: &[u8] = b"one\n\ntwo\nQUIT\nnever read\n";
        run_interactive(&mut agent, input, CancellationToken::new()).await.unwrap();

        assert_eq!(model.seen.lock().unwrap().len(), 2);
        assert_eq!(agent.history().len(), 2);
    }

    #[tokio::test]
    async fn cancellation_ends_the_session() {
        let model = Scripted::new(vec![]);
        let mut agent = ResearchAgent::new(model.clone(), registry(), "sys".into(), 3, 20);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let input: &[u8] = b"question\n";
        run_interactive(&mut agent, input, cancel).await.unwrap();
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn exit_words_are_case_insensitive() {
        assert!(is_exit_word("Exit"));
        assert!(is_exit_word("q"));
        assert!(!is_exit_word("quit now"));
    }
}
