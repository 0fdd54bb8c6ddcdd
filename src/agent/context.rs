//! Message context builder for the agent loop.

use crate::types::*;

/// Build the message list for the first inference call of a turn.
///
/// Only the last `history_window` history messages are included.
pub fn build_messages(
    system_prompt: &str,
    history: &[ChatMessage],
    history_window: usize,
    user_input: &str,
) -> Vec<ChatMessage> {
    let start = history.len().saturating_sub(history_window);

    let mut messages = Vec::with_capacity(history.len() - start + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend_from_slice(&history[start..]);
    messages.push(ChatMessage::user(user_input));
    messages
}

/// Record a finished turn and keep the history bounded.
pub fn record_turn(history: &mut Vec<ChatMessage>, user_input: &str, answer: &str, limit: usize) {
    history.push(ChatMessage::user(user_input));
    history.push(ChatMessage::assistant(answer));
    if history.len() > limit {
        history.drain(..history.len() - limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_keeps_latest_history() {
        let history: Vec<_> = (0..30).map(|i| ChatMessage::user(format!("m{}", i))).collect();
        let messages = build_messages("sys", &history, 20, "now");

        assert_eq!(messages.len(), 22);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[1].content, "m10");
        assert_eq!(messages.last().unwrap().content, "now");
    }

    #[test]
    fn history_is_trimmed_in_pairs() {
        let mut history = Vec::new();
        for i in 0..15 {
            record_turn(&mut history, &format!("q{}", i), &format!("a{}", i), 20);
        }
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].content, "q5");
        assert_eq!(history[19].content, "a14");
    }
}
