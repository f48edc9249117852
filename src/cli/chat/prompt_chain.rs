use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::conversation_state::{ConversationState, Role};

static THINK_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<think>.*?(</think>|$)").expect("think-block pattern is valid")
});

/// A single message in the shape the model server expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &'static str, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

/// Converts the transcript into the message list sent to the model, with the
/// system prompt first. Transcript entries tagged `System` are not forwarded.
pub fn build_prompt_chain(system_prompt: &str, state: &ConversationState) -> Vec<ChatMessage> {
    let mut chain = Vec::with_capacity(state.len() + 1);
    chain.push(ChatMessage::new(Role::System.wire_name(), system_prompt));

    for message in state.get_messages() {
        match message.role {
            Role::User | Role::Ai => {
                chain.push(ChatMessage::new(message.role.wire_name(), &message.content))
            }
            Role::System => {}
        }
    }

    chain
}

/// Removes `<think>...</think>` reasoning blocks from a reply.
pub fn strip_thinking(reply: &str) -> String {
    THINK_BLOCK.replace_all(reply, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_comes_first() {
        let state = ConversationState::new("hi");
        let chain = build_prompt_chain("be helpful", &state);
        assert_eq!(chain[0], ChatMessage::new("system", "be helpful"));
        assert_eq!(chain[1], ChatMessage::new("assistant", "hi"));
    }

    #[test]
    fn preserves_transcript_order() {
        let mut state = ConversationState::new("hi");
        state.add_user_message("first");
        state.add_assistant_message("second");
        state.add_user_message("third");

        let chain = build_prompt_chain("sys", &state);
        let contents: Vec<&str> = chain.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["sys", "hi", "first", "second", "third"]);

        let roles: Vec<&str> = chain.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "assistant", "user", "assistant", "user"]);
    }

    #[test]
    fn braces_are_not_template_placeholders() {
        let mut state = ConversationState::new("hi");
        state.add_user_message("fn main() { println!(\"{x}\"); }");
        let chain = build_prompt_chain("sys", &state);
        assert_eq!(chain[2].content, "fn main() { println!(\"{x}\"); }");
    }

    #[test]
    fn strips_reasoning_blocks() {
        let reply = "<think>\nuser wants a loop\n</think>\n\nUse `for i in 0..3 {}`.";
        assert_eq!(strip_thinking(reply), "Use `for i in 0..3 {}`.");
    }

    #[test]
    fn strips_unterminated_reasoning() {
        assert_eq!(strip_thinking("Answer.<think>still going"), "Answer.");
    }

    #[test]
    fn strips_every_block() {
        let reply = "<think>a</think>one <think>b</think>two";
        assert_eq!(strip_thinking(reply), "one two");
    }

    #[test]
    fn leaves_plain_replies_alone() {
        assert_eq!(strip_thinking("  just text "), "just text");
    }
}
