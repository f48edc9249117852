use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
    System,
}

impl Role {
    /// Role name understood by the model server.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Ai => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::User => "user",
            Role::Ai => "ai",
            Role::System => "system",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// The transcript of one session, in conversation order.
pub struct ConversationState {
    greeting: String,
    messages: Vec<Message>,
}

impl ConversationState {
    /// Starts a session seeded with a single greeting from the model.
    pub fn new(greeting: &str) -> Self {
        let mut state = Self {
            greeting: greeting.to_string(),
            messages: Vec::new(),
        };
        state.seed();
        state
    }

    fn seed(&mut self) {
        self.messages.push(Message {
            role: Role::Ai,
            content: self.greeting.clone(),
        });
    }

    pub fn add_user_message(&mut self, message: &str) {
        self.push(Role::User, message);
    }

    pub fn add_assistant_message(&mut self, message: &str) {
        self.push(Role::Ai, message);
    }

    fn push(&mut self, role: Role, content: &str) {
        self.messages.push(Message {
            role,
            content: content.to_string(),
        });
    }

    pub fn get_messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Forgets every turn and starts over from the greeting.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.seed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_greeting() {
        let state = ConversationState::new("hello there");
        assert_eq!(state.len(), 1);
        assert_eq!(
            state.last(),
            Some(&Message {
                role: Role::Ai,
                content: "hello there".to_string()
            })
        );
    }

    #[test]
    fn each_turn_grows_transcript_by_one() {
        let mut state = ConversationState::new("hi");
        state.add_user_message("what is a borrow?");
        assert_eq!(state.len(), 2);
        state.add_assistant_message("a reference");
        assert_eq!(state.len(), 3);

        let roles: Vec<Role> = state.get_messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Ai, Role::User, Role::Ai]);
    }

    #[test]
    fn clear_reseeds_greeting() {
        let mut state = ConversationState::new("hi");
        state.add_user_message("one");
        state.add_assistant_message("two");
        state.clear();
        assert_eq!(state.len(), 1);
        assert_eq!(state.get_messages()[0].content, "hi");
        assert!(!state.is_empty());
    }

    #[test]
    fn role_names() {
        assert_eq!(Role::Ai.wire_name(), "assistant");
        assert_eq!(Role::Ai.to_string(), "ai");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }
}
