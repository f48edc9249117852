use clap::ValueEnum;

/// Flavour of the chat front-end: headings, greeting and system prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Persona {
    /// Friendly pair programmer that debugs with print statements
    #[default]
    Companion,
    /// Terse assistant that answers with code only
    Assistant,
}

impl Persona {
    pub fn title(&self) -> &'static str {
        match self {
            Persona::Companion => "DeepSeek Code Companion",
            Persona::Assistant => "Code Assistant",
        }
    }

    pub fn caption(&self) -> &'static str {
        match self {
            Persona::Companion => "Your AI Pair Programmer with Debugging Superpowers",
            Persona::Assistant => "Professional AI Pair Programming",
        }
    }

    /// First transcript entry of every session.
    pub fn greeting(&self) -> &'static str {
        match self {
            Persona::Companion => "Hi! i'm Deepseek AI how may i help you?",
            Persona::Assistant => "How can I help you with your code today?",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Persona::Companion => {
                "You are an expert AI coding assistant, providing concise, correct solutions \
                 with strategic print statements for debugging. Always respond in English."
            }
            Persona::Assistant => {
                "You are a professional coding assistant. Provide only direct, implementable \
                 solutions without explanations unless specifically asked. Focus on clean, \
                 efficient code."
            }
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Persona::Companion => "Type your coding question here...",
            Persona::Assistant => "Type your code question...",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_is_default() {
        assert_eq!(Persona::default(), Persona::Companion);
    }

    #[test]
    fn system_prompts_join_cleanly() {
        for persona in [Persona::Companion, Persona::Assistant] {
            let prompt = persona.system_prompt();
            assert!(!prompt.contains("  "), "double space in {:?}", persona);
            assert!(prompt.starts_with("You are"));
        }
    }

    #[test]
    fn parses_from_cli_value() {
        assert_eq!(Persona::from_str("assistant", true), Ok(Persona::Assistant));
        assert!(Persona::from_str("pirate", true).is_err());
    }
}
