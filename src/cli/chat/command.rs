use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}. Type /help for the list of commands.")]
    Unknown(String),

    #[error("Invalid temperature '{0}', expected a number such as 0.3")]
    InvalidTemperature(String),
}

/// A line of user input, either a slash command or a prompt for the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Prompt(String),
    Help,
    Clear,
    Quit,
    History,
    Models,
    /// `None` shows the current model
    Model(Option<String>),
    /// `None` shows the current temperature
    Temperature(Option<f32>),
}

impl Command {
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let input = input.trim();
        let Some(rest) = input.strip_prefix('/') else {
            return Ok(Command::Prompt(input.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };

        let command = match name {
            "help" => Command::Help,
            "clear" => Command::Clear,
            "quit" | "exit" => Command::Quit,
            "history" => Command::History,
            "models" => Command::Models,
            "model" => Command::Model(arg.map(str::to_string)),
            "temperature" | "temp" => match arg {
                Some(value) => Command::Temperature(Some(
                    value
                        .parse::<f32>()
                        .map_err(|_| CommandError::InvalidTemperature(value.to_string()))?,
                )),
                None => Command::Temperature(None),
            },
            _ => return Err(CommandError::Unknown(format!("/{}", name))),
        };

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_prompt() {
        assert_eq!(
            Command::parse("  explain lifetimes \n").unwrap(),
            Command::Prompt("explain lifetimes".to_string())
        );
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(Command::parse("/help").unwrap(), Command::Help);
        assert_eq!(Command::parse("/clear").unwrap(), Command::Clear);
        assert_eq!(Command::parse("/exit").unwrap(), Command::Quit);
        assert_eq!(Command::parse("/quit").unwrap(), Command::Quit);
        assert_eq!(Command::parse("/history").unwrap(), Command::History);
        assert_eq!(Command::parse("/models").unwrap(), Command::Models);
    }

    #[test]
    fn model_with_and_without_argument() {
        assert_eq!(Command::parse("/model").unwrap(), Command::Model(None));
        assert_eq!(Command::parse("/model   ").unwrap(), Command::Model(None));
        assert_eq!(
            Command::parse("/model deepseek-r1:7b").unwrap(),
            Command::Model(Some("deepseek-r1:7b".to_string()))
        );
    }

    #[test]
    fn temperature_argument_must_be_numeric() {
        assert_eq!(
            Command::parse("/temperature 0.7").unwrap(),
            Command::Temperature(Some(0.7))
        );
        assert_eq!(Command::parse("/temp").unwrap(), Command::Temperature(None));
        assert_eq!(
            Command::parse("/temperature hot"),
            Err(CommandError::InvalidTemperature("hot".to_string()))
        );
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            Command::parse("/frobnicate now"),
            Err(CommandError::Unknown("/frobnicate".to_string()))
        );
    }
}
