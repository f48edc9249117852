pub mod command;
pub mod conversation_state;
pub mod persona;
pub mod prompt;
pub mod prompt_chain;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use color_print::cformat;
use command::Command;
use conversation_state::{ConversationState, Role};
use crossterm::{cursor, queue, terminal};
use eyre::Result;
use prompt::generate_prompt;
use prompt_chain::{build_prompt_chain, strip_thinking};
use rustyline::error::ReadlineError;
use tracing::{debug, info, warn};

use crate::config::{ChatConfig, AVAILABLE_MODELS};
use crate::ollama_client::ChatBackend;

const HELP_TEXT: &str = "
/clear              Clear the conversation history
/history            Show the conversation so far
/model [name]       Show or switch the model
/models             List models available on the server
/temperature [t]    Show or set the sampling temperature (0.0 - 1.0)
/help               Show this help dialogue
/quit               Quit the application
";

const DIVIDER: &str = "────────────────────────────────────────────────────────────";

/// What happened to a prompt sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Replied,
    ServerUnreachable,
}

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    config: ChatConfig,
    conversation_state: ConversationState,
    backend: Arc<dyn ChatBackend>,
    last_turn: Option<TurnOutcome>,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
        config: ChatConfig,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        let conversation_state = ConversationState::new(config.persona.greeting());
        Self {
            output,
            input,
            interactive,
            config,
            conversation_state,
            backend,
            last_turn: None,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        if self.interactive {
            self.print_welcome()?;
            self.render_transcript()?;
        }

        // Single query, then exit
        if let Some(input) = self.input.take() {
            if input.trim().is_empty() {
                writeln!(self.output, "Nothing to send: the input is empty.")?;
                return Ok(ExitCode::FAILURE);
            }

            self.handle_input(&input).await?;
            return match self.last_turn {
                Some(TurnOutcome::ServerUnreachable) => Ok(ExitCode::FAILURE),
                _ => Ok(ExitCode::SUCCESS),
            };
        }

        if self.interactive {
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    fn print_welcome(&mut self) -> Result<()> {
        let persona = self.config.persona;
        writeln!(self.output, "{}", cformat!("<bold,cyan>{}</>", persona.title()))?;
        writeln!(self.output, "{}", cformat!("<dim>{}</>", persona.caption()))?;
        writeln!(
            self.output,
            "{}",
            cformat!(
                "<dim>model: {}  temperature: {:.1}  server: {}</>",
                self.config.model,
                self.config.temperature,
                self.config.host
            )
        )?;
        writeln!(self.output, "{}", DIVIDER)?;
        Ok(())
    }

    fn render_transcript(&mut self) -> Result<()> {
        let messages = self.conversation_state.get_messages().to_vec();
        for message in messages {
            self.render_message(message.role, &message.content)?;
        }
        Ok(())
    }

    fn render_message(&mut self, role: Role, content: &str) -> Result<()> {
        let label = match role {
            Role::User => cformat!("<bold,green>{}</>", role),
            Role::Ai => cformat!("<bold,blue>{}</>", role),
            Role::System => cformat!("<bold,yellow>{}</>", role),
        };
        writeln!(self.output, "{}", label)?;
        writeln!(self.output, "{}\n", content)?;
        Ok(())
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;
        let history = prompt::history_path();
        if let Some(path) = &history {
            if rl.load_history(path).is_err() {
                debug!("No input history at {}", path.display());
            }
        }

        writeln!(
            self.output,
            "{}",
            cformat!("<dim>{}  (/help for commands)</>", self.config.persona.placeholder())
        )?;

        loop {
            let prompt_text = generate_prompt(None);
            let readline = rl.readline(&prompt_text);

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    match self.handle_input(&line).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => writeln!(self.output, "Error: {}", e)?,
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        if let Some(path) = &history {
            if let Err(e) = rl.save_history(path) {
                warn!("Failed to save input history to {}: {}", path.display(), e);
            }
        }

        Ok(())
    }

    /// Handles one line of input. Returns `false` when the session should end.
    async fn handle_input(&mut self, input: &str) -> Result<bool> {
        let command = match Command::parse(input) {
            Ok(command) => command,
            Err(e) => {
                writeln!(self.output, "{}", e)?;
                return Ok(true);
            }
        };

        match command {
            Command::Quit => return Ok(false),
            Command::Help => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            Command::Clear => {
                self.conversation_state.clear();
                writeln!(self.output, "Conversation cleared.\n")?;
                self.render_transcript()?;
            }
            Command::History => {
                self.render_transcript()?;
            }
            Command::Model(None) => {
                writeln!(self.output, "Current model: {}", self.config.model)?;
            }
            Command::Model(Some(name)) => {
                self.config.set_model(&name)?;
                info!("Switched model to {}", self.config.model);
                writeln!(self.output, "Model set to {}", self.config.model)?;
                if !AVAILABLE_MODELS.contains(&self.config.model.as_str()) {
                    writeln!(
                        self.output,
                        "Note: {} is not one of the suggested models ({}); make sure the server has it.",
                        self.config.model,
                        AVAILABLE_MODELS.join(", ")
                    )?;
                }
            }
            Command::Models => self.print_models().await?,
            Command::Temperature(None) => {
                writeln!(self.output, "Current temperature: {:.1}", self.config.temperature)?;
            }
            Command::Temperature(Some(t)) => {
                self.config.set_temperature(t)?;
                writeln!(self.output, "Temperature set to {:.1}", self.config.temperature)?;
            }
            Command::Prompt(text) => {
                if !text.is_empty() {
                    self.process_chat_input(&text).await?;
                }
            }
        }

        Ok(true)
    }

    async fn print_models(&mut self) -> Result<()> {
        match self.backend.list_models().await {
            Ok(models) if models.is_empty() => {
                writeln!(self.output, "The server has no models installed.")?;
            }
            Ok(models) => {
                for model in models {
                    let marker = if model == self.config.model { "*" } else { " " };
                    writeln!(self.output, "{} {}", marker, model)?;
                }
            }
            Err(e) if e.is_unreachable() => {
                writeln!(self.output, "{}", e)?;
                writeln!(self.output, "Suggested models: {}", AVAILABLE_MODELS.join(", "))?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Sends a user turn to the model and records the reply. An unreachable
    /// server is reported to the user and leaves the user turn in place.
    pub async fn process_chat_input(&mut self, input: &str) -> Result<TurnOutcome> {
        self.conversation_state.add_user_message(input);

        let chain = build_prompt_chain(self.config.persona.system_prompt(), &self.conversation_state);

        self.show_processing()?;
        let result = self
            .backend
            .chat(&self.config.model, self.config.temperature, &chain)
            .await;
        self.clear_processing()?;

        let outcome = match result {
            Ok(reply) => {
                let reply = if self.config.hide_thinking {
                    strip_thinking(&reply)
                } else {
                    reply
                };
                self.render_message(Role::Ai, &reply)?;
                self.conversation_state.add_assistant_message(&reply);
                TurnOutcome::Replied
            }
            Err(e) if e.is_unreachable() => {
                warn!("Model server unreachable: {}", e);
                writeln!(self.output, "{}", cformat!("<red>{}</>", e))?;
                TurnOutcome::ServerUnreachable
            }
            Err(e) => return Err(e.into()),
        };

        self.last_turn = Some(outcome);
        Ok(outcome)
    }

    fn show_processing(&mut self) -> Result<()> {
        if self.interactive {
            write!(self.output, "{}", cformat!("<dim>Processing...</>"))?;
            self.output.flush()?;
        }
        Ok(())
    }

    fn clear_processing(&mut self) -> Result<()> {
        if self.interactive {
            queue!(
                self.output,
                cursor::MoveToColumn(0),
                terminal::Clear(terminal::ClearType::CurrentLine)
            )?;
            self.output.flush()?;
        }
        Ok(())
    }

    pub fn conversation_state(&self) -> &ConversationState {
        &self.conversation_state
    }
}
