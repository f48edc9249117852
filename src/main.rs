mod cli;
mod config;
mod ollama_client;
mod serve;
#[cfg(test)]
mod test_utils;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;
use url::Url;

use crate::cli::chat::persona::Persona;
use crate::cli::chat::ChatContext;
use crate::config::{ChatConfig, DEFAULT_HOST, DEFAULT_MODEL, DEFAULT_PORT, DEFAULT_TEMPERATURE};
use crate::ollama_client::OllamaClient;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    model: ModelArgs,

    /// Input to send to the chat
    #[arg(short, long)]
    input: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct ModelArgs {
    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_HOST", default_value = DEFAULT_HOST, global = true)]
    host: String,

    /// Model to chat with
    #[arg(short, long, env = "OLLAMA_MODEL", default_value = DEFAULT_MODEL, global = true)]
    model: String,

    /// Sampling temperature between 0.0 and 1.0
    #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE, global = true)]
    temperature: f32,

    /// Greeting, headings and system prompt to use
    #[arg(short, long, value_enum, default_value_t = Persona::Companion, global = true)]
    persona: Persona,

    /// Drop <think>...</think> reasoning from replies
    #[arg(long, global = true)]
    hide_thinking: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat {
        /// Input to send to the chat
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Serve the chat session over HTTP
    Serve {
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

impl ModelArgs {
    fn to_config(&self) -> Result<ChatConfig> {
        let config = ChatConfig::new(&self.host, &self.model, self.temperature, self.persona)?
            .with_hide_thinking(self.hide_thinking);
        Ok(config)
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn client_for(host: &Url) -> Result<Arc<OllamaClient>> {
    Ok(Arc::new(OllamaClient::new(host.clone())?))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = match cli.model.to_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    debug!("Using model {} at {}", config.model, config.host);

    let backend = client_for(&config.host)?;

    match cli.command {
        Some(Commands::Serve { port }) => {
            serve::serve(config, backend, port).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Chat { input }) => {
            let mut chat_context =
                ChatContext::new(Box::new(io::stdout()), input, true, config, backend);
            chat_context.run().await
        }
        None => {
            // Default to chat if no subcommand is provided
            let mut chat_context =
                ChatContext::new(Box::new(io::stdout()), cli.input, true, config, backend);
            chat_context.run().await
        }
    }
}
