use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use crate::cli::chat::prompt_chain::ChatMessage;
use crate::ollama_client::{ChatBackend, ClientError, OllamaClient};

/// Backend that answers with canned replies and records every prompt chain.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<String>>,
    pub calls: Mutex<Vec<(String, f32, Vec<ChatMessage>)>>,
}

impl ScriptedBackend {
    pub fn with_replies(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> (String, f32, Vec<ChatMessage>) {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn chat(
        &self,
        model: &str,
        temperature: f32,
        messages: &[ChatMessage],
    ) -> Result<String, ClientError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), temperature, messages.to_vec()));
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "(no reply scripted)".to_string()))
    }

    async fn list_models(&self) -> Result<Vec<String>, ClientError> {
        Ok(vec!["deepseek-r1:1.5b".to_string(), "qwen2.5-coder:7b".to_string()])
    }
}

/// A real client pointed at a port nothing listens on.
pub fn unreachable_backend() -> Arc<OllamaClient> {
    Arc::new(OllamaClient::new(Url::parse("http://127.0.0.1:1").unwrap()).unwrap())
}

/// Cloneable in-memory writer so tests can read back what was printed.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
