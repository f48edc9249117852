use std::path::PathBuf;

use rustyline::{Config, Editor, Result};

const HISTORY_FILE: &str = ".code_companion_history";

pub fn generate_prompt(custom_prompt: Option<&str>) -> String {
    custom_prompt.unwrap_or("> ").to_string()
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(false)
        .max_history_size(1000)
        .build();
    Editor::with_config(config)
}

/// Where typed lines are remembered between sessions.
pub fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(HISTORY_FILE))
}
