use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use termin_core::MemoryBackend;
use tracing::{info, warn};

/// Arguments for the `bootstrap` command.
#[derive(Debug, Clone)]
pub struct BootstrapInput {
    pub file: PathBuf,
    pub chat_id: String,
}

pub struct BootstrapStrategy {
    pub memory: Arc<dyn MemoryBackend>,
}

impl super::CommandStrategy for BootstrapStrategy {
    type Input = BootstrapInput;

    /// Reads `file` line by line, treating each non-empty line as
    /// `"sender: text"` (falling back to the configured chat id as sender
    /// when no colon is present), and memorizes every line. There is no
    /// ordering guarantee to preserve beyond file order, so every line is
    /// stamped with the current time rather than a parsed one.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let content = std::fs::read_to_string(&input.file)?;
        let mut memorized = 0usize;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (sender, text) = match line.split_once(':') {
                Some((sender, text)) => (sender.trim(), text.trim()),
                None => ("unknown", line),
            };
            if text.is_empty() {
                warn!(line, "skipping line with no message text");
                continue;
            }
            self.memory
                .memorize(&input.chat_id, sender, text, Utc::now());
            memorized += 1;
        }

        info!(
            chat_id = %input.chat_id,
            file = %input.file.display(),
            memorized,
            "bootstrap complete"
        );
        println!("memorized {memorized} message(s) from {}", input.file.display());
        Ok(())
    }
}
