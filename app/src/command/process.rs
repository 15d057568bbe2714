use chrono::Utc;

use crate::pipeline::Pipeline;

/// Arguments for one debug `process` invocation: a single inbound message
/// run through the full pipeline, printed rather than delivered by an
/// ingest collaborator.
#[derive(Debug, Clone)]
pub struct ProcessInput {
    pub chat_id: String,
    pub sender: String,
    pub text: String,
    pub message_id: Option<String>,
    pub reply_to: Option<String>,
}

pub struct ProcessStrategy {
    pub pipeline: Pipeline,
}

impl super::CommandStrategy for ProcessStrategy {
    type Input = ProcessInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let message = termin_core::Message {
            message_id: input
                .message_id
                .unwrap_or_else(|| uuid::Uuid::now_v7().to_string()),
            chat_id: input.chat_id,
            sender: input.sender,
            text: input.text,
            timestamp: Utc::now(),
            reply_to: input.reply_to,
        };

        let outcome = self.pipeline.process_message(&message).await?;
        if outcome.gate_passed {
            println!(
                "processed message {} — {} appointment(s) written",
                message.message_id, outcome.appointments_extracted
            );
        } else {
            println!(
                "processed message {} — skipped (date gate did not pass)",
                message.message_id
            );
        }
        Ok(())
    }
}
