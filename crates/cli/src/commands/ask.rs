//! Ask command handler.
//!
//! Runs the answer pipeline once and streams the answer to stdout.

use clap::Args;
use docchat_core::{config::AppConfig, AppError, AppResult};
use docchat_knowledge::{RagOutcome, RagPipeline, WARMING_UP_MESSAGE};
use docchat_llm::ChatMessage;
use futures::StreamExt;
use std::io::Write;

/// Ask a question about the stored documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Print the retrieved passages before answering
    #[arg(long)]
    pub show_passages: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        config.validate(true)?;

        let question = self.question.join(" ");
        let pipeline = RagPipeline::from_config(config).await?;

        let messages = [ChatMessage::user(question.as_str())];

        let outcome = if self.show_passages {
            match pipeline.retrieve(&question).await? {
                Some(passages) => {
                    for passage in &passages {
                        eprintln!("[{:.3}] {}", passage.similarity, passage.content);
                    }
                    eprintln!();
                    pipeline.answer_with_passages(&messages, &passages).await?
                }
                None => RagOutcome::WarmingUp,
            }
        } else {
            pipeline.answer(&messages).await?
        };

        match outcome {
            RagOutcome::WarmingUp => {
                eprintln!("{}", WARMING_UP_MESSAGE);
                Err(AppError::EmbeddingUnavailable {
                    attempts: config.embedding.max_attempts,
                })
            }
            RagOutcome::NotFound(text) => {
                println!("{}", text);
                Ok(())
            }
            RagOutcome::Answer(mut fragments) => {
                let mut stdout = std::io::stdout();
                while let Some(fragment) = fragments.next().await {
                    let fragment = fragment?;
                    stdout.write_all(fragment.as_bytes())?;
                    stdout.flush()?;
                }
                writeln!(stdout)?;
                Ok(())
            }
        }
    }
}
