//! One-shot question command

use crate::app::AskArgs;
use anyhow::{anyhow, Result};
use codequery_core::Config;

pub async fn run(args: AskArgs, config: &Config) -> Result<()> {
    let question = args.question.join(" ");
    if question.trim().is_empty() {
        return Err(anyhow!("no question provided"));
    }

    let mut session = super::open_session(config, args.max_iterations)?;

    match session.ask(&question).await {
        Ok(outcome) => {
            if outcome.analyzed_files.is_empty() {
                println!("{}", outcome.answer);
            } else {
                println!(
                    "Answer (analyzed {} files: {}):",
                    outcome.analyzed_files.len(),
                    outcome.analyzed_files.join(", ")
                );
                println!("{}", outcome.answer);
            }
            Ok(())
        }
        Err(aborted) => {
            if !aborted.analyzed_files.is_empty() {
                eprintln!(
                    "Files analyzed before the failure: {}",
                    aborted.analyzed_files.join(", ")
                );
            }
            Err(anyhow!("{}", aborted))
        }
    }
}
