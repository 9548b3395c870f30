//! One-shot "say" command

use std::error::Error;

use crate::cli::chat::describe_error;
use crate::core::controller::{ConversationController, TurnOutcome};
use crate::core::error::ChatError;

pub async fn run_say(controller: &ConversationController, prompt: &str) -> Result<(), Box<dyn Error>> {
    if prompt.trim().is_empty() {
        eprintln!("Usage: palaver say <prompt>");
        std::process::exit(1);
    }

    match controller.send_turn(prompt).await {
        Ok(TurnOutcome::Replied(reply)) => {
            println!("{}", reply.content);
            Ok(())
        }
        Ok(_) => Ok(()),
        Err(ChatError::Persistence(detail)) => {
            if let Some(reply) = controller.messages().last() {
                println!("{}", reply.content);
            }
            eprintln!("⚠️  Reply not saved: {detail}");
            Ok(())
        }
        Err(err) => {
            eprintln!("❌ {}", describe_error(&err));
            std::process::exit(1);
        }
    }
}
