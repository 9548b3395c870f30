//! Interactive line-oriented chat loop

use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::model_list::list_models;
use crate::core::controller::{ConversationController, TurnOutcome};
use crate::core::error::ChatError;
use crate::core::message::Message;

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Send(String),
    SwitchModel(String),
    ShowModel,
    ListModels,
    History,
    Clear,
    Quit,
    Unknown(String),
}

pub fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return ChatInput::Send(line.trim_end_matches(['\r', '\n']).to_string());
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));

    match name {
        "model" if rest.is_empty() => ChatInput::ShowModel,
        "model" => ChatInput::SwitchModel(rest.to_string()),
        "models" => ChatInput::ListModels,
        "history" => ChatInput::History,
        "clear" => ChatInput::Clear,
        "quit" | "exit" => ChatInput::Quit,
        _ => ChatInput::Unknown(name.to_string()),
    }
}

pub fn print_history<W: Write>(out: &mut W, messages: &[Message]) -> io::Result<()> {
    if messages.is_empty() {
        writeln!(out, "(no messages yet)")?;
        return Ok(());
    }
    for message in messages {
        let label = if message.is_user() { "You" } else { "Assistant" };
        writeln!(out, "{label}: {}", message.content)?;
    }
    Ok(())
}

/// Human-readable one-liner for a failed turn.
pub fn describe_error(err: &ChatError) -> String {
    match err {
        ChatError::MissingCredential { provider, env_var } => format!(
            "No API key for {provider}. Set {env_var} or run 'palaver auth {provider}'."
        ),
        ChatError::TurnInFlight => "Still waiting for the previous reply.".to_string(),
        other => other.to_string(),
    }
}

fn prompt(model: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "[{model}] > ")?;
    stdout.flush()
}

pub async fn run_chat(controller: &ConversationController) -> Result<(), Box<dyn Error>> {
    println!(
        "💬 Chatting with {} (type /quit to leave, /models for choices)",
        controller.selected_model()
    );
    let history = controller.messages();
    if !history.is_empty() {
        println!("Resuming conversation with {} messages.", history.len());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(&controller.selected_model())?;
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_input(&line) {
            ChatInput::Send(text) => match controller.send_turn(&text).await {
                Ok(TurnOutcome::Replied(reply)) => println!("{}\n", reply.content),
                Ok(TurnOutcome::Ignored | TurnOutcome::Discarded) => {}
                Err(ChatError::Persistence(detail)) => {
                    eprintln!("⚠️  Reply not saved: {detail}");
                }
                Err(err) => eprintln!("❌ {}", describe_error(&err)),
            },
            ChatInput::SwitchModel(model) => match controller.switch_model(&model) {
                Ok(()) => println!("Switched to {model}"),
                Err(err) => eprintln!("❌ {}", describe_error(&err)),
            },
            ChatInput::ShowModel => println!("Current model: {}", controller.selected_model()),
            ChatInput::ListModels => {
                let mut stdout = io::stdout().lock();
                list_models(&mut stdout, controller.catalog(), &controller.selected_model())?;
            }
            ChatInput::History => {
                let mut stdout = io::stdout().lock();
                print_history(&mut stdout, &controller.messages())?;
            }
            ChatInput::Clear => match controller.clear_conversation() {
                Ok(()) => println!("Conversation cleared"),
                Err(err) => eprintln!("⚠️  Cleared in memory only: {}", describe_error(&err)),
            },
            ChatInput::Quit => break,
            ChatInput::Unknown(name) => eprintln!("Unknown command: /{name}"),
        }
    }

    Ok(())
}
