//! Command-line interface parsing and handling
//!
//! This module parses command-line arguments and dispatches to the chat
//! loop or one of the one-shot commands.

pub mod auth;
pub mod chat;
pub mod model_list;
pub mod say;
pub mod settings;


use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::cli::auth::{run_auth, run_deauth};
use crate::cli::chat::run_chat;
use crate::cli::model_list::list_models;
use crate::cli::say::run_say;
use crate::cli::settings::{run_set, run_unset};
use crate::core::adapters::HttpAdapterSource;
use crate::core::catalog::ModelCatalog;
use crate::core::config::Config;
use crate::core::controller::ConversationController;
use crate::core::store::FileMessageStore;

#[derive(Parser)]
#[command(name = "palaver")]
#[command(about = "A line-oriented chat client for OpenAI, Anthropic, OpenRouter and local models")]
#[command(
    long_about = "Palaver keeps a single running conversation with a large language model. \
The conversation is saved after every reply and survives restarts; switch models at any \
time without losing history.\n\n\
Authentication:\n\
  Keys are read from the environment first, then from the system keyring.\n\
  Use 'palaver auth <provider>' to store a key in the keyring.\n\n\
Configuration:\n\
  palaver set default-model <id>          Model used when -m is not given\n\
  palaver set base-url <provider> <url>   Point a provider at another endpoint\n\n\
Environment Variables:\n\
  OPENAI_API_KEY, ANTHROPIC_API_KEY, OPENROUTER_API_KEY     Provider API keys\n\
  OPENAI_BASE_URL, ANTHROPIC_BASE_URL, OPENROUTER_BASE_URL  Base URL overrides\n\
  PALAVER_LOCAL_BASE_URL    Local daemon URL (default http://127.0.0.1:11434)\n\
  PALAVER_LOG               Log filter, e.g. 'debug' (default 'warn')\n\n\
Chat commands:\n\
  /model <id>       Switch model for the next turn\n\
  /models           List available models\n\
  /history          Print the conversation so far\n\
  /clear            Start over with an empty conversation\n\
  /quit             Leave the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this session
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the interactive chat (default)
    Chat,
    /// Send one message, print the reply and exit
    Say {
        /// Message text; multiple words are joined with spaces
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Print the saved conversation
    History,
    /// Delete the saved conversation
    Clear,
    /// List available models
    Models,
    /// Store an API key for a provider in the system keyring
    Auth {
        /// Provider id (openai, anthropic, openrouter)
        provider: String,
    },
    /// Remove a provider's API key from the system keyring
    Deauth {
        /// Provider id (openai, anthropic, openrouter)
        provider: String,
    },
    /// Set a configuration value (default-model, system-prompt, base-url, request-timeout)
    Set {
        /// Configuration key to set
        key: String,
        /// Value for the key; base-url takes a provider id and a URL
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Remove a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
        /// Provider id, for base-url
        value: Option<String>,
    },
    /// Show version and build information
    Version,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    crate::logging::init();
    let args = Args::parse();
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let controller = open_conversation(args.model.as_deref())?;
            run_chat(&controller).await
        }
        Commands::Say { prompt } => {
            let controller = open_conversation(args.model.as_deref())?;
            run_say(&controller, &prompt.join(" ")).await
        }
        Commands::History => {
            let controller = open_conversation(args.model.as_deref())?;
            let mut stdout = std::io::stdout().lock();
            chat::print_history(&mut stdout, &controller.messages())?;
            Ok(())
        }
        Commands::Clear => {
            let controller = open_conversation(args.model.as_deref())?;
            controller.clear_conversation()?;
            println!("✅ Conversation cleared");
            Ok(())
        }
        Commands::Models => {
            let config = Config::load()?;
            let catalog = ModelCatalog::with_custom_models(&config.models);
            let selected = catalog.initial_selection(
                args.model.as_deref().or(config.default_model.as_deref()),
            );
            let mut stdout = std::io::stdout().lock();
            list_models(&mut stdout, &catalog, &selected)?;
            Ok(())
        }
        Commands::Auth { provider } => run_auth(&provider),
        Commands::Deauth { provider } => run_deauth(&provider),
        Commands::Set { key, value } => run_set(&key, &value),
        Commands::Unset { key, value } => run_unset(&key, value.as_deref()),
        Commands::Version => {
            println!("{}", version_info());
            Ok(())
        }
    }
}

/// Wire up the controller from the config file, the file-backed store and
/// real HTTP adapters.
///
/// An explicit `--model` must resolve; the configured default falls back to
/// the catalog default when it does not.
pub fn open_conversation(model: Option<&str>) -> Result<ConversationController, Box<dyn Error>> {
    let config = Config::load()?;
    let catalog = ModelCatalog::with_custom_models(&config.models);
    if let Some(model) = model {
        catalog.resolve(model)?;
    }

    let adapters = HttpAdapterSource::from_config(&config)?;
    let store = FileMessageStore::new(config.resolve_history_path()?);
    let preferred = model.or(config.default_model.as_deref());

    let controller =
        ConversationController::new(catalog, Arc::new(adapters), Arc::new(store), preferred);
    if let Some(err) = controller.load_error() {
        eprintln!("⚠️  Saved conversation could not be read; starting fresh ({err})");
    }
    Ok(controller)
}

pub fn version_info() -> String {
    format!(
        "palaver {} ({} {})\nbuilt {} for {} with rustc {}",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown"),
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
        option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown"),
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown"),
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown"),
    )
}
