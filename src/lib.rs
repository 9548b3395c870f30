//! Palaver is a small command-line chat client for remote and local LLMs.
//!
//! The crate is organized around a few collaborating layers:
//! - [`core`] owns the conversation: the model catalog, provider adapters,
//!   the durable message store and the controller that ties them together.
//! - [`api`] defines the request/response payloads of each wire protocol.
//! - [`cli`] parses arguments and runs the interactive loop and one-shot
//!   commands.
//! - [`logging`] installs the `tracing` subscriber.
//! - [`utils`] holds URL and auth-header helpers.
//!
//! The binary (`src/main.rs`) routes straight through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod utils;
