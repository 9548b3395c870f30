pub mod data;
pub mod io;

pub use data::{Config, CustomModel, ProviderOverride, DEFAULT_SYSTEM_PROMPT};
pub use io::ConfigError;

#[cfg(test)]
mod tests;
