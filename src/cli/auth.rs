//! Keyring management for provider API keys

use std::error::Error;
use std::io::{self, Write};

use crate::core::keyring::KeyringCredentials;
use crate::core::providers::ProviderKind;

pub fn parse_provider(id: &str) -> Result<ProviderKind, String> {
    ProviderKind::from_id(id.trim()).ok_or_else(|| {
        let known: Vec<&str> = ProviderKind::ALL.iter().map(|kind| kind.id()).collect();
        format!("Unknown provider '{id}'. Known providers: {}", known.join(", "))
    })
}

/// Resolve a provider id that actually takes an API key.
pub fn parse_keyed_provider(id: &str) -> Result<ProviderKind, String> {
    let provider = parse_provider(id)?;

    if !provider.requires_credential() {
        return Err(format!(
            "{} does not use an API key",
            provider.display_name()
        ));
    }
    Ok(provider)
}

pub fn run_auth(provider_id: &str) -> Result<(), Box<dyn Error>> {
    let provider = parse_keyed_provider(provider_id)?;

    print!("Enter API key for {}: ", provider.display_name());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let api_key = input.trim();
    if api_key.is_empty() {
        return Err("No API key entered".into());
    }

    KeyringCredentials.store(provider, api_key)?;
    println!("✅ Stored API key for {}", provider.display_name());
    Ok(())
}

pub fn run_deauth(provider_id: &str) -> Result<(), Box<dyn Error>> {
    let provider = parse_keyed_provider(provider_id)?;

    if KeyringCredentials.remove(provider)? {
        println!("✅ Removed API key for {}", provider.display_name());
    } else {
        println!("No stored API key for {}", provider.display_name());
    }
    Ok(())
}
