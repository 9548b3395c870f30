//! `set` / `unset` for values in the config file

use std::error::Error;

use crate::cli::auth::parse_provider;
use crate::core::catalog::ModelCatalog;
use crate::core::config::Config;

pub const SETTING_KEYS: [&str; 4] = ["default-model", "system-prompt", "base-url", "request-timeout"];

fn unknown_key(key: &str) -> String {
    format!(
        "Unknown config key: {key}. Known keys: {}",
        SETTING_KEYS.join(", ")
    )
}

/// Apply `palaver set <key> <value…>` to `config`, returning a confirmation.
pub fn apply_set(config: &mut Config, key: &str, value: &[String]) -> Result<String, String> {
    let joined = value.join(" ");
    let joined = joined.trim();
    if joined.is_empty() {
        return Err(format!("Missing value for {key}"));
    }

    match key {
        "default-model" => {
            let catalog = ModelCatalog::with_custom_models(&config.models);
            let model = catalog
                .resolve(joined)
                .map_err(|err| err.to_string())?
                .id
                .clone();
            config.default_model = Some(model.clone());
            Ok(format!("Set default-model to: {model}"))
        }
        "system-prompt" => {
            config.system_prompt = Some(joined.to_string());
            Ok("Set system-prompt".to_string())
        }
        "base-url" => {
            let [provider, url] = value else {
                return Err("Usage: palaver set base-url <provider> <url>".to_string());
            };
            let provider = parse_provider(provider)?;
            config.set_provider_base_url(provider, url.trim());
            Ok(format!("Set base-url for {} to: {}", provider.id(), url.trim()))
        }
        "request-timeout" => {
            let secs = joined
                .parse::<u64>()
                .map_err(|_| format!("request-timeout expects whole seconds, got '{joined}'"))?;
            config.request_timeout_secs = Some(secs);
            Ok(format!("Set request-timeout to: {secs}s"))
        }
        _ => Err(unknown_key(key)),
    }
}

/// Apply `palaver unset <key> [provider]` to `config`.
pub fn apply_unset(config: &mut Config, key: &str, value: Option<&str>) -> Result<String, String> {
    match key {
        "default-model" => {
            config.default_model = None;
            Ok("Unset default-model".to_string())
        }
        "system-prompt" => {
            config.system_prompt = None;
            Ok("Unset system-prompt".to_string())
        }
        "base-url" => {
            let provider = value
                .ok_or_else(|| "Usage: palaver unset base-url <provider>".to_string())
                .and_then(parse_provider)?;
            if config.clear_provider_base_url(provider) {
                Ok(format!("Unset base-url for {}", provider.id()))
            } else {
                Ok(format!("No base-url override for {}", provider.id()))
            }
        }
        "request-timeout" => {
            config.request_timeout_secs = None;
            Ok("Unset request-timeout".to_string())
        }
        _ => Err(unknown_key(key)),
    }
}

pub fn run_set(key: &str, value: &[String]) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    let message = apply_set(&mut config, key, value)?;
    config.save()?;
    println!("✅ {message}");
    Ok(())
}

pub fn run_unset(key: &str, value: Option<&str>) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    let message = apply_unset(&mut config, key, value)?;
    config.save()?;
    println!("✅ {message}");
    Ok(())
}
