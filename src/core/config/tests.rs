use super::data::{path_display, Config, CustomModel, DEFAULT_SYSTEM_PROMPT};
use super::io::ConfigError;
use crate::core::providers::ProviderKind;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
    assert_eq!(config.system_prompt(), DEFAULT_SYSTEM_PROMPT);
    assert_eq!(config.request_timeout(), None);
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config {
        default_model: Some("claude-3-haiku".to_string()),
        request_timeout_secs: Some(30),
        ..Default::default()
    };
    config.set_provider_base_url(ProviderKind::OpenRouter, "https://proxy.example/api/v1");
    config.models.push(CustomModel {
        id: "qwen-local".to_string(),
        provider: ProviderKind::Local,
        wire_model_name: "qwen2:7b".to_string(),
    });

    config
        .save_to_path(&config_path)
        .expect("Failed to save config");
    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(loaded, config);
    assert_eq!(loaded.request_timeout(), Some(Duration::from_secs(30)));
    assert_eq!(
        loaded.provider_base_url(ProviderKind::OpenRouter),
        Some("https://proxy.example/api/v1")
    );
    assert_eq!(loaded.provider_base_url(ProviderKind::OpenAi), None);
}

#[test]
fn parses_handwritten_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
default_model = "llama3-local"
system_prompt = "Answer tersely."
use_keyring = false

[providers.local]
base_url = "http://10.0.0.5:11434"

[[models]]
id = "gpt-4o-mini"
provider = "openai"
wire_model_name = "gpt-4o-mini"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).expect("config should parse");
    assert_eq!(config.default_model.as_deref(), Some("llama3-local"));
    assert_eq!(config.system_prompt(), "Answer tersely.");
    assert_eq!(config.use_keyring, Some(false));
    assert_eq!(
        config.provider_base_url(ProviderKind::Local),
        Some("http://10.0.0.5:11434")
    );
    assert_eq!(config.models[0].provider, ProviderKind::OpenAi);
}

#[test]
fn invalid_toml_reports_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "default_model = [").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn unknown_provider_in_custom_model_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[[models]]\nid = \"x\"\nprovider = \"gemini\"\nwire_model_name = \"x\"\n",
    )
    .unwrap();

    assert!(Config::load_from_path(&config_path).is_err());
}

#[test]
fn blank_system_prompt_falls_back_to_default() {
    let config = Config {
        system_prompt: Some("  ".to_string()),
        request_timeout_secs: Some(0),
        ..Default::default()
    };
    assert_eq!(config.system_prompt(), DEFAULT_SYSTEM_PROMPT);
    assert_eq!(config.request_timeout(), None);
}

#[test]
fn explicit_history_path_wins() {
    let config = Config {
        history_path: Some(PathBuf::from("/tmp/palaver-test/log.json")),
        ..Default::default()
    };
    assert_eq!(
        config.resolve_history_path().unwrap(),
        PathBuf::from("/tmp/palaver-test/log.json")
    );
}

#[test]
#[cfg(unix)]
fn path_display_abbreviates_home() {
    if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home).join(".config/palaver/config.toml");
        assert_eq!(path_display(&path), "~/.config/palaver/config.toml");
    }
}

#[test]
fn provider_override_replaces_any_casing() {
    let mut config: Config = toml::from_str(
        r#"
[providers.OpenRouter]
base_url = "https://old.example"
"#,
    )
    .expect("config should parse");

    config.set_provider_base_url(ProviderKind::OpenRouter, "https://new.example");
    assert_eq!(config.providers.len(), 1);
    assert_eq!(
        config.provider_base_url(ProviderKind::OpenRouter),
        Some("https://new.example")
    );

    assert!(config.clear_provider_base_url(ProviderKind::OpenRouter));
    assert!(!config.clear_provider_base_url(ProviderKind::OpenRouter));
    assert!(config.providers.is_empty());
}
