use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::{Password, theme::ColorfulTheme};
use serde::{Deserialize, Serialize};

use crate::utils::trim_line;
use crate::{palette::Palette, utils::strip_controls_and_escapes};

pub const API_KEY_ENV: &str = "NEWSDRILL_OPENAI_API_KEY";

const OPENAI_PROVIDER: &str = "openai";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    Environment,
    AuthFile,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct AuthFile {
    #[serde(flatten)]
    providers: HashMap<String, ProviderAuth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProviderAuth {
    key: String,
}

impl ApiKeySource {
    pub fn description(&self) -> &'static str {
        match self {
            ApiKeySource::Environment => "environment variable",
            ApiKeySource::AuthFile => "local auth file",
        }
    }
}

#[derive(Debug)]
pub struct ApiKeyLookup {
    pub api_key: Option<String>,
    pub source: Option<ApiKeySource>,
}

pub fn clear_api_key(auth_path: &Path) -> Result<bool> {
    let Some(mut auth) = read_auth_file(auth_path)? else {
        return Ok(false);
    };

    if auth.providers.remove(OPENAI_PROVIDER).is_none() {
        return Ok(false);
    }

    if auth.providers.is_empty() {
        fs::remove_file(auth_path).with_context(|| {
            format!(
                "Failed to remove empty auth file at {}",
                auth_path.display()
            )
        })?;
        return Ok(true);
    }

    write_auth_file(auth_path, &auth)?;
    Ok(true)
}

pub fn prompt_for_api_key(prompt: &str) -> Result<String> {
    println!("\n{}", prompt);
    println!(
        "{} to enable exercise generation. It's stored locally for future use.",
        Palette::paint(Palette::SUCCESS, "Enter your OpenAI-compatible API key")
    );
    println!(
        "{}",
        Palette::dim("Leave the field blank to skip.")
    );
    let raw_password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API Key")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read API key")?;

    let password = strip_controls_and_escapes(&raw_password);
    Ok(password.trim().to_string())
}

pub fn store_api_key(auth_path: &Path, api_key: &str) -> Result<()> {
    let trimmed = trim_line(api_key).with_context(|| "Cannot store an empty API key")?;

    let mut auth = read_auth_file(auth_path)?.unwrap_or_default();

    auth.providers.insert(
        OPENAI_PROVIDER.to_string(),
        ProviderAuth {
            key: trimmed.to_string(),
        },
    );

    write_auth_file(auth_path, &auth)
}

pub fn get_api_key_from_sources(auth_path: &Path) -> Result<ApiKeyLookup> {
    // 1. Environment variable
    if let Ok(value) = env::var(API_KEY_ENV)
        && !value.trim().is_empty()
    {
        return Ok(ApiKeyLookup {
            api_key: Some(value.trim().to_string()),
            source: Some(ApiKeySource::Environment),
        });
    }

    // 2. Auth file
    let Some(auth) = read_auth_file(auth_path)? else {
        return Ok(ApiKeyLookup {
            api_key: None,
            source: None,
        });
    };

    let key = auth
        .providers
        .get(OPENAI_PROVIDER)
        .map(|entry| entry.key.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    Ok(ApiKeyLookup {
        source: key.as_ref().map(|_| ApiKeySource::AuthFile),
        api_key: key,
    })
}

fn read_auth_file(path: &Path) -> Result<Option<AuthFile>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(parse_auth_contents(&contents, path)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to read auth file at {}", path.display()))
        }
    }
}

fn write_auth_file(path: &Path, value: &AuthFile) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let contents = serialize_auth(value)?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write auth file at {}", path.display()))?;
    Ok(())
}

fn parse_auth_contents(contents: &str, path: &Path) -> Result<Option<AuthFile>> {
    if contents.trim().is_empty() {
        return Ok(Some(AuthFile::default()));
    }

    let parsed: AuthFile = serde_json::from_str(contents)
        .with_context(|| format!("Failed to parse auth file at {}", path.display()))?;
    Ok(Some(parsed))
}

fn serialize_auth(value: &AuthFile) -> Result<String> {
    let contents = serde_json::to_string_pretty(value)?;
    Ok(format!("{}\n", contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_auth_contents_handles_empty() {
        let path = Path::new("auth.json");
        let parsed = parse_auth_contents("   \n", path).unwrap();
        let auth = parsed.expect("expected auth file for empty contents");
        assert!(auth.providers.is_empty());
    }

    #[test]
    fn serialize_auth_adds_trailing_newline() {
        let mut auth = AuthFile::default();
        auth.providers.insert(
            OPENAI_PROVIDER.to_string(),
            ProviderAuth {
                key: "test-key".to_string(),
            },
        );

        let serialized = serialize_auth(&auth).unwrap();
        assert!(serialized.ends_with('\n'));
        let parsed: AuthFile = serde_json::from_str(serialized.trim()).unwrap();
        assert_eq!(
            parsed
                .providers
                .get(OPENAI_PROVIDER)
                .map(|entry| entry.key.as_str()),
            Some("test-key")
        );
    }

    #[test]
    fn file_doesnt_exist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auth.json");
        assert!(read_auth_file(&path).unwrap().is_none());
        assert!(!clear_api_key(&path).unwrap());
    }

    #[test]
    fn store_overwrites_and_clear_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("auth.json");

        store_api_key(&path, "fake_key").unwrap();
        store_api_key(&path, "  real_key \n").unwrap();

        let auth = read_auth_file(&path).unwrap().unwrap();
        assert_eq!(
            auth.providers.get(OPENAI_PROVIDER).map(|e| e.key.as_str()),
            Some("real_key")
        );

        assert!(clear_api_key(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn clear_keeps_other_providers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(
            &path,
            r#"{"openai": {"key": "a"}, "other": {"key": "b"}}"#,
        )
        .unwrap();

        assert!(clear_api_key(&path).unwrap());
        let auth = read_auth_file(&path).unwrap().unwrap();
        assert!(auth.providers.contains_key("other"));
        assert!(!auth.providers.contains_key(OPENAI_PROVIDER));
    }

    #[test]
    fn empty_key_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auth.json");
        assert!(store_api_key(&path, "   ").is_err());
        assert!(!path.exists());
    }
}
