//! Configuration system (layered: code > env > config file > defaults).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GenUiError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TODO_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Engine configuration.
///
/// Resolution order for every field:
/// 1. Values set in code after loading
/// 2. Environment variables (a `.env` file is honoured)
/// 3. `genui.toml` (explicit path or the platform config dir)
/// 4. Built-in defaults
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenUiConfig {
    pub api_key: Option<String>,
    pub gemini_base_url: Option<String>,
    /// Model driving the main conversation.
    pub model: String,
    /// Model generating render code; a separate, stateless context.
    pub render_model: String,
    pub temperature: f64,
    pub render_temperature: f64,
    pub include_thoughts: bool,
    pub todo_api_url: String,
    pub max_iterations: usize,
    pub system_instruction: Option<String>,
}

impl std::fmt::Debug for GenUiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenUiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("gemini_base_url", &self.gemini_base_url)
            .field("model", &self.model)
            .field("render_model", &self.render_model)
            .field("temperature", &self.temperature)
            .field("render_temperature", &self.render_temperature)
            .field("include_thoughts", &self.include_thoughts)
            .field("todo_api_url", &self.todo_api_url)
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

impl Default for GenUiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            gemini_base_url: None,
            model: DEFAULT_MODEL.to_string(),
            render_model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            render_temperature: 0.4,
            include_thoughts: true,
            todo_api_url: DEFAULT_TODO_API_URL.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            system_instruction: None,
        }
    }
}

/// Environment variables consulted by [`GenUiConfig::apply_env`].
pub const ENV_VARS: [&str; 10] = [
    "GEMINI_API_KEY",
    "GOOGLE_API_KEY",
    "GENUI_GEMINI_BASE_URL",
    "GENUI_MODEL",
    "GENUI_RENDER_MODEL",
    "GENUI_TEMPERATURE",
    "GENUI_RENDER_TEMPERATURE",
    "GENUI_INCLUDE_THOUGHTS",
    "GENUI_TODO_API_URL",
    "GENUI_MAX_ITERATIONS",
];

impl GenUiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every layer: default file, then the process environment.
    pub fn load() -> Result<Self, GenUiError> {
        Self::load_from(None)
    }

    /// Like [`load`](Self::load), reading `path` instead of the default file.
    /// An explicit path must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, GenUiError> {
        let _ = dotenvy::dotenv();
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        let config = base.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables only.
    pub fn from_env() -> Result<Self, GenUiError> {
        let _ = dotenvy::dotenv();
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Parse a TOML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, GenUiError> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| {
            GenUiError::Configuration(format!("invalid config file {}: {e}", path.display()))
        })
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, GenUiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(url) = get("GENUI_GEMINI_BASE_URL") {
            self.gemini_base_url = Some(url);
        }
        if let Some(model) = get("GENUI_MODEL") {
            self.model = model;
        }
        if let Some(model) = get("GENUI_RENDER_MODEL") {
            self.render_model = model;
        }
        if let Some(raw) = get("GENUI_TEMPERATURE") {
            self.temperature = parse_env("GENUI_TEMPERATURE", &raw)?;
        }
        if let Some(raw) = get("GENUI_RENDER_TEMPERATURE") {
            self.render_temperature = parse_env("GENUI_RENDER_TEMPERATURE", &raw)?;
        }
        if let Some(raw) = get("GENUI_INCLUDE_THOUGHTS") {
            self.include_thoughts = parse_env("GENUI_INCLUDE_THOUGHTS", &raw)?;
        }
        if let Some(url) = get("GENUI_TODO_API_URL") {
            self.todo_api_url = url;
        }
        if let Some(raw) = get("GENUI_MAX_ITERATIONS") {
            self.max_iterations = parse_env("GENUI_MAX_ITERATIONS", &raw)?;
        }
        Ok(self)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_render_model(mut self, model: impl Into<String>) -> Self {
        self.render_model = model.into();
        self
    }

    pub fn with_todo_api_url(mut self, url: impl Into<String>) -> Self {
        self.todo_api_url = url.into();
        self
    }

    pub fn with_gemini_base_url(mut self, url: impl Into<String>) -> Self {
        self.gemini_base_url = Some(url.into());
        self
    }

    pub fn validate(&self) -> Result<(), GenUiError> {
        for (name, value) in [
            ("temperature", self.temperature),
            ("render_temperature", self.render_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(GenUiError::Configuration(format!(
                    "{name} must be within 0.0..=2.0, got {value}"
                )));
            }
        }
        if self.max_iterations == 0 {
            return Err(GenUiError::Configuration(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.model.trim().is_empty() || self.render_model.trim().is_empty() {
            return Err(GenUiError::Configuration("model ids must not be empty".into()));
        }
        if !self.todo_api_url.starts_with("http://") && !self.todo_api_url.starts_with("https://") {
            return Err(GenUiError::Configuration(format!(
                "todo_api_url must be an http(s) URL, got '{}'",
                self.todo_api_url
            )));
        }
        Ok(())
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

/// `<config dir>/genui.toml` for the current platform, if one can be resolved.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "genui", "genui")
        .map(|dirs| dirs.config_dir().join("genui.toml"))
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, GenUiError> {
    raw.trim()
        .parse()
        .map_err(|_| GenUiError::Configuration(format!("{name} has an invalid value: '{raw}'")))
}
