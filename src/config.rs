//! Codemod configuration

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CodemodError, CodemodResult};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG: &str = "ormlift.toml";

/// Main codemod configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodemodConfig {
    /// Model name used when a call site's model cannot be inferred
    pub placeholder_model: String,

    /// Target client names
    pub client: ClientConfig,

    /// Source library names
    pub source: SourceConfig,

    /// Schema document boilerplate
    pub schema: SchemaConfig,

    /// Repository member name -> model name, consulted before naming
    /// conventions
    pub models: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Receiver member the rewritten calls go through (`this.prisma`)
    pub member: String,
    pub service: String,
    pub service_path: String,
    pub module: String,
    pub module_path: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Import sources treated as the repository library
    pub modules: Vec<String>,
    /// Identifier whose `forFeature`/`forRoot` calls register modules
    pub registrar: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    pub provider: String,
    pub url_env: String,
}

impl Default for CodemodConfig {
    fn default() -> Self {
        Self {
            placeholder_model: "model".to_string(),
            client: ClientConfig::default(),
            source: SourceConfig::default(),
            schema: SchemaConfig::default(),
            models: BTreeMap::new(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            member: "prisma".to_string(),
            service: "PrismaService".to_string(),
            service_path: "../prisma/prisma.service".to_string(),
            module: "PrismaModule".to_string(),
            module_path: "../prisma/prisma.module".to_string(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            modules: vec!["typeorm".to_string(), "@nestjs/typeorm".to_string()],
            registrar: "TypeOrmModule".to_string(),
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            provider: "postgresql".to_string(),
            url_env: "DATABASE_URL".to_string(),
        }
    }
}

impl CodemodConfig {
    /// Create a new configuration builder
    pub fn builder() -> CodemodConfigBuilder {
        CodemodConfigBuilder::default()
    }

    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> CodemodResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn from_file(path: &Path) -> CodemodResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Resolve the config to use: an explicit path, else `./ormlift.toml`,
    /// else the user config directory, else defaults.
    pub fn load(explicit: Option<&Path>) -> CodemodResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::discover() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using config file");
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.is_file() {
            return Some(local);
        }
        let user = dirs::config_dir()?.join("ormlift").join("config.toml");
        user.is_file().then_some(user)
    }

    fn validate(&self) -> CodemodResult<()> {
        let identifiers = [
            ("placeholder_model", &self.placeholder_model),
            ("client.member", &self.client.member),
            ("client.service", &self.client.service),
            ("client.module", &self.client.module),
            ("source.registrar", &self.source.registrar),
        ];
        for (key, value) in identifiers {
            let valid = value
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
                && value.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
            if !valid {
                return Err(CodemodError::Config(format!(
                    "{key} must be an identifier, got '{value}'"
                )));
            }
        }
        if self.source.modules.is_empty() {
            return Err(CodemodError::Config(
                "source.modules must name at least one import source".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether an import source belongs to the repository library.
    pub fn is_source_module(&self, source: &str) -> bool {
        self.source.modules.iter().any(|m| m == source)
    }
}

/// Builder for CodemodConfig
#[derive(Debug, Default)]
pub struct CodemodConfigBuilder {
    config: CodemodConfig,
}

impl CodemodConfigBuilder {
    /// Set the client member used as the call receiver
    pub fn client_member(mut self, member: impl Into<String>) -> Self {
        self.config.client.member = member.into();
        self
    }

    /// Set the client service type and its import path
    pub fn service(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.config.client.service = name.into();
        self.config.client.service_path = path.into();
        self
    }

    /// Set the client module and its import path
    pub fn module(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.config.client.module = name.into();
        self.config.client.module_path = path.into();
        self
    }

    /// Set the placeholder model name
    pub fn placeholder(mut self, model: impl Into<String>) -> Self {
        self.config.placeholder_model = model.into();
        self
    }

    /// Map a repository member name to a model
    pub fn model(mut self, member: impl Into<String>, model: impl Into<String>) -> Self {
        self.config.models.insert(member.into(), model.into());
        self
    }

    /// Set the datasource provider
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.config.schema.provider = provider.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> CodemodConfig {
        self.config
    }
}
