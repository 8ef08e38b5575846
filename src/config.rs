use crate::model::{Environment, UserRole};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `api.base_url`
pub const ENV_API_URL: &str = "RELEASEDECK_API_URL";
/// Environment variable overriding `session.actor_id`
pub const ENV_ACTOR: &str = "RELEASEDECK_ACTOR";

/// Global configuration for the client
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// REST API connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Identity used for promote and rollback
    #[serde(default)]
    pub session: SessionConfig,

    /// Known environment stages and roles
    #[serde(default)]
    pub catalog: Catalog,

    /// Dashboard server settings
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL every resource path is appended to (default: http://localhost:8080/api)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds. Unset means requests never time out.
    pub timeout_secs: Option<u64>,
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionConfig {
    /// User id attributed to promotions and rollbacks.
    /// When unset the user is asked on every promote/rollback.
    pub actor_id: Option<i64>,
}

/// Ordered environment stages and the roles offered when creating users
///
/// The first stage is where new releases start, the last one is production.
#[derive(Debug, Deserialize, Clone)]
pub struct Catalog {
    #[serde(default = "default_environments")]
    pub environments: Vec<Environment>,

    #[serde(default = "default_roles")]
    pub roles: Vec<UserRole>,
}

impl Catalog {
    /// Earliest stage; releases here cannot be rolled back
    pub fn first_stage(&self) -> Option<&Environment> {
        self.environments.first()
    }

    /// Final stage; releases here cannot be promoted
    pub fn last_stage(&self) -> Option<&Environment> {
        self.environments.last()
    }

    pub fn is_known_stage(&self, env: &Environment) -> bool {
        self.environments.contains(env)
    }

    pub fn can_promote(&self, env: &Environment) -> bool {
        self.last_stage() != Some(env)
    }

    pub fn can_rollback(&self, env: &Environment) -> bool {
        self.first_stage() != Some(env)
    }

    fn validate(&self, errors: &mut Vec<String>) {
        if self.environments.is_empty() {
            errors.push("catalog.environments must not be empty".to_string());
        }
        for (i, env) in self.environments.iter().enumerate() {
            if env.as_str().trim().is_empty() {
                errors.push(format!("catalog.environments[{}] is blank", i));
            } else if self.environments[..i].contains(env) {
                errors.push(format!("catalog.environments lists '{}' twice", env));
            }
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            environments: default_environments(),
            roles: default_roles(),
        }
    }
}

fn default_environments() -> Vec<Environment> {
    ["DEV", "QA", "UAT", "PROD"]
        .into_iter()
        .map(Environment::from)
        .collect()
}

fn default_roles() -> Vec<UserRole> {
    ["ADMIN", "DEVELOPER", "QA"]
        .into_iter()
        .map(UserRole::from)
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind address of the dashboard server (default: 127.0.0.1:3030)
    #[serde(default = "default_bind_address")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:3030".to_string()
}

impl Config {
    /// Default location: ~/.releasedeck/config.toml
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".releasedeck").join("config.toml"))
    }

    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit path, else the default path if it exists, else defaults.
    /// Environment overrides are applied afterwards.
    pub fn resolve(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_ACTOR).ok(),
        )?;
        Ok(config)
    }

    pub fn apply_env_overrides(
        &mut self,
        api_url: Option<String>,
        actor: Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(url) = api_url.filter(|u| !u.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(actor) = actor.filter(|a| !a.is_empty()) {
            let id = actor.parse::<i64>().map_err(|_| {
                anyhow::anyhow!("{} must be a numeric user id, got '{}'", ENV_ACTOR, actor)
            })?;
            self.session.actor_id = Some(id);
        }
        self.validate()
    }

    /// Validate all configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut errors = Vec::new();

        let url = &self.api.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("api.base_url must be an http(s) URL, got '{}'", url));
        }
        if self.api.timeout_secs == Some(0) {
            errors.push("api.timeout_secs must be greater than 0".to_string());
        }
        self.catalog.validate(&mut errors);

        if !errors.is_empty() {
            anyhow::bail!("Configuration errors:\n  - {}", errors.join("\n  - "));
        }

        Ok(())
    }
}
