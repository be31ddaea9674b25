use axum::http::HeaderValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub probe: ProbeConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Origins allowed to make cross-origin requests. Empty disables CORS.
    pub frontend_origins: Vec<String>,
    pub service_name: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: String,
    pub github: GitHubConfig,
    /// Conflict retries per read-mutate-write
    pub max_retries: u32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum StorageBackend {
    GitHub,
    #[default]
    Local,
}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub branch: String,
    pub path_prefix: String,
    /// "owner/name"
    pub repo: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            frontend_origins: Vec::new(),
            service_name: "linkboard".to_string(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            branch: "main".to_string(),
            path_prefix: "data/".to_string(),
            repo: None,
            token: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            data_dir: "./data".to_string(),
            github: GitHubConfig::default(),
            max_retries: 1,
            timeout_seconds: 10,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_seconds: 5 }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        if let Ok(port) = std::env::var("PORT") {
            let host = bind_address
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            bind_address = format!("{host}:{}", port.trim());
        }

        let frontend_origins: Vec<String> = std::env::var("FRONTEND_ORIGINS")
            .map(|o| {
                o.split(',')
                    .map(|s| s.trim().trim_end_matches('/').to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let service_name =
            std::env::var("SERVICE_NAME").unwrap_or_else(|_| "linkboard".to_string());

        let backend = std::env::var("STORAGE_BACKEND")
            .ok()
            .map(|s| match s.to_lowercase().as_str() {
                "github" | "git" | "remote" => StorageBackend::GitHub,
                _ => StorageBackend::Local,
            })
            .unwrap_or_default();

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let defaults = GitHubConfig::default();
        let github = GitHubConfig {
            api_url: std::env::var("GITHUB_API_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            branch: std::env::var("GITHUB_BRANCH").unwrap_or(defaults.branch),
            path_prefix: std::env::var("GITHUB_PATH_PREFIX").unwrap_or(defaults.path_prefix),
            repo: std::env::var("GITHUB_REPO").ok().filter(|s| !s.is_empty()),
            token: std::env::var("GITHUB_TOKEN").ok().filter(|s| !s.is_empty()),
        };

        let max_retries = parse_retries(std::env::var("STORE_MAX_RETRIES").ok().as_deref())?;
        let store_timeout = env_number("STORE_TIMEOUT_SECONDS").unwrap_or(10);
        let probe_timeout = env_number("PROBE_TIMEOUT_SECONDS").unwrap_or(5);

        let config = Config {
            server: ServerConfig {
                bind_address,
                frontend_origins,
                service_name,
            },
            storage: StorageConfig {
                backend,
                data_dir,
                github,
                max_retries,
                timeout_seconds: store_timeout,
            },
            probe: ProbeConfig {
                timeout_seconds: probe_timeout,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::GitHub {
            if self.storage.github.token.is_none() {
                return Err(ConfigError::ValidationError(
                    "GITHUB_TOKEN is required when STORAGE_BACKEND is 'github'".to_string(),
                ));
            }
            match self.storage.github.repo.as_deref() {
                Some(repo) if is_owner_slash_name(repo) => {}
                _ => {
                    return Err(ConfigError::ValidationError(
                        "GITHUB_REPO must be of the form 'owner/name'".to_string(),
                    ))
                }
            }
        }

        for origin in &self.server.frontend_origins {
            if HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "FRONTEND_ORIGINS contains an invalid origin: {origin}"
                )));
            }
        }

        if self.storage.timeout_seconds == 0 || self.probe.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_number(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// `STORE_MAX_RETRIES`, defaulting to 1 when unset
fn parse_retries(raw: Option<&str>) -> Result<u32, ConfigError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(1),
        Some(s) => s.parse().map_err(|_| {
            ConfigError::ValidationError(format!(
                "STORE_MAX_RETRIES must be an integer between 0 and {}, got '{s}'",
                u32::MAX
            ))
        }),
    }
}

fn is_owner_slash_name(repo: &str) -> bool {
    matches!(repo.split_once('/'), Some((owner, name))
        if !owner.is_empty() && !name.is_empty() && !name.contains('/'))
}
