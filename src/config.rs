use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            github: GithubConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else {
            let default_path = PathBuf::from("git-traffik.toml");
            if default_path.exists() {
                Self::from_file(&default_path)?
            } else {
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self =
            toml::from_str(&contents).with_context(|| "failed to parse configuration TOML")?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(owner) = env::var("GIT_TRAFFIK_OWNER") {
            self.github.owner = owner;
        }
        if let Ok(repo) = env::var("GIT_TRAFFIK_REPO") {
            self.github.repo = repo;
        }
        if let Ok(token) = env::var("GIT_TRAFFIK_TOKEN") {
            self.github.token = token;
        }
        if let Ok(base_url) = env::var("GIT_TRAFFIK_API_BASE_URL") {
            self.github.api_base_url = base_url;
        }
        if let Ok(dir) = env::var("GIT_TRAFFIK_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
    }

    /// Repository coordinates and the access token have no sensible defaults;
    /// refuse to run without them before any network call is made.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.github.owner.trim().is_empty() {
            missing.push("github.owner");
        }
        if self.github.repo.trim().is_empty() {
            missing.push("github.repo");
        }
        if self.github.token.trim().is_empty() {
            missing.push("github.token");
        }
        if !missing.is_empty() {
            bail!(
                "missing required configuration: {} (set them in the config file or via GIT_TRAFFIK_* environment variables)",
                missing.join(", ")
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            token: String::new(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
