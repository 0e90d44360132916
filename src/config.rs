use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{
    chat::{ChatOptions, CompletionApi, OpenRouterClient},
    deploy::{DEFAULT_LINK_DOMAIN, Deployer, HttpDeployer},
    github::{GitHub, RepoSource},
    http::{HttpClient, build_client},
    repos::DEFAULT_PAGE_SIZE,
    runtime::Runtime,
};

pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const CHAT_API_KEY_VAR: &str = "OPENROUTER_API_KEY";

/// Settings read once at startup (flags and environment) and handed to the
/// components that need them. Secrets are not part of it; they are read from
/// the environment by [`Config::new`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub github_api_url: Option<String>,
    pub deploy_url: Option<String>,
    pub preview_host: Option<String>,
    pub link_domain: String,
    pub chat: ChatOptions,
    pub page_size: usize,
    pub config_dir: Option<PathBuf>,
    pub state_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_api_url: None,
            deploy_url: None,
            preview_host: None,
            link_domain: DEFAULT_LINK_DOMAIN.to_string(),
            chat: ChatOptions::default(),
            page_size: DEFAULT_PAGE_SIZE,
            config_dir: None,
            state_dir: None,
        }
    }
}

/// Components wired for one command invocation.
pub struct Config<R: Runtime, S: RepoSource, D: Deployer, C: CompletionApi> {
    pub runtime: R,
    pub github: S,
    pub deployer: D,
    pub chat: C,
    pub settings: Settings,
}

impl<R: Runtime> Config<R, GitHub, HttpDeployer, OpenRouterClient> {
    pub fn new(runtime: R, settings: Settings) -> Result<Self> {
        let github_token = non_empty_var(&runtime, GITHUB_TOKEN_VAR);
        let chat_api_key = non_empty_var(&runtime, CHAT_API_KEY_VAR);
        if chat_api_key.is_none() {
            debug!("{} is not set; the assistant will be unavailable", CHAT_API_KEY_VAR);
        }

        // The GitHub token must never reach the deploy or chat endpoints.
        let github_client = build_client(github_token.as_deref())?;
        let plain_client = HttpClient::new(build_client(None)?);

        let github = GitHub::new(
            HttpClient::new(github_client),
            settings.github_api_url.clone(),
        );
        let deployer = HttpDeployer::new(
            plain_client.clone(),
            settings.deploy_url.clone(),
            settings.preview_host.clone(),
        );
        let chat = OpenRouterClient::new(plain_client, chat_api_key, settings.chat.clone());

        Ok(Self {
            runtime,
            github,
            deployer,
            chat,
            settings,
        })
    }
}

fn non_empty_var<R: Runtime>(runtime: &R, key: &str) -> Option<String> {
    runtime
        .env_var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
