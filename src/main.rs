use anyhow::Result;
use clap::Parser;
use hostit::chat::{ChatOptions, DEFAULT_CHAT_API_URL, DEFAULT_MODEL};
use hostit::commands::{self, ReposOptions};
use hostit::config::Settings;
use hostit::deploy::DEFAULT_LINK_DOMAIN;
use hostit::repos::DEFAULT_PAGE_SIZE;
use std::path::PathBuf;

/// hostit - deploy your GitHub repositories
///
/// Lists the repositories of the linked GitHub account, deploys them and
/// answers questions about the platform.
///
/// GITHUB_TOKEN, if set, authenticates repository listing.
/// OPENROUTER_API_KEY, if set, enables the assistant.
///
/// Examples:
///   hostit login --github octocat
///   hostit repos --search hello
///   hostit deploy Hello-World
///   hostit chat "How do custom domains work?"
#[derive(Parser, Debug)]
#[command(author, version = env!("HOSTIT_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the session file (also via HOSTIT_CONFIG_DIR)
    #[arg(long, env = "HOSTIT_CONFIG_DIR", value_name = "PATH", global = true)]
    config_dir: Option<PathBuf>,

    /// Directory holding the deployment record (also via HOSTIT_STATE_DIR)
    #[arg(long, env = "HOSTIT_STATE_DIR", value_name = "PATH", global = true)]
    state_dir: Option<PathBuf>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long, env = "HOSTIT_GITHUB_API_URL", value_name = "URL", global = true)]
    github_api_url: Option<String>,

    /// Deploy endpoint (defaults to http://localhost:3000/deploy)
    #[arg(long, env = "HOSTIT_DEPLOY_URL", value_name = "URL", global = true)]
    deploy_url: Option<String>,

    /// Host serving deployment previews (defaults to localhost:3001)
    #[arg(long, env = "HOSTIT_PREVIEW_HOST", value_name = "HOST", global = true)]
    preview_host: Option<String>,

    /// Domain of public deployment links
    #[arg(
        long,
        env = "HOSTIT_LINK_DOMAIN",
        value_name = "DOMAIN",
        default_value = DEFAULT_LINK_DOMAIN,
        global = true
    )]
    link_domain: String,

    /// Chat completion endpoint
    #[arg(
        long,
        env = "HOSTIT_CHAT_API_URL",
        value_name = "URL",
        default_value = DEFAULT_CHAT_API_URL,
        global = true
    )]
    chat_api_url: String,

    /// Model used by the assistant
    #[arg(
        long,
        env = "HOSTIT_CHAT_MODEL",
        value_name = "MODEL",
        default_value = DEFAULT_MODEL,
        global = true
    )]
    model: String,

    /// Repositories per page
    #[arg(
        long,
        env = "HOSTIT_PAGE_SIZE",
        value_name = "N",
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(usize),
        global = true
    )]
    page_size: usize,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Sign in and link a GitHub account
    Login(LoginArgs),

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List, search and page through your repositories
    Repos(ReposArgs),

    /// Deploy repositories by id or name
    Deploy(DeployArgs),

    /// Deploy the last recorded repository and show the result
    Status,

    /// Print the public link of a deployed repository
    Link(LinkArgs),

    /// Talk to the deployment assistant
    Chat(ChatArgs),
}

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// GitHub username to link
    #[arg(long = "github", value_name = "USERNAME")]
    pub github: String,

    /// Display name
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ReposArgs {
    /// Only show repositories whose name or description contains this text
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Page to show (1-based)
    #[arg(long, short = 'p', value_parser = clap::value_parser!(usize))]
    pub page: Option<usize>,

    /// Show every page
    #[arg(long, conflicts_with = "page")]
    pub all: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeployArgs {
    /// Repository ids or names
    #[arg(value_name = "ID|NAME", required = true)]
    pub repos: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct LinkArgs {
    /// Repository name
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct ChatArgs {
    /// Message to send; starts an interactive session when omitted
    #[arg(value_name = "MESSAGE")]
    pub message: Option<String>,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            github_api_url: self.github_api_url.clone(),
            deploy_url: self.deploy_url.clone(),
            preview_host: self.preview_host.clone(),
            link_domain: self.link_domain.clone(),
            chat: ChatOptions {
                api_url: self.chat_api_url.clone(),
                model: self.model.clone(),
                ..ChatOptions::default()
            },
            page_size: self.page_size,
            config_dir: self.config_dir.clone(),
            state_dir: self.state_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let settings = cli.settings();
    let runtime = hostit::runtime::RealRuntime;

    match cli.command {
        Commands::Login(args) => commands::login(runtime, &settings, &args.github, args.name)?,
        Commands::Logout => commands::logout(runtime, &settings)?,
        Commands::Whoami => commands::whoami(runtime, &settings)?,
        Commands::Repos(args) => {
            let options = ReposOptions {
                search: args.search,
                page: args.page,
                all: args.all,
            };
            commands::repos(runtime, settings, options).await?
        }
        Commands::Deploy(args) => commands::deploy(runtime, settings, &args.repos).await?,
        Commands::Status => commands::status(runtime, settings).await?,
        Commands::Link(args) => commands::link(runtime, &settings, &args.name)?,
        Commands::Chat(args) => commands::chat(runtime, settings, args.message).await?,
    }
    Ok(())
}
