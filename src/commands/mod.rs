use anyhow::{Result, bail};
use log::debug;

use crate::{
    chat::CompletionApi,
    config::{Config, Settings},
    deploy::Deployer,
    github::RepoSource,
    repos::{LoadState, NO_ACCOUNT_MESSAGE, RepoListView},
    runtime::Runtime,
    session::{Session, session_path},
};

mod chat;
mod deploy;
mod link;
mod repos;
mod session;

pub use chat::{chat, run_chat};
pub use deploy::{deploy, run_deploy, run_status, status};
pub use link::{link, run_link};
pub use repos::{ReposOptions, repos, run_repos};
pub use session::{login, logout, whoami};

/// Reads the session record, if one was written by `login`.
pub(crate) fn load_session<R: Runtime>(runtime: &R, settings: &Settings) -> Result<Option<Session>> {
    let path = session_path(runtime, settings.config_dir.as_deref())?;
    Session::load(runtime, &path)
}

/// Loads the signed-in user's repositories into a fresh list view. Fails when
/// no GitHub account is linked or the fetch fails.
pub(crate) async fn load_view<R, S, D, C>(config: &Config<R, S, D, C>) -> Result<RepoListView>
where
    R: Runtime,
    S: RepoSource,
    D: Deployer,
    C: CompletionApi,
{
    let session = load_session(&config.runtime, &config.settings)?;
    let mut view = RepoListView::new(config.settings.page_size);
    view.load(&config.github, session.as_ref()).await;

    match view.state() {
        LoadState::NoAccount => bail!(NO_ACCOUNT_MESSAGE),
        LoadState::Failed(message) => bail!("Failed to load repositories: {}", message),
        state => debug!("Repository list is {:?}", state),
    }
    Ok(view)
}
