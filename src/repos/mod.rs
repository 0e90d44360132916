//! The repository panel: load, filter, paginate and track deployments.

mod page;

use log::{debug, warn};
use std::fmt;

use crate::deploy::{DeploymentStatus, StatusTable};
use crate::github::{RepoSource, Repository, sort_by_recency};
use crate::http::ApiError;
use crate::session::Session;

pub use page::{DEFAULT_PAGE_SIZE, filter_repos, page_count, page_slice};

pub const NO_ACCOUNT_MESSAGE: &str = "No GitHub account linked. Run `hostit login --github <username>` to connect one.";

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    /// Signed out, or no GitHub account linked.
    NoAccount,
    /// First load in flight.
    Loading,
    /// Reload in flight; the previous list is still shown.
    Refetching,
    Ready,
    Failed(String),
}

/// What the panel offers for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoAction {
    Deploy,
    Deploying,
    Retry,
    GetLink,
}

impl RepoAction {
    fn for_status(status: DeploymentStatus) -> Self {
        match status {
            DeploymentStatus::None => RepoAction::Deploy,
            DeploymentStatus::Pending => RepoAction::Deploying,
            DeploymentStatus::Error => RepoAction::Retry,
            DeploymentStatus::Success => RepoAction::GetLink,
        }
    }
}

impl fmt::Display for RepoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RepoAction::Deploy => "Deploy",
            RepoAction::Deploying => "Deploying...",
            RepoAction::Retry => "Retry",
            RepoAction::GetLink => "Get Link",
        };
        f.write_str(label)
    }
}

pub struct RepoListView {
    repos: Vec<Repository>,
    query: String,
    page: usize,
    page_size: usize,
    sort_by_recency: bool,
    state: LoadState,
    statuses: StatusTable,
}

impl Default for RepoListView {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl RepoListView {
    pub fn new(page_size: usize) -> Self {
        Self {
            repos: Vec::new(),
            query: String::new(),
            page: 1,
            page_size: page_size.max(1),
            sort_by_recency: false,
            state: LoadState::Idle,
            statuses: StatusTable::new(),
        }
    }

    /// Re-sort every loaded list newest first instead of keeping server order.
    pub fn sorted_by_recency(mut self) -> Self {
        self.sort_by_recency = true;
        self
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn repos(&self) -> &[Repository] {
        &self.repos
    }

    /// Moves into the in-flight state and returns the username to fetch, or
    /// `None` when there is nothing to load.
    pub fn begin_load(&mut self, session: Option<&Session>) -> Option<String> {
        let Some(username) = session.and_then(Session::github_username) else {
            debug!("No linked GitHub account, skipping load");
            self.state = LoadState::NoAccount;
            return None;
        };

        self.state = if self.repos.is_empty() && !matches!(self.state, LoadState::Ready) {
            LoadState::Loading
        } else {
            LoadState::Refetching
        };
        Some(username.to_string())
    }

    /// Applies a fetch result. On failure the previous list is kept.
    pub fn finish_load(&mut self, result: Result<Vec<Repository>, ApiError>) {
        match result {
            Ok(mut repos) => {
                if self.sort_by_recency {
                    sort_by_recency(&mut repos);
                }
                debug!("Loaded {} repositories", repos.len());
                self.repos = repos;
                self.state = LoadState::Ready;
                self.clamp_page();
            }
            Err(e) => {
                warn!("Failed to load repositories: {}", e);
                self.state = LoadState::Failed(e.to_string());
            }
        }
    }

    #[tracing::instrument(skip(self, source, session))]
    pub async fn load<S: RepoSource + ?Sized>(&mut self, source: &S, session: Option<&Session>) {
        let Some(username) = self.begin_load(session) else {
            return;
        };
        let result = source.list_repos(&username).await;
        self.finish_load(result);
    }

    pub async fn refresh<S: RepoSource + ?Sized>(&mut self, source: &S, session: Option<&Session>) {
        self.load(source, session).await
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.page = 1;
    }

    pub fn filtered(&self) -> Vec<&Repository> {
        filter_repos(&self.repos, &self.query)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        page_count(self.filtered().len(), self.page_size)
    }

    pub fn current_page(&self) -> Vec<&Repository> {
        let filtered = self.filtered();
        page_slice(&filtered, self.page, self.page_size).to_vec()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    pub fn next_page(&mut self) {
        if self.has_next() {
            self.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        if self.has_prev() {
            self.page -= 1;
        }
    }

    /// Jumps to `page`, clamped to the available pages.
    pub fn set_page(&mut self, page: usize) {
        self.page = page;
        self.clamp_page();
    }

    fn clamp_page(&mut self) {
        self.page = self.page.clamp(1, self.page_count().max(1));
    }

    /// Finds a loaded repository by numeric id or exact (case-insensitive) name.
    pub fn find(&self, key: &str) -> Option<&Repository> {
        if let Ok(id) = key.parse::<u64>()
            && let Some(repo) = self.repos.iter().find(|r| r.id == id)
        {
            return Some(repo);
        }
        self.repos.iter().find(|r| r.name.eq_ignore_ascii_case(key))
    }

    pub fn statuses(&self) -> &StatusTable {
        &self.statuses
    }

    pub fn statuses_mut(&mut self) -> &mut StatusTable {
        &mut self.statuses
    }

    pub fn action_for(&self, id: u64) -> RepoAction {
        RepoAction::for_status(self.statuses.get(id))
    }
}
