use anyhow::Result;
use log::debug;
use std::fmt::Write;

use crate::{
    chat::CompletionApi,
    config::{Config, Settings},
    deploy::Deployer,
    github::RepoSource,
    repos::RepoListView,
    runtime::Runtime,
};

use super::load_view;

#[derive(Debug, Clone, Default)]
pub struct ReposOptions {
    pub search: Option<String>,
    pub page: Option<usize>,
    /// Print every page instead of one.
    pub all: bool,
}

/// List the signed-in user's repositories
#[tracing::instrument(skip(runtime, settings))]
pub async fn repos<R: Runtime>(runtime: R, settings: Settings, options: ReposOptions) -> Result<()> {
    let config = Config::new(runtime, settings)?;
    let listing = run_repos(&config, &options).await?;
    print!("{}", listing);
    Ok(())
}

/// Loads the repositories and renders the requested page, or every page.
#[tracing::instrument(skip(config))]
pub async fn run_repos<R, S, D, C>(
    config: &Config<R, S, D, C>,
    options: &ReposOptions,
) -> Result<String>
where
    R: Runtime,
    S: RepoSource,
    D: Deployer,
    C: CompletionApi,
{
    let mut view = load_view(config).await?;
    if let Some(query) = &options.search {
        view.set_query(query);
    }

    if view.filtered().is_empty() {
        return Ok("No repositories found\n".to_string());
    }

    let mut listing = String::new();
    if options.all {
        for page in 1..=view.page_count() {
            view.set_page(page);
            listing.push_str(&format_page(&view));
        }
    } else {
        view.set_page(options.page.unwrap_or(1));
        listing.push_str(&format_page(&view));
    }
    Ok(listing)
}

/// One page of the list followed by the page indicator.
pub(crate) fn format_page(view: &RepoListView) -> String {
    let mut out = String::new();
    let page = view.current_page();
    debug!("Formatting {} repositories on page {}", page.len(), view.page());

    for repo in page {
        let _ = writeln!(
            out,
            "{} (#{})  ★ {}  {}  updated {}",
            repo.name,
            repo.id,
            repo.stargazers_count,
            repo.language.as_deref().unwrap_or("-"),
            repo.updated_at.format("%Y-%m-%d"),
        );
        let _ = writeln!(
            out,
            "    {}",
            repo.description.as_deref().unwrap_or("No description")
        );
        let _ = writeln!(out, "    {}", repo.html_url);
        let _ = writeln!(out, "    [{}]", view.action_for(repo.id));
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "Page {} of {} ({} repositories)",
        view.page(),
        view.page_count(),
        view.filtered().len()
    );
    out
}
