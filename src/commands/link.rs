use anyhow::{Result, bail};
use log::{debug, warn};

use crate::{
    config::Settings,
    deploy::deployment_link,
    notify::{ConsoleNotifier, Notification, Notifier},
    runtime::Runtime,
};

/// Print the public link of a deployed repository and copy it to the clipboard
#[tracing::instrument(skip(runtime, settings))]
pub fn link<R: Runtime>(runtime: R, settings: &Settings, repo_name: &str) -> Result<()> {
    let link = run_link(&runtime, settings, &ConsoleNotifier, repo_name)?;
    println!("{}", link);
    Ok(())
}

/// Returns the link. A clipboard failure is logged, never fatal.
pub fn run_link<R: Runtime, N: Notifier + ?Sized>(
    runtime: &R,
    settings: &Settings,
    notifier: &N,
    repo_name: &str,
) -> Result<String> {
    if repo_name.trim().is_empty() {
        bail!("Repository name must not be empty");
    }

    let link = deployment_link(repo_name, &settings.link_domain);
    match runtime.set_clipboard(&link) {
        Ok(true) => notifier.notify(&Notification::success(
            "Link copied",
            "The deployment link has been copied to your clipboard.",
        )),
        Ok(false) => debug!("Not a terminal, leaving the clipboard alone"),
        Err(e) => warn!("Failed to copy {} to the clipboard: {}", link, e),
    }
    Ok(link)
}
