//! Client-side filtering and pagination.

use crate::github::Repository;

pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Repositories whose name or description contains `query`, ignoring case.
/// A blank query keeps everything.
pub fn filter_repos<'a>(repos: &'a [Repository], query: &str) -> Vec<&'a Repository> {
    if query.trim().is_empty() {
        return repos.iter().collect();
    }
    let needle = query.to_lowercase();
    repos.iter().filter(|r| r.matches_lowercase(&needle)).collect()
}

/// `ceil(len / page_size)`; zero items means zero pages.
pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

/// Items on the 1-based `page`. Pages past the end are empty.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = (start + page_size).min(items.len());
    &items[start..end]
}
