//! Bulk remote to local synchronization.
//!
//! A paginated import walks `offset`/`limit` windows of a read URL. The total
//! is asked once from the matching `count` endpoint so that a set whose size
//! is a multiple of the page size does not cost an extra, empty fetch. When
//! the count is unavailable the walk stops at the first short page.

use reqwest::Url;

use crate::{
    management::EntityManager,
    remote::Operation,
    schema::{LIMIT, OFFSET},
};

/// Outcome of an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Page fetches issued.
    pub pages: usize,
    /// Records received from the remote store.
    pub fetched: usize,
    /// Records written to the cache.
    pub imported: usize,
    /// Records that failed to hydrate or to insert.
    pub failed: usize,
    /// A page request itself failed and the run stopped early.
    pub errored: bool,
}

impl ImportReport {
    pub fn absorb(&mut self, page: &ImportReport) {
        self.pages += page.pages;
        self.fetched += page.fetched;
        self.imported += page.imported;
        self.failed += page.failed;
        self.errored |= page.errored;
    }
}

/// `base` with its window replaced by `limit`/`offset`.
pub fn page_url(base: &Url, limit: usize, offset: usize) -> Url {
    let mut url = without_window(base);
    url.query_pairs_mut()
        .append_pair(LIMIT, &limit.to_string())
        .append_pair(OFFSET, &offset.to_string());
    url
}

/// The `count` endpoint matching a `read` URL, filter terms kept.
pub fn count_url(base: &Url) -> Option<Url> {
    let read = Operation::Read.as_str();
    if base.path_segments()?.next_back()? != read {
        return None;
    }

    let mut url = without_window(base);
    url.path_segments_mut()
        .ok()?
        .pop()
        .push(Operation::Count.as_str());
    Some(url)
}

fn without_window(base: &Url) -> Url {
    let terms: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(k, _)| k != LIMIT && k != OFFSET)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = base.clone();
    url.set_query(None);
    if !terms.is_empty() {
        url.query_pairs_mut().extend_pairs(terms);
    }
    url
}

pub async fn import_paginated<M>(manager: &M, base_url: &str, page_size: usize) -> ImportReport
where
    M: EntityManager + ?Sized,
{
    let mut report = ImportReport::default();
    let table = manager.schema().table;

    if page_size == 0 {
        manager.log_error("import_paginated", &"page size must be positive");
        return report;
    }
    let Some(base) = manager.guard("import_paginated", Url::parse(base_url)) else {
        return report;
    };

    let total = match count_url(&base) {
        Some(url) => manager.count_remote_at(url).await,
        None => None,
    };
    tracing::info!(table, page_size, total = ?total, "starting paginated import");

    let mut offset = 0;
    loop {
        if total.is_some_and(|total| offset >= total) {
            break;
        }

        let url = page_url(&base, page_size, offset);
        let page = manager.import_from_remote(url.as_str()).await;
        report.absorb(&page);

        if page.errored || page.fetched < page_size {
            break;
        }
        offset += page_size;
    }

    tracing::info!(
        table,
        pages = report.pages,
        imported = report.imported,
        failed = report.failed,
        "paginated import finished"
    );
    report
}
