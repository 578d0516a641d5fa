//! The per-item crawl loop.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, instrument};

use super::{CrawlError, RunContext};
use crate::adapter::SiteAdapter;
use crate::browser::BrowserPage;
use crate::capture::CaptureEngine;
use crate::download::{DirectDownloader, DownloadOutcome};
use crate::queue::{Frontier, SaveFormat, SaveRequest};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Archive items captured.
    pub archived: usize,
    /// Download items written.
    pub downloaded: usize,
    /// Download items skipped on a soft server error.
    pub skipped: usize,
    /// Items added by discovery.
    pub discovered: usize,
}

impl CrawlSummary {
    /// Total items processed.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.archived + self.downloaded + self.skipped
    }
}

/// Drives one tab through a site's frontier.
pub struct Crawler<'a, A: SiteAdapter> {
    adapter: &'a A,
    page: &'a dyn BrowserPage,
    downloader: &'a DirectDownloader,
    capture: CaptureEngine,
}

impl<'a, A: SiteAdapter> Crawler<'a, A> {
    /// Creates a crawler over `page`.
    pub fn new(adapter: &'a A, page: &'a dyn BrowserPage, downloader: &'a DirectDownloader) -> Self {
        Self {
            adapter,
            page,
            downloader,
            capture: CaptureEngine::default(),
        }
    }

    /// Processes `seed` and everything discovered from it.
    ///
    /// # Errors
    ///
    /// Returns the first [`CrawlError`]; nothing after the failing item runs.
    #[instrument(skip_all, fields(site = self.adapter.slug(), seed = seed.len()))]
    pub async fn run(
        &self,
        seed: Vec<SaveRequest<A::Meta>>,
        ctx: &mut RunContext,
    ) -> Result<CrawlSummary, CrawlError> {
        let mut frontier = Frontier::new(seed);
        let mut summary = CrawlSummary::default();

        while let Some(item) = frontier.advance().cloned() {
            info!(
                index = frontier.processed(),
                remaining = frontier.remaining(),
                title = %item.title,
                format = %item.format,
                "processing"
            );
            match item.format {
                SaveFormat::Download => match self.download(&item, ctx).await? {
                    DownloadOutcome::Saved { .. } => summary.downloaded += 1,
                    DownloadOutcome::Skipped { .. } => summary.skipped += 1,
                },
                SaveFormat::Archive => {
                    let discovered = self.archive(&item, ctx).await?;
                    summary.archived += 1;
                    summary.discovered += discovered.len();
                    frontier.splice_discovered(discovered);
                }
            }
        }

        info!(
            archived = summary.archived,
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            discovered = summary.discovered,
            "crawl complete"
        );
        Ok(summary)
    }

    async fn download(
        &self,
        item: &SaveRequest<A::Meta>,
        ctx: &RunContext,
    ) -> Result<DownloadOutcome, CrawlError> {
        let destination = item_destination(ctx, item)?;
        self.downloader
            .download(self.page, &item.url, &destination)
            .await
            .map_err(|source| CrawlError::Download {
                title: item.title.clone(),
                source,
            })
    }

    async fn archive(
        &self,
        item: &SaveRequest<A::Meta>,
        ctx: &mut RunContext,
    ) -> Result<Vec<SaveRequest<A::Meta>>, CrawlError> {
        let base = item_destination(ctx, item)?;
        let navigation = |source| CrawlError::Navigation {
            title: item.title.clone(),
            source,
        };

        if !item.uses_current_page() {
            self.page.goto(&item.url).await.map_err(navigation)?;
        }
        match item.use_delay_wait {
            Some(millis) => {
                debug!(millis, "settling with fixed delay");
                tokio::time::sleep(Duration::from_millis(millis)).await;
            }
            None => self
                .page
                .wait_for_network_idle(ctx.idle_options())
                .await
                .map_err(navigation)?,
        }

        self.adapter
            .pre_capture(self.page, item, ctx)
            .await
            .map_err(|source| CrawlError::Adapter {
                stage: "pre-capture",
                title: item.title.clone(),
                source,
            })?;

        self.capture
            .capture(self.page, &base)
            .await
            .map_err(|source| CrawlError::Capture {
                title: item.title.clone(),
                source,
            })?;

        self.adapter
            .discover_more_requests(self.page, item, ctx)
            .await
            .map_err(|source| CrawlError::Adapter {
                stage: "discovery",
                title: item.title.clone(),
                source,
            })
    }
}

fn item_destination<M>(ctx: &RunContext, item: &SaveRequest<M>) -> Result<PathBuf, CrawlError> {
    ctx.layout()
        .destination(&item.title)
        .map_err(|source| CrawlError::Layout {
            title: item.title.clone(),
            source,
        })
}
