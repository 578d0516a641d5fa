//! EECSIS department pages. The site has no reliable logged-in marker, so
//! the probe always passes and a missing session shows up in the captures.

use async_trait::async_trait;

use super::{AdapterError, SiteAdapter};
use crate::browser::BrowserPage;
use crate::crawl::RunContext;
use crate::queue::SaveRequest;

const PAGES: &[(&str, &str)] = &[
    ("https://eecsis.mit.edu/", "Homepage"),
    ("https://eecsis.mit.edu/whos_taken_what.html", "Who's Taken What"),
    ("https://eecsis.mit.edu/checklist.cgi", "Degree Checklist"),
    (
        "https://eecsis.mit.edu/academic-information.html",
        "Academic Information",
    ),
];

/// EECSIS adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eecsis;

#[async_trait]
impl SiteAdapter for Eecsis {
    type Meta = ();

    fn slug(&self) -> &'static str {
        "eecsis"
    }

    fn initial_url(&self) -> &'static str {
        "https://eecsis.mit.edu/"
    }

    async fn is_logged_in(&self, _page: &dyn BrowserPage) -> Result<bool, AdapterError> {
        Ok(true)
    }

    async fn build_initial_list(
        &self,
        _page: &dyn BrowserPage,
        _ctx: &mut RunContext,
    ) -> Result<Vec<SaveRequest<()>>, AdapterError> {
        Ok(PAGES
            .iter()
            .map(|(url, title)| SaveRequest::archive(*url, *title, ()))
            .collect())
    }

    async fn discover_more_requests(
        &self,
        _page: &dyn BrowserPage,
        _item: &SaveRequest<()>,
        _ctx: &mut RunContext,
    ) -> Result<Vec<SaveRequest<()>>, AdapterError> {
        Ok(Vec::new())
    }
}
