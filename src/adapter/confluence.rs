//! Confluence wiki. Only the login probe exists so far; the seed list is empty.

use async_trait::async_trait;

use super::{AdapterError, SiteAdapter};
use crate::browser::BrowserPage;
use crate::crawl::RunContext;
use crate::queue::SaveRequest;

const USER_MENU_SELECTOR: &str = "#user-menu-link";

/// Confluence adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Confluence;

#[async_trait]
impl SiteAdapter for Confluence {
    type Meta = ();

    fn slug(&self) -> &'static str {
        "confluence"
    }

    fn initial_url(&self) -> &'static str {
        "https://wikis.mit.edu/"
    }

    async fn is_logged_in(&self, page: &dyn BrowserPage) -> Result<bool, AdapterError> {
        Ok(page.selector_exists(USER_MENU_SELECTOR).await?)
    }

    async fn build_initial_list(
        &self,
        _page: &dyn BrowserPage,
        _ctx: &mut RunContext,
    ) -> Result<Vec<SaveRequest<()>>, AdapterError> {
        Ok(Vec::new())
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
