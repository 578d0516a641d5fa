//! WebSIS student records: a fixed set of pages, no discovery.

use async_trait::async_trait;

use super::{AdapterError, SiteAdapter};
use crate::browser::BrowserPage;
use crate::crawl::RunContext;
use crate::queue::SaveRequest;

const PAGES: &[(&str, &str)] = &[
    ("https://student.mit.edu/", "Homepage"),
    ("https://student.mit.edu/cgi-docs/student.html", "Student Homepage"),
    ("https://student.mit.edu/cgi-docs/shrwstop.html", "Academic Record"),
    ("https://student.mit.edu/cgi-bin/shrwssor.sh", "Status of Registration"),
    ("https://student.mit.edu/cgi-bin/shrwsgrd.sh", "Grade Report"),
    ("https://student.mit.edu/cgi-bin/shrwsdau.sh", "Undergraduate Degree Audit"),
    (
        "https://student.mit.edu/cgi-docs/sfprwups.html",
        "Biographic and Emergency Records",
    ),
    ("https://student.mit.edu/cgi-bin/sppwsadr.sh", "Addresses and Phone Numbers"),
    ("https://student.mit.edu/cgi-docs/sfprwemr.html", "Emergency Record"),
    ("https://student.mit.edu/cgi-bin/sfprwemg.sh", "Emergency Contacts"),
    ("https://student.mit.edu/cgi-bin/sppwsbio.sh", "Student Biographic Record"),
];

/// WebSIS adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSis;

#[async_trait]
impl SiteAdapter for WebSis {
    type Meta = ();

    fn slug(&self) -> &'static str {
        "websis"
    }

    fn initial_url(&self) -> &'static str {
        "https://student.mit.edu/cgi-bin/shrwssor.sh"
    }

    async fn is_logged_in(&self, page: &dyn BrowserPage) -> Result<bool, AdapterError> {
        Ok(page.title().await?.contains("Status of Registration"))
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
