//! Canvas LMS: the dashboard plus the homepage of every past enrollment.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{AdapterError, SiteAdapter, evaluate_as, path_segment, wait_for_enter};
use crate::browser::BrowserPage;
use crate::crawl::RunContext;
use crate::queue::SaveRequest;

const SLUG: &str = "canvas";

/// Term column text to the short code used in course directory names.
const TERM_SHORT_NAMES: &[(&str, &str)] = &[
    ("Default Term", ""),
    ("Spring Term (AY 2019-2020)", "2019SP"),
    ("Fall Term (AY 2020-2021)", "2020FA"),
    ("Spring Term (AY 2020-2021)", "2020SP"),
    ("Fall Term (AY 2021-2022)", "2021FA"),
    ("Spring Term (AY 2021-2022)", "2021SP"),
    ("Fall Term (AY 2022-2023)", "2022FA"),
    ("Spring Term (AY 2022-2023)", "2022SP"),
    ("Fall Term (AY 2023-2024)", "2023FA"),
    ("Spring Term (AY 2023-2024)", "2023SP"),
];

const THIRD_PARTY_COOKIE_PROMPT: &str =
    "Please enable third-party cookies in Chrome, then press enter:";

const PAST_ENROLLMENTS_SCRIPT: &str = r##"
Array.from(document.querySelectorAll("#past_enrollments_table tbody a")).map((link) => {
    const span = link.querySelector("span");
    const row = link.parentElement && link.parentElement.parentElement;
    const term = row && row.querySelector(".course-list-term-column");
    return {
        href: link.href,
        name: span ? span.innerText : null,
        term: term ? term.innerText : null,
    };
})
"##;

/// What a Canvas request points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasMeta {
    /// The courses dashboard.
    Homepage,
    /// A course homepage.
    Course {
        /// Output directory of the course, with trailing `/`.
        course_dir: String,
    },
}

/// Returns the short code for a Canvas term name (empty when unknown).
#[must_use]
pub fn term_short_name(term: &str) -> &'static str {
    let term = term.trim();
    TERM_SHORT_NAMES
        .iter()
        .find(|(name, _)| *name == term)
        .map_or("", |(_, short)| short)
}

#[derive(Debug, Deserialize)]
struct EnrollmentLink {
    href: String,
    name: Option<String>,
    term: Option<String>,
}

/// Canvas adapter.
#[derive(Debug, Clone, Copy)]
pub struct Canvas {
    prompt: bool,
}

impl Canvas {
    /// Creates the adapter. With `prompt` set, seeding waits for the
    /// operator to enable third-party cookies.
    #[must_use]
    pub fn new(prompt: bool) -> Self {
        Self { prompt }
    }

    fn course_request(link: EnrollmentLink) -> Result<SaveRequest<CanvasMeta>, AdapterError> {
        let name = link.name.ok_or_else(|| {
            AdapterError::violated(SLUG, format!("course link {} has no name span", link.href))
        })?;
        let course_id = link
            .href
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let term = term_short_name(link.term.as_deref().unwrap_or_default());
        let course_dir = format!("{}-{term}-{course_id}/", path_segment(SLUG, &name)?);
        Ok(SaveRequest::archive(
            link.href.clone(),
            format!("{course_dir}Homepage"),
            CanvasMeta::Course { course_dir },
        ))
    }
}

#[async_trait]
impl SiteAdapter for Canvas {
    type Meta = CanvasMeta;

    fn slug(&self) -> &'static str {
        SLUG
    }

    fn initial_url(&self) -> &'static str {
        "https://canvas.mit.edu/courses"
    }

    async fn is_logged_in(&self, page: &dyn BrowserPage) -> Result<bool, AdapterError> {
        Ok(page.title().await?.contains("Courses"))
    }

    async fn build_initial_list(
        &self,
        page: &dyn BrowserPage,
        ctx: &mut RunContext,
    ) -> Result<Vec<SaveRequest<CanvasMeta>>, AdapterError> {
        if self.prompt {
            wait_for_enter(THIRD_PARTY_COOKIE_PROMPT).await?;
        }
        page.reload().await?;
        page.wait_for_network_idle(ctx.idle_options()).await?;

        let links: Vec<EnrollmentLink> = evaluate_as(page, SLUG, PAST_ENROLLMENTS_SCRIPT).await?;
        debug!(courses = links.len(), "found past enrollments");

        let mut list = Vec::with_capacity(links.len() + 1);
        list.push(SaveRequest::archive("", "Homepage", CanvasMeta::Homepage));
        for link in links {
            list.push(Self::course_request(link)?);
        }
        info!(items = list.len(), "built canvas seed list");
        Ok(list)
    }

    async fn discover_more_requests(
        &self,
        _page: &dyn BrowserPage,
        item: &SaveRequest<CanvasMeta>,
        _ctx: &mut RunContext,
    ) -> Result<Vec<SaveRequest<CanvasMeta>>, AdapterError> {
        match &item.meta {
            CanvasMeta::Homepage | CanvasMeta::Course { .. } => Ok(Vec::new()),
        }
    }
}
