//! Gradescope: courses, their assignments, and submitted files.
//!
//! Discovery walks `Homepage -> Course -> Assignment -> AssignmentDownload`.
//! Assignment pages are rendered by a React viewer that keeps polling after
//! load, so they use a fixed delay instead of the idle signal, and each one
//! visited raises the run's background-activity tolerance.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::{AdapterError, SiteAdapter, evaluate_as, path_segment};
use crate::browser::BrowserPage;
use crate::crawl::RunContext;
use crate::queue::SaveRequest;

const SLUG: &str = "gradescope";

/// Fixed settle time for assignment pages, in milliseconds.
pub const ASSIGNMENT_DELAY_MS: u64 = 5_000;

const COURSE_BOXES_SCRIPT: &str = r##"
Array.from(document.querySelectorAll("a.courseBox")).map((box) => {
    const shortName = box.querySelector(".courseBox--shortname");
    return {
        href: box.href,
        name: (shortName || box).innerText,
    };
})
"##;

const ASSIGNMENT_TABLE_SCRIPT: &str = r##"
(() => {
    const table = document.querySelector("#assignments-student-table");
    if (!table) {
        return null;
    }
    return Array.from(table.querySelectorAll("tbody tr")).map((row) => {
        const link = row.querySelector("a");
        return link ? { href: link.href, name: link.innerText } : null;
    });
})()
"##;

const SUBMISSION_VIEWER_SCRIPT: &str = r##"
(() => {
    const viewer = document.querySelector("div[data-react-class=AssignmentSubmissionViewer]");
    if (!viewer) {
        return null;
    }
    return viewer.getAttribute("data-react-props");
})()
"##;

/// What a Gradescope request points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradescopeMeta {
    /// The course list.
    Homepage,
    /// A course's assignment table.
    Course {
        /// Output directory of the course, with trailing `/`.
        course_dir: String,
    },
    /// A single submission page.
    Assignment {
        /// Output directory of the assignment, with trailing `/`.
        assignment_dir: String,
    },
    /// A submitted file; leaf.
    AssignmentDownload,
}

#[derive(Debug, Deserialize)]
struct LinkData {
    href: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SubmissionProps {
    paths: SubmissionPaths,
}

#[derive(Debug, Deserialize)]
struct SubmissionPaths {
    original_file_path: Option<String>,
    submission_zip_path: Option<String>,
}

/// Gradescope adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gradescope;

impl Gradescope {
    /// Creates the adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn course_request(link: &LinkData) -> Result<SaveRequest<GradescopeMeta>, AdapterError> {
        let course_id = link
            .href
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let course_dir = format!("{}-{course_id}/", path_segment(SLUG, &link.name)?);
        Ok(SaveRequest::archive(
            link.href.clone(),
            format!("{course_dir}Homepage"),
            GradescopeMeta::Course { course_dir },
        ))
    }

    async fn discover_assignments(
        page: &dyn BrowserPage,
        course_dir: &str,
        ctx: &RunContext,
    ) -> Result<Vec<SaveRequest<GradescopeMeta>>, AdapterError> {
        let rows: Option<Vec<Option<LinkData>>> =
            evaluate_as(page, SLUG, ASSIGNMENT_TABLE_SCRIPT).await?;
        let rows = rows.ok_or_else(|| {
            AdapterError::violated(SLUG, format!("no assignment table on {course_dir}"))
        })?;

        let mut requests = Vec::new();
        for (index, row) in rows.into_iter().enumerate() {
            let link = row.ok_or_else(|| {
                AdapterError::violated(
                    SLUG,
                    format!("assignment row {} of {course_dir} has no link", index + 1),
                )
            })?;
            let name = path_segment(SLUG, &link.name)?;
            let assignment_dir = format!("{course_dir}assignments/{name}/");
            let title = format!("{assignment_dir}main");
            if ctx.layout().is_archived(&title) {
                debug!(title = %title, "assignment already archived, skipping");
                continue;
            }
            requests.push(
                SaveRequest::archive(
                    link.href,
                    title,
                    GradescopeMeta::Assignment { assignment_dir },
                )
                .with_delay_wait(ASSIGNMENT_DELAY_MS),
            );
        }
        info!(course = course_dir, assignments = requests.len(), "discovered assignments");
        Ok(requests)
    }

    async fn discover_submission(
        page: &dyn BrowserPage,
        assignment_dir: &str,
    ) -> Result<SaveRequest<GradescopeMeta>, AdapterError> {
        let props: Option<String> = evaluate_as(page, SLUG, SUBMISSION_VIEWER_SCRIPT).await?;
        let props = props.ok_or_else(|| {
            AdapterError::violated(SLUG, format!("no submission viewer on {assignment_dir}"))
        })?;
        let props: SubmissionProps = serde_json::from_str(&props)
            .map_err(|source| AdapterError::Decode { adapter: SLUG, source })?;

        let (path, file_name) = match (props.paths.original_file_path, props.paths.submission_zip_path) {
            (Some(pdf), _) => (pdf, "file.pdf"),
            (None, Some(zip)) => (zip, "file.zip"),
            (None, None) => {
                return Err(AdapterError::violated(
                    SLUG,
                    format!("submission on {assignment_dir} has neither a PDF nor a zip"),
                ));
            }
        };

        let page_url = page.url().await?;
        let base = Url::parse(&page_url).map_err(|_| {
            AdapterError::violated(SLUG, format!("page URL {page_url:?} is not absolute"))
        })?;
        let file_url = base.join(&path).map_err(|_| {
            AdapterError::violated(SLUG, format!("submission path {path:?} is not a URL"))
        })?;

        Ok(SaveRequest::download(
            file_url.to_string(),
            format!("{assignment_dir}{file_name}"),
            GradescopeMeta::AssignmentDownload,
        ))
    }
}

#[async_trait]
impl SiteAdapter for Gradescope {
    type Meta = GradescopeMeta;

    fn slug(&self) -> &'static str {
        SLUG
    }

    fn initial_url(&self) -> &'static str {
        "https://gradescope.com"
    }

    async fn is_logged_in(&self, page: &dyn BrowserPage) -> Result<bool, AdapterError> {
        Ok(page.title().await?.contains("Your Courses"))
    }

    async fn build_initial_list(
        &self,
        page: &dyn BrowserPage,
        _ctx: &mut RunContext,
    ) -> Result<Vec<SaveRequest<GradescopeMeta>>, AdapterError> {
        let boxes: Vec<LinkData> = evaluate_as(page, SLUG, COURSE_BOXES_SCRIPT).await?;
        let mut list = Vec::with_capacity(boxes.len() + 1);
        list.push(SaveRequest::archive("", "Homepage", GradescopeMeta::Homepage));
        for link in &boxes {
            list.push(Self::course_request(link)?);
        }
        info!(courses = boxes.len(), "built gradescope seed list");
        Ok(list)
    }

    async fn discover_more_requests(
        &self,
        page: &dyn BrowserPage,
        item: &SaveRequest<GradescopeMeta>,
        ctx: &mut RunContext,
    ) -> Result<Vec<SaveRequest<GradescopeMeta>>, AdapterError> {
        match &item.meta {
            GradescopeMeta::Homepage => Ok(Vec::new()),
            GradescopeMeta::Course { course_dir } => {
                Self::discover_assignments(page, course_dir, ctx).await
            }
            GradescopeMeta::Assignment { assignment_dir } => {
                let download = Self::discover_submission(page, assignment_dir).await?;
                ctx.note_background_activity();
                Ok(vec![download])
            }
            GradescopeMeta::AssignmentDownload => Err(AdapterError::violated(
                SLUG,
                format!("download item '{}' reached discovery", item.title),
            )),
        }
    }
}
