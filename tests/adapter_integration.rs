//! Integration tests for the site adapters against a scripted page.

mod support;

use archiver_core::adapter::{
    ASSIGNMENT_DELAY_MS, AdapterError, Canvas, CanvasMeta, Confluence, Eecsis, Gradescope,
    GradescopeMeta, SiteAdapter, WebSis,
};
use archiver_core::auth::{inject_seed_cookies, seed_cookie_path};
use archiver_core::browser::IdleOptions;
use archiver_core::crawl::RunContext;
use archiver_core::layout::OutputLayout;
use archiver_core::queue::{SaveFormat, SaveRequest};
use serde_json::json;
use support::FakePage;
use tempfile::TempDir;

fn context(root: &TempDir, slug: &str) -> RunContext {
    RunContext::new(OutputLayout::new(root.path(), slug), IdleOptions::default())
}

fn course_item() -> SaveRequest<GradescopeMeta> {
    SaveRequest::archive(
        "https://www.gradescope.com/courses/42",
        "CS 101-42/Homepage",
        GradescopeMeta::Course {
            course_dir: "CS 101-42/".to_string(),
        },
    )
}

fn assignment_item() -> SaveRequest<GradescopeMeta> {
    SaveRequest::archive(
        "https://www.gradescope.com/courses/42/assignments/7/submissions/9",
        "CS 101-42/assignments/HW 1/main",
        GradescopeMeta::Assignment {
            assignment_dir: "CS 101-42/assignments/HW 1/".to_string(),
        },
    )
}

#[tokio::test]
async fn test_gradescope_seed_lists_homepage_then_courses() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = context(&temp_dir, "gradescope");
    let page = FakePage::new().with_title("Your Courses | Gradescope");
    page.push_script_result(json!([
        {"href": "https://www.gradescope.com/courses/42", "name": "CS 101"},
        {"href": "https://www.gradescope.com/courses/77/", "name": "MATH/200"},
    ]));

    let adapter = Gradescope::new();
    assert!(adapter.is_logged_in(&page).await.expect("probe"));
    let seed = adapter
        .build_initial_list(&page, &mut ctx)
        .await
        .expect("seed should build");

    let titles: Vec<&str> = seed.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Homepage", "CS 101-42/Homepage", "MATH-200-77/Homepage"]
    );
    assert!(seed[0].uses_current_page());
    assert_eq!(seed[0].meta, GradescopeMeta::Homepage);
    assert_eq!(
        seed[2].meta,
        GradescopeMeta::Course {
            course_dir: "MATH-200-77/".to_string()
        }
    );
}

#[tokio::test]
async fn test_gradescope_course_discovery_skips_archived_assignments() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let archived = temp_dir
        .path()
        .join("gradescope/CS 101-42/assignments/HW 1");
    std::fs::create_dir_all(&archived).expect("create archived dir");
    std::fs::write(archived.join("main.pdf"), b"old").expect("write archived pdf");

    let mut ctx = context(&temp_dir, "gradescope");
    let page = FakePage::new();
    page.push_script_result(json!([
        {"href": "https://www.gradescope.com/courses/42/assignments/7", "name": "HW 1"},
        {"href": "https://www.gradescope.com/courses/42/assignments/8", "name": "HW 2/3"},
    ]));

    let found = Gradescope::new()
        .discover_more_requests(&page, &course_item(), &mut ctx)
        .await
        .expect("discovery should succeed");

    assert_eq!(found.len(), 1);
    let hw = &found[0];
    assert_eq!(hw.title, "CS 101-42/assignments/HW 2-3/main");
    assert_eq!(hw.url, "https://www.gradescope.com/courses/42/assignments/8");
    assert_eq!(hw.use_delay_wait, Some(ASSIGNMENT_DELAY_MS));
    assert_eq!(
        hw.meta,
        GradescopeMeta::Assignment {
            assignment_dir: "CS 101-42/assignments/HW 2-3/".to_string(),
        }
    );
}

#[tokio::test]
async fn test_gradescope_blank_assignment_names_do_not_share_a_path() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = context(&temp_dir, "gradescope");
    let page = FakePage::new();
    page.push_script_result(json!([
        {"href": "https://www.gradescope.com/courses/42/assignments/7", "name": "   "},
        {"href": "https://www.gradescope.com/courses/42/assignments/8", "name": ""},
    ]));

    let err = Gradescope::new()
        .discover_more_requests(&page, &course_item(), &mut ctx)
        .await
        .expect_err("blank names must not collapse onto one directory");

    assert!(
        matches!(err, AdapterError::AssumptionViolated { .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_gradescope_course_without_table_is_violation() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = context(&temp_dir, "gradescope");
    let page = FakePage::new();
    page.push_script_result(serde_json::Value::Null);

    let err = Gradescope::new()
        .discover_more_requests(&page, &course_item(), &mut ctx)
        .await
        .expect_err("missing table must fail");

    assert!(
        matches!(err, AdapterError::AssumptionViolated { .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_gradescope_row_without_link_is_violation() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = context(&temp_dir, "gradescope");
    let page = FakePage::new();
    page.push_script_result(json!([
        {"href": "https://www.gradescope.com/courses/42/assignments/7", "name": "HW 1"},
        null,
    ]));

    let err = Gradescope::new()
        .discover_more_requests(&page, &course_item(), &mut ctx)
        .await
        .expect_err("row without link must fail");

    assert!(err.to_string().contains("row 2"), "{err}");
}

#[tokio::test]
async fn test_gradescope_submission_prefers_original_pdf() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = context(&temp_dir, "gradescope");
    let page =
        FakePage::new().with_url("https://www.gradescope.com/courses/42/assignments/7/submissions/9");
    let props = json!({
        "paths": {
            "original_file_path": "/courses/42/assignments/7/submissions/9.pdf",
            "submission_zip_path": "/courses/42/assignments/7/submissions/9.zip",
        }
    });
    page.push_script_result(json!(props.to_string()));

    let found = Gradescope::new()
        .discover_more_requests(&page, &assignment_item(), &mut ctx)
        .await
        .expect("discovery should succeed");

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].format, SaveFormat::Download);
    assert_eq!(
        found[0].url,
        "https://www.gradescope.com/courses/42/assignments/7/submissions/9.pdf"
    );
    assert_eq!(found[0].title, "CS 101-42/assignments/HW 1/file.pdf");
    assert_eq!(found[0].meta, GradescopeMeta::AssignmentDownload);
    assert_eq!(ctx.background_activity(), 1);
}

#[tokio::test]
async fn test_gradescope_submission_falls_back_to_zip() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = context(&temp_dir, "gradescope");
    let page =
        FakePage::new().with_url("https://www.gradescope.com/courses/42/assignments/7/submissions/9");
    let props = json!({
        "paths": {
            "original_file_path": null,
            "submission_zip_path": "/courses/42/assignments/7/submissions/9.zip",
        }
    });
    page.push_script_result(json!(props.to_string()));

    let found = Gradescope::new()
        .discover_more_requests(&page, &assignment_item(), &mut ctx)
        .await
        .expect("discovery should succeed");

    assert_eq!(found[0].title, "CS 101-42/assignments/HW 1/file.zip");
    assert!(found[0].url.ends_with("/submissions/9.zip"));
}

#[tokio::test]
async fn test_gradescope_download_item_reaching_discovery_is_violation() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = context(&temp_dir, "gradescope");
    let page = FakePage::new();
    let item = SaveRequest::download(
        "https://www.gradescope.com/x.pdf",
        "x.pdf",
        GradescopeMeta::AssignmentDownload,
    );

    let err = Gradescope::new()
        .discover_more_requests(&page, &item, &mut ctx)
        .await
        .expect_err("leaf must not be discovered");

    assert!(matches!(err, AdapterError::AssumptionViolated { .. }));
}

#[tokio::test]
async fn test_canvas_seed_reloads_and_names_courses_by_term() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = context(&temp_dir, "canvas");
    let page = FakePage::new().with_title("Courses");
    page.push_script_result(json!([
        {
            "href": "https://canvas.mit.edu/courses/1234",
            "name": "6.006 Introduction to Algorithms",
            "term": "Fall Term (AY 2020-2021)",
        },
        {
            "href": "https://canvas.mit.edu/courses/99",
            "name": "Sandbox",
            "term": "Default Term",
        },
    ]));

    let adapter = Canvas::new(false);
    assert!(adapter.is_logged_in(&page).await.expect("probe"));
    let seed = adapter
        .build_initial_list(&page, &mut ctx)
        .await
        .expect("seed should build");

    assert_eq!(page.reloads(), 1);
    assert_eq!(page.idle_waits(), vec![0]);
    let titles: Vec<&str> = seed.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Homepage",
            "6.006 Introduction to Algorithms-2020FA-1234/Homepage",
            "Sandbox--99/Homepage",
        ]
    );
    assert_eq!(seed[0].meta, CanvasMeta::Homepage);
}

#[tokio::test]
async fn test_canvas_course_without_name_is_violation() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = context(&temp_dir, "canvas");
    let page = FakePage::new();
    page.push_script_result(json!([
        {"href": "https://canvas.mit.edu/courses/1", "name": null, "term": null},
    ]));

    let err = Canvas::new(false)
        .build_initial_list(&page, &mut ctx)
        .await
        .expect_err("missing name span must fail");

    assert!(matches!(err, AdapterError::AssumptionViolated { .. }));
}

#[tokio::test]
async fn test_static_sites_seed_fixed_pages() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let page = FakePage::new().with_title("Status of Registration");

    let mut ctx = context(&temp_dir, "websis");
    assert!(WebSis.is_logged_in(&page).await.expect("probe"));
    let websis = WebSis
        .build_initial_list(&page, &mut ctx)
        .await
        .expect("websis seed");
    assert_eq!(websis.len(), 11);
    assert_eq!(websis[0].title, "Homepage");

    let mut ctx = context(&temp_dir, "eecsis");
    let eecsis = Eecsis
        .build_initial_list(&page, &mut ctx)
        .await
        .expect("eecsis seed");
    assert_eq!(eecsis.len(), 4);
    assert!(eecsis.iter().all(|r| r.format == SaveFormat::Archive));
}

#[tokio::test]
async fn test_confluence_probe_uses_user_menu() {
    let page = FakePage::new();
    page.push_script_result(json!(true));
    page.push_script_result(json!(false));

    assert!(Confluence.is_logged_in(&page).await.expect("probe"));
    assert!(!Confluence.is_logged_in(&page).await.expect("probe"));
}

#[tokio::test]
async fn test_seed_cookie_file_is_injected_into_browser() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let path = seed_cookie_path(temp_dir.path(), "canvas");
    std::fs::write(
        &path,
        r#"[
            {"name": "_session", "value": "abc", "domain": ".mit.edu", "path": "/", "secure": true},
            {"name": "stale", "value": "x", "domain": ".mit.edu", "expires": 1}
        ]"#,
    )
    .expect("write seed file");

    let page = FakePage::new();
    let count = inject_seed_cookies(&page, &path)
        .await
        .expect("seed file should load");

    assert_eq!(count, 1);
    let jar = page.jar();
    assert_eq!(jar.len(), 1);
    assert_eq!(jar[0].name, "_session");
    assert_eq!(jar[0].value(), "abc");
    assert!(jar[0].secure);
}

#[tokio::test]
async fn test_missing_seed_cookie_file_is_not_an_error() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let page = FakePage::new();

    let count = inject_seed_cookies(&page, &seed_cookie_path(temp_dir.path(), "gradescope"))
        .await
        .expect("missing file is skipped");

    assert_eq!(count, 0);
    assert!(page.jar().is_empty());
}
