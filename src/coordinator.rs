use std::path::Path;
use std::sync::Arc;

use domestika_core::fs_paths::DEBUG_LOG_FILE;
use domestika_core::models::course::CourseListing;
use domestika_core::models::settings::Settings;

use crate::core::debug_log::DebugLog;
use crate::core::dependencies::require_downloader;
use crate::core::m3u8dl::M3u8Dl;
use crate::core::queue::{DownloadJob, DownloadQueue};
use crate::platforms::domestika::api::{resolve_final_project, DomestikaApi};
use crate::platforms::domestika::auth::{Credentials, SessionCookie};
use crate::platforms::domestika::browser::BrowserSession;
use crate::platforms::domestika::downloader::{FetchSettings, VideoFetcher};
use crate::platforms::domestika::enumerator::CourseEnumerator;
use crate::platforms::traits::{JsonApi, MediaTool, PageDriver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    pub label: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<DownloadFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub async fn run(settings: Settings) -> anyhow::Result<RunSummary> {
    let downloader = require_downloader(&settings.downloader)?;
    let credentials = Credentials::from_blob(&settings.auth.credentials)?;

    let api = DomestikaApi::new(&settings.api_base, &credentials)?;
    let tool: Arc<dyn MediaTool> = Arc::new(M3u8Dl::new(downloader));

    let cookie = SessionCookie::from_settings(&settings.auth);
    let browser = BrowserSession::launch(&settings.browser, &cookie).await?;

    let result = run_with(&settings, &browser, &api, tool).await;

    if let Err(e) = browser.close().await {
        tracing::warn!("[domestika] failed to close browser: {}", e);
    }

    let output = result?;
    debug_log_flush(&output, Path::new(DEBUG_LOG_FILE)).await;

    Ok(output.summary)
}

/// Summary of a run plus the debug log it filled, if debug was on.
struct RunOutput {
    summary: RunSummary,
    debug_log: Option<DebugLog>,
}

async fn debug_log_flush(output: &RunOutput, path: &Path) {
    if let Some(log) = &output.debug_log {
        if let Err(e) = log.write_to(path).await {
            tracing::error!("Failed to write {}: {}", path.display(), e);
        }
    }
}

async fn run_with(
    settings: &Settings,
    driver: &dyn PageDriver,
    api: &dyn JsonApi,
    tool: Arc<dyn MediaTool>,
) -> anyhow::Result<RunOutput> {
    let listing = collect_course(&settings.course_url, driver, api).await?;

    let total = listing.total_videos();
    tracing::info!("{} videos to download", total);

    let debug_log = settings.debug.then(DebugLog::new);
    let fetcher = Arc::new(VideoFetcher::new(
        tool,
        FetchSettings::from_settings(settings),
        debug_log.clone(),
    ));

    let jobs = build_jobs(&listing);
    let queue = DownloadQueue::new(settings.download.max_concurrent);
    tracing::debug!("[queue] {} jobs, {} at a time", jobs.len(), queue.max_concurrent());

    let course_title: Arc<str> = Arc::from(listing.title.as_str());
    let outcomes = queue
        .run_all(jobs, move |job: DownloadJob| {
            let fetcher = Arc::clone(&fetcher);
            let course_title = Arc::clone(&course_title);
            async move {
                tracing::info!("Download {}/{} started", job.seq + 1, total);
                fetcher
                    .download(&job.video, &course_title, &job.unit_title, job.index)
                    .await
            }
        })
        .await;

    let mut summary = RunSummary {
        total,
        ..RunSummary::default()
    };
    for outcome in outcomes {
        match outcome.result {
            Ok(()) => summary.succeeded += 1,
            Err(e) => {
                tracing::error!("Download failed: {}: {:#}", outcome.label, e);
                summary.failures.push(DownloadFailure {
                    label: outcome.label,
                    error: format!("{:#}", e),
                });
            }
        }
    }

    if summary.is_success() {
        tracing::info!("All videos downloaded");
    } else {
        tracing::warn!("{} of {} downloads failed", summary.failures.len(), total);
    }

    Ok(RunOutput { summary, debug_log })
}

/// Enumerates the course and appends the final project when it resolves.
async fn collect_course(
    course_url: &str,
    driver: &dyn PageDriver,
    api: &dyn JsonApi,
) -> anyhow::Result<CourseListing> {
    let mut listing = CourseEnumerator::new(driver).enumerate(course_url.trim()).await?;

    if let Some(course_id) = listing.final_project.clone() {
        if let Some(unit) = resolve_final_project(api, &course_id).await {
            listing.units.push(unit);
        }
    }

    Ok(listing)
}

/// One job per video, numbered in course order; `index` restarts in each unit.
fn build_jobs(listing: &CourseListing) -> Vec<DownloadJob> {
    listing
        .units
        .iter()
        .flat_map(|unit| {
            unit.videos.iter().enumerate().map(move |(index, video)| (unit, index, video))
        })
        .enumerate()
        .map(|(seq, (unit, index, video))| DownloadJob {
            seq,
            unit_title: unit.title.clone(),
            index,
            video: video.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependencies::DependencyError;
    use crate::platforms::domestika::api::tests::{project_body, video_body, FakeApi};
    use crate::platforms::domestika::auth::CredentialsError;
    use crate::platforms::domestika::downloader::tests::FakeTool;
    use crate::platforms::domestika::enumerator::tests::{scenario_a_driver, FakeDriver, COURSE_URL};
    use serde_json::json;

    const UNIT_URL: &str = "https://www.domestika.org/en/courses/abc123-lettering/units/1-intro";

    fn settings(root: &Path) -> Settings {
        let mut s = Settings::default();
        s.course_url = COURSE_URL.to_string();
        s.output_dir = root.to_path_buf();
        s
    }

    fn three_video_driver() -> FakeDriver {
        FakeDriver::default()
            .page(
                COURSE_URL,
                r#"<h1 class="course-header-new__title">Lettering</h1>
                   <h4 class="h2 unit-item__title"><a href="/en/courses/abc123-lettering/units/1-intro">Intro</a></h4>"#,
                None,
            )
            .page(
                UNIT_URL,
                r#"<h2 class="h3 course-header-new__subtitle">Basics</h2>"#,
                Some(json!({ "videos": [
                    { "video": { "playbackURL": "https://cdn/1.m3u8", "title": "One" } },
                    { "video": { "playbackURL": "https://cdn/2.m3u8", "title": "Two" } },
                    { "video": { "playbackURL": "https://cdn/3.m3u8", "title": "Three" } }
                ] })),
            )
    }

    fn save_name_of(args: &[String]) -> String {
        let pos = args.iter().position(|a| a == "--save-name").unwrap();
        args[pos + 1].clone()
    }

    #[tokio::test]
    async fn three_videos_give_six_paired_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool::default());

        let out = run_with(&settings(dir.path()), &three_video_driver(), &FakeApi::default(), tool.clone())
            .await
            .unwrap();

        assert_eq!(out.summary.total, 3);
        assert_eq!(out.summary.succeeded, 3);
        assert!(out.debug_log.is_none());

        let calls = tool.calls();
        assert_eq!(calls.len(), 6);

        let mut video_names: Vec<String> = calls.iter().filter(|a| a[0] == "-sv").map(|a| save_name_of(a)).collect();
        let mut sub_names: Vec<String> = calls
            .iter()
            .filter(|a| a[0] == "--auto-subtitle-fix")
            .map(|a| save_name_of(a))
            .collect();
        video_names.sort();
        sub_names.sort();
        assert_eq!(video_names, vec!["0_One", "1_Two", "2_Three"]);
        assert_eq!(video_names, sub_names);

        assert!(dir.path().join("Lettering").join("Basics").join("Intro").is_dir());
    }

    #[tokio::test]
    async fn final_project_is_appended_and_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool::default());
        let api = FakeApi::default()
            .with("courses/abc123/final-project?with_server_timing=true", project_body(json!("9")))
            .with("videos/9?with_server_timing=true", video_body("https://cdn/fp.m3u8"));

        let out = run_with(&settings(dir.path()), &scenario_a_driver(), &api, tool.clone())
            .await
            .unwrap();

        assert_eq!(out.summary.total, 2);
        assert_eq!(tool.calls().len(), 4);
        assert!(dir
            .path()
            .join("Lettering")
            .join("Final project")
            .join("Final project")
            .is_dir());
    }

    #[tokio::test]
    async fn unresolved_final_project_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool::default());

        let out = run_with(&settings(dir.path()), &scenario_a_driver(), &FakeApi::default(), tool)
            .await
            .unwrap();
        assert_eq!(out.summary.total, 1);
        assert!(out.summary.is_success());
    }

    #[tokio::test]
    async fn empty_units_produce_no_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool::default());
        let driver = FakeDriver::default()
            .page(
                COURSE_URL,
                r#"<h4 class="h2 unit-item__title"><a href="/en/courses/abc123-lettering/units/1-intro">Intro</a></h4>"#,
                None,
            )
            .page(UNIT_URL, "<p></p>", None);

        let out = run_with(&settings(dir.path()), &driver, &FakeApi::default(), tool.clone())
            .await
            .unwrap();
        assert_eq!(out.summary.total, 0);
        assert!(tool.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_downloads_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool {
            fail_on: Some("https://cdn/2.m3u8".into()),
            ..FakeTool::default()
        });

        let out = run_with(&settings(dir.path()), &three_video_driver(), &FakeApi::default(), tool)
            .await
            .unwrap();
        assert_eq!(out.summary.succeeded, 2);
        assert_eq!(out.summary.failures.len(), 1);
        assert_eq!(out.summary.failures[0].label, "Intro/Two");
    }

    #[tokio::test]
    async fn debug_run_writes_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool::default());
        let mut s = settings(dir.path());
        s.debug = true;

        let out = run_with(&s, &three_video_driver(), &FakeApi::default(), tool)
            .await
            .unwrap();
        assert_eq!(out.debug_log.as_ref().map(DebugLog::len), Some(3));

        let path = dir.path().join(DEBUG_LOG_FILE);
        debug_log_flush(&out, &path).await;
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn missing_downloader_stops_before_anything_else() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = settings(dir.path());
        s.downloader = dir.path().join("N_m3u8DL-RE");
        s.auth.credentials = r#"{"accessToken":"tok"}"#.into();
        s.browser.executable = Some(dir.path().join("no-such-chrome"));

        let err = run(s).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DependencyError>(),
            Some(DependencyError::DownloaderMissing { .. })
        ));
    }

    #[tokio::test]
    async fn empty_credentials_stop_before_browser_launch() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("N_m3u8DL-RE");
        std::fs::write(&bin, b"").unwrap();

        let mut s = settings(dir.path());
        s.downloader = bin;
        s.browser.executable = Some(dir.path().join("no-such-chrome"));

        let err = run(s).await.unwrap_err();
        assert_eq!(err.downcast_ref::<CredentialsError>(), Some(&CredentialsError::Empty));
    }

    #[test]
    fn job_index_restarts_per_unit() {
        let listing: CourseListing = serde_json::from_value(json!({
            "title": "C",
            "units": [
                { "title": "A", "videoData": [
                    { "playbackURL": "u1", "title": "a1", "section": "s" },
                    { "playbackURL": "u2", "title": "a2", "section": "s" }
                ] },
                { "title": "B", "videoData": [
                    { "playbackURL": "u3", "title": "b1", "section": "s" }
                ] }
            ],
            "final_project": null
        }))
        .unwrap();

        let jobs = build_jobs(&listing);
        let shape: Vec<(usize, &str, usize)> =
            jobs.iter().map(|j| (j.seq, j.unit_title.as_str(), j.index)).collect();
        assert_eq!(shape, vec![(0, "A", 0), (1, "A", 1), (2, "B", 0)]);
    }
}
