//! Turning a course into download jobs.

use std::path::PathBuf;

use crate::config::Config;
use crate::course::model::{Asset, Course, VideoSource};
use crate::error::Result;
use crate::fs::paths::{asset_path, chapter_folder, course_folder, ensure_dir, lecture_folder};
use crate::pool::{BackupContext, Job};

/// Everything needed to back up one course.
#[derive(Debug, Clone, Default)]
pub struct CoursePlan {
    pub course_dir: PathBuf,
    /// Directories to create before any job runs.
    pub directories: Vec<PathBuf>,
    pub jobs: Vec<Job>,
    /// Files already present locally and not downloaded again.
    pub skipped: usize,
}

/// Outcome of handing a course plan to the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseSummary {
    pub submitted: usize,
    pub skipped: usize,
}

/// Compute directories and jobs for `course` without touching the pool.
///
/// Existing destination files are skipped unless redownload is enabled.
/// Videos are taken at the preferred resolution when one is configured
/// (lectures lacking it are left out), otherwise at the highest available.
pub fn plan_course(config: &Config, course: &Course) -> Result<CoursePlan> {
    let course_dir = course_folder(config, &course.title)?;
    let mut plan = CoursePlan {
        course_dir: course_dir.clone(),
        directories: vec![course_dir.clone()],
        ..Default::default()
    };

    for (ci, chapter) in course.chapters.iter().enumerate() {
        let chapter_dir = chapter_folder(&course_dir, ci + 1, &chapter.title);
        plan.directories.push(chapter_dir.clone());

        for (li, lecture) in chapter.lectures.iter().enumerate() {
            let lecture_dir = lecture_folder(&chapter_dir, li + 1, &lecture.title);
            plan.directories.push(lecture_dir.clone());

            for (ai, asset) in lecture.assets.iter().enumerate() {
                let dest = asset_path(&lecture_dir, ai + 1, asset.title(), &asset.extension());

                let Some(job) = asset_job(config, asset, dest) else {
                    continue;
                };

                if !config.options.redownload && job.destination().exists() {
                    tracing::debug!("Skipping existing file: {}", job.destination().display());
                    plan.skipped += 1;
                    continue;
                }

                plan.jobs.push(job);
            }
        }
    }

    Ok(plan)
}

/// Create the plan's directories and submit its jobs through `ctx`.
///
/// Stops at the first submission error; a cancelled context surfaces as
/// [`crate::Error::Cancelled`].
pub async fn submit_plan(ctx: &BackupContext, plan: CoursePlan) -> Result<CourseSummary> {
    for dir in &plan.directories {
        ensure_dir(dir).await?;
    }

    let mut summary = CourseSummary {
        submitted: 0,
        skipped: plan.skipped,
    };

    for job in plan.jobs {
        ctx.submit(job).await?;
        summary.submitted += 1;
    }

    Ok(summary)
}

/// Plan `course` and submit all of its jobs.
pub async fn backup_course(
    ctx: &BackupContext,
    config: &Config,
    course: &Course,
) -> Result<CourseSummary> {
    let plan = plan_course(config, course)?;
    tracing::info!(
        "Course '{}': {} files to download, {} already present",
        course.title,
        plan.jobs.len(),
        plan.skipped
    );
    submit_plan(ctx, plan).await
}

fn asset_job(config: &Config, asset: &Asset, dest: PathBuf) -> Option<Job> {
    match asset {
        Asset::Video { title, sources } => {
            let source = select_source(sources, config.options.preferred_resolution);
            if source.is_none() {
                tracing::debug!("No suitable video source for '{}'", title);
            }
            source.map(|s| Job::remote(s.url.clone(), dest))
        }
        Asset::File { url, .. } => Some(Job::remote(url.clone(), dest)),
        Asset::Subtitle { url, .. } => config
            .options
            .download_subtitles
            .then(|| Job::remote(url.clone(), dest)),
        Asset::Article { title, body } => Some(Job::inline(article_html(title, body), dest)),
        Asset::Link { url, .. } => Some(Job::inline(internet_shortcut(url), dest)),
    }
}

fn select_source(sources: &[VideoSource], preferred: Option<u32>) -> Option<&VideoSource> {
    match preferred {
        Some(resolution) => sources.iter().find(|s| s.resolution == resolution),
        None => sources.iter().max_by_key(|s| s.resolution),
    }
}

fn article_html(title: &str, body: &str) -> Vec<u8> {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        body
    )
    .into_bytes()
}

fn internet_shortcut(url: &str) -> Vec<u8> {
    format!("[InternetShortcut]\nURL={}\n", url).into_bytes()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::course::model::{Chapter, Lecture};
    use crate::error::Error;
    use crate::pool::testing::ScriptedFetcher;
    use crate::pool::WorkerPool;

    fn video(title: &str, resolutions: &[u32]) -> Asset {
        Asset::Video {
            title: title.to_string(),
            sources: resolutions
                .iter()
                .map(|r| VideoSource {
                    resolution: *r,
                    url: format!("https://cdn.example.com/{}-{}.mp4", title, r),
                })
                .collect(),
        }
    }

    fn sample_course() -> Course {
        Course {
            id: 7,
            title: "Rust Basics".to_string(),
            chapters: vec![Chapter {
                title: "Ownership".to_string(),
                lectures: vec![Lecture {
                    title: "Moves".to_string(),
                    assets: vec![
                        video("moves", &[360, 1080, 720]),
                        Asset::Subtitle {
                            title: "moves".to_string(),
                            language: "en".to_string(),
                            url: "https://cdn.example.com/moves.vtt".to_string(),
                        },
                        Asset::Article {
                            title: "Notes & tips".to_string(),
                            body: "<p>Moves transfer ownership.</p>".to_string(),
                        },
                    ],
                }],
            }],
        }
    }

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.options.download_directory = Some(dir.to_path_buf());
        config
    }

    #[test]
    fn test_plan_layout_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let plan = plan_course(&config, &sample_course()).unwrap();

        let lecture_dir = dir.path().join("Rust Basics/01 - Ownership/01 - Moves");
        assert_eq!(plan.directories.len(), 3);
        assert_eq!(plan.directories[2], lecture_dir);

        // Subtitles are off by default.
        assert_eq!(plan.jobs.len(), 2);
        assert_eq!(
            plan.jobs[0].source_locator(),
            Some("https://cdn.example.com/moves-1080.mp4")
        );
        assert_eq!(plan.jobs[0].destination(), lecture_dir.join("01 - moves.mp4"));
        assert_eq!(
            plan.jobs[1].destination(),
            lecture_dir.join("03 - Notes & tips.html")
        );

        let html = String::from_utf8(plan.jobs[1].inline_payload().unwrap().to_vec()).unwrap();
        assert!(html.contains("<title>Notes &amp; tips</title>"));
        assert!(html.contains("<p>Moves transfer ownership.</p>"));
    }

    #[test]
    fn test_plan_subtitles_and_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.options.download_subtitles = true;
        config.options.preferred_resolution = Some(720);

        let plan = plan_course(&config, &sample_course()).unwrap();

        assert_eq!(plan.jobs.len(), 3);
        assert_eq!(
            plan.jobs[0].source_locator(),
            Some("https://cdn.example.com/moves-720.mp4")
        );
        assert!(plan.jobs[1]
            .destination()
            .to_string_lossy()
            .ends_with("02 - moves.en.vtt"));

        config.options.preferred_resolution = Some(480);
        let plan = plan_course(&config, &sample_course()).unwrap();
        assert_eq!(plan.jobs.len(), 2);
        assert!(plan.jobs.iter().all(|j| !j
            .destination()
            .to_string_lossy()
            .ends_with(".mp4")));
    }

    #[test]
    fn test_plan_skips_existing_unless_redownload() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());

        let lecture_dir = dir.path().join("Rust Basics/01 - Ownership/01 - Moves");
        std::fs::create_dir_all(&lecture_dir).unwrap();
        std::fs::write(lecture_dir.join("01 - moves.mp4"), b"done").unwrap();
        // Abandoned temp files do not count as downloads.
        std::fs::write(lecture_dir.join(".03 - Notes & tips.html.1234.part"), b"").unwrap();

        let plan = plan_course(&config, &sample_course()).unwrap();
        assert_eq!(plan.skipped, 1);
        assert_eq!(plan.jobs.len(), 1);

        config.options.redownload = true;
        let plan = plan_course(&config, &sample_course()).unwrap();
        assert_eq!(plan.skipped, 0);
        assert_eq!(plan.jobs.len(), 2);
    }

    #[test]
    fn test_link_shortcut() {
        assert_eq!(
            internet_shortcut("https://doc.rust-lang.org"),
            b"[InternetShortcut]\nURL=https://doc.rust-lang.org\n".to_vec()
        );
    }

    #[tokio::test]
    async fn test_backup_course_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let pool = WorkerPool::new(2, 1)
            .unwrap()
            .with_fetcher(Arc::new(ScriptedFetcher::failing_on("never")));
        let ctx = BackupContext::new().bind(&pool);

        let producer = {
            let ctx = ctx.clone();
            let config = config.clone();
            tokio::spawn(async move {
                let summary = backup_course(&ctx, &config, &sample_course()).await;
                ctx.mark_producer_done()?;
                summary
            })
        };

        pool.run(&ctx).await.unwrap();
        let summary = producer.await.unwrap().unwrap();
        assert_eq!(summary, CourseSummary { submitted: 2, skipped: 0 });

        let lecture_dir = dir.path().join("Rust Basics/01 - Ownership/01 - Moves");
        assert_eq!(
            std::fs::read_to_string(lecture_dir.join("01 - moves.mp4")).unwrap(),
            "https://cdn.example.com/moves-1080.mp4"
        );
        assert!(lecture_dir.join("03 - Notes & tips.html").exists());
    }

    #[tokio::test]
    async fn test_submit_plan_stops_when_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let pool = WorkerPool::new(1, 0).unwrap();
        let ctx = BackupContext::new().bind(&pool);
        ctx.cancel();

        let plan = plan_course(&config, &sample_course()).unwrap();
        let err = submit_plan(&ctx, plan).await.unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert!(dir.path().join("Rust Basics").is_dir());
    }
}
