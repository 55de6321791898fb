//! Backup directory layout.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;
use crate::fs::naming::{numbered_component, sanitize_path_component};

/// Folder holding everything backed up for one course.
pub fn course_folder(config: &Config, course_title: &str) -> Result<PathBuf> {
    let name = sanitize_path_component(course_title)?;
    Ok(config.download_directory().join(name))
}

/// Folder of the `index`-th (1-based) chapter of a course.
pub fn chapter_folder(course_dir: &Path, index: usize, title: &str) -> PathBuf {
    course_dir.join(numbered_component(index, title))
}

/// Folder of the `index`-th (1-based) lecture of a chapter.
pub fn lecture_folder(chapter_dir: &Path, index: usize, title: &str) -> PathBuf {
    chapter_dir.join(numbered_component(index, title))
}

/// File of the `index`-th (1-based) asset of a lecture.
pub fn asset_path(lecture_dir: &Path, index: usize, title: &str, extension: &str) -> PathBuf {
    lecture_dir.join(format!("{}.{}", numbered_component(index, title), extension))
}

/// Ensure a directory exists, creating it if necessary.
pub async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}
