//! Course manifest representation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fs::sanitize_filename;

/// A course: chapters of lectures, each lecture holding assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    #[serde(default)]
    pub lectures: Vec<Lecture>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecture {
    pub title: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// One encoding of a lecture video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    /// Vertical resolution in pixels.
    pub resolution: u32,
    pub url: String,
}

/// Content attached to a lecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Asset {
    Video {
        title: String,
        sources: Vec<VideoSource>,
    },
    File {
        title: String,
        url: String,
    },
    Subtitle {
        title: String,
        language: String,
        url: String,
    },
    Article {
        title: String,
        body: String,
    },
    Link {
        title: String,
        url: String,
    },
}

impl Asset {
    pub fn title(&self) -> &str {
        match self {
            Asset::Video { title, .. }
            | Asset::File { title, .. }
            | Asset::Subtitle { title, .. }
            | Asset::Article { title, .. }
            | Asset::Link { title, .. } => title,
        }
    }

    /// File extension used for the backed-up copy.
    pub fn extension(&self) -> String {
        match self {
            Asset::Video { .. } => "mp4".to_string(),
            Asset::File { url, .. } => extension_from_url(url).unwrap_or_else(|| "bin".into()),
            Asset::Subtitle { language, .. } => match sanitize_filename(language) {
                Ok(lang) => format!("{}.vtt", lang),
                Err(_) => "vtt".to_string(),
            },
            Asset::Article { .. } => "html".to_string(),
            Asset::Link { .. } => "url".to_string(),
        }
    }
}

impl Course {
    /// Load a course manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Manifest(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse and check a course manifest.
    pub fn from_json(content: &str) -> Result<Self> {
        let course: Course = serde_json::from_str(content)?;

        if course.title.trim().is_empty() {
            return Err(Error::Manifest(format!("Course {} has no title", course.id)));
        }

        Ok(course)
    }

    /// Total number of assets across all lectures.
    pub fn asset_count(&self) -> usize {
        self.chapters
            .iter()
            .flat_map(|c| &c.lectures)
            .map(|l| l.assets.len())
            .sum()
    }
}

/// Last path segment extension of a URL, ignoring query strings.
fn extension_from_url(raw: &str) -> Option<String> {
    let url = url::Url::parse(raw).ok()?;
    let segment = url.path_segments()?.last()?;
    let (_, ext) = segment.rsplit_once('.')?;

    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
