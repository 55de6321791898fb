//! Filesystem module.
//!
//! Provides:
//! - Filename sanitisation
//! - Course directory layout

pub mod naming;
pub mod paths;

pub use naming::{numbered_component, sanitize_filename, sanitize_path_component};
pub use paths::{asset_path, chapter_folder, course_folder, ensure_dir, lecture_folder};
