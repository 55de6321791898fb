//! Course model and job production.
//!
//! Provides:
//! - Course manifest parsing
//! - Planning a course into directories and download jobs
//! - Submitting those jobs to a worker pool

pub mod backup;
pub mod model;

pub use backup::{backup_course, plan_course, submit_plan, CoursePlan, CourseSummary};
pub use model::{Asset, Chapter, Course, Lecture, VideoSource};
