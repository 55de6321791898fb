//! course-backup - back up online courses to local disk.
//!
//! A course is a tree of chapters, lectures and assets. Assets are turned
//! into download jobs while the course is still being enumerated, and a
//! bounded worker pool downloads them concurrently.
//!
//! # Features
//!
//! - Bounded parallel downloads with a dynamic job intake
//! - Retries of transient fetch failures
//! - All-or-nothing file writes
//! - Fail-fast cancellation on the first failed download
//! - Skipping files that were already backed up
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use course_backup::{backup_course, BackupContext, Config, Course, WorkerPool};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let course = Course::load(Path::new("course.json"))?;
//!
//!     let pool = WorkerPool::new(4, 2)?;
//!     let ctx = BackupContext::new().bind(&pool);
//!
//!     let producer = {
//!         let ctx = ctx.clone();
//!         tokio::spawn(async move {
//!             let summary = backup_course(&ctx, &config, &course).await;
//!             ctx.mark_producer_done()?;
//!             summary
//!         })
//!     };
//!
//!     pool.run(&ctx).await?;
//!     producer.await??;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod course;
pub mod error;
pub mod fs;
pub mod output;
pub mod pool;

// Re-exports for convenience
pub use config::Config;
pub use course::{backup_course, plan_course, Course};
pub use error::{Error, Result};
pub use pool::{BackupContext, Job, ProgressSink, WorkerPool};
