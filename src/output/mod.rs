//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - The progress bar sink
//! - Statistics reporting

pub mod console;
pub mod progress;
pub mod stats;

pub use console::{print_config_summary, print_error, print_info, print_success, print_warning};
pub use progress::{create_file_bar, BackupStats, ProgressReporter};
pub use stats::print_backup_stats;
