//! Statistics reporting.

use console::style;

use crate::output::progress::BackupStats;

/// Print the summary of a backup run.
pub fn print_backup_stats(stats: &BackupStats) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Backup Statistics:").bold());
    println!("  Downloaded: {}", style(stats.downloaded).green());
    println!("  Skipped:    {} (already present)", stats.skipped);
    if stats.failed > 0 {
        println!("  Failed:     {}", style(stats.failed).red());
    }
    if stats.cancelled > 0 {
        println!("  Cancelled:  {}", style(stats.cancelled).yellow());
    }
    println!("{}", style("═".repeat(50)).dim());
}
