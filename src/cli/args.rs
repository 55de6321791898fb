//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Course backup CLI.
#[derive(Parser, Debug)]
#[command(
    name = "course-backup",
    version,
    about = "Back up online course content for offline use",
    long_about = "Downloads the videos, attachments, subtitles and articles of one or more courses.\n\n\
                  Each course is described by a JSON manifest; passing several manifests backs up\n\
                  all of them in one session."
)]
pub struct Args {
    /// Course manifest file(s) to back up.
    #[arg(required = true, num_args = 1..)]
    pub manifests: Vec<PathBuf>,

    /// Output directory for backups.
    #[arg(short = 'd', long = "dir")]
    pub download_directory: Option<PathBuf>,

    /// Number of parallel downloads.
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Extra attempts for a failed download.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Upper bound of the random delay between retries, in milliseconds.
    #[arg(long)]
    pub retry_backoff_ms: Option<u64>,

    /// Jobs buffered ahead of the workers.
    #[arg(long)]
    pub intake_capacity: Option<usize>,

    /// Download files again even if they already exist.
    #[arg(short, long)]
    pub redownload: bool,

    /// Download subtitle (vtt) files.
    #[arg(long)]
    pub subtitles: bool,

    /// Only download videos of the given resolution.
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Hide progress and summary output.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(dir) = &self.download_directory {
            config.options.download_directory = Some(dir.clone());
        }

        if let Some(concurrency) = self.concurrency {
            config.options.concurrency = concurrency;
        }

        if let Some(retries) = self.retries {
            config.options.retry_count = retries;
        }

        if let Some(backoff) = self.retry_backoff_ms {
            config.options.retry_backoff_ms = backoff;
        }

        if let Some(capacity) = self.intake_capacity {
            config.options.intake_capacity = capacity;
        }

        if let Some(resolution) = self.resolution {
            config.options.preferred_resolution = Some(resolution);
        }

        // Boolean flags (only override if set to non-default)
        if self.redownload {
            config.options.redownload = true;
        }

        if self.subtitles {
            config.options.download_subtitles = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "course-backup",
            "-j",
            "3",
            "--retries",
            "0",
            "--subtitles",
            "--dir",
            "/backups",
            "a.json",
            "b.json",
        ]);
        let mut config = Config::default();
        config.options.retry_count = 5;

        args.merge_into_config(&mut config);

        assert_eq!(args.manifests.len(), 2);
        assert_eq!(config.options.concurrency, 3);
        assert_eq!(config.options.retry_count, 0);
        assert!(config.options.download_subtitles);
        assert!(!config.options.redownload);
        assert_eq!(config.download_directory(), PathBuf::from("/backups"));
    }

    #[test]
    fn test_manifest_required() {
        assert!(Args::try_parse_from(["course-backup"]).is_err());
    }
}
