//! course-backup - CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use course_backup::{
    cli::Args,
    config::{validate_config, Config},
    course::{plan_course, submit_plan, Course},
    error::{exit_codes, Error, Result},
    output::{
        print_backup_stats, print_config_summary, print_error, print_info, print_success,
        print_warning, ProgressReporter,
    },
    pool::{BackupContext, HttpFetcher, WorkerPool},
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("Backup failed: {}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::MissingConfig(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::Cancelled => ExitCode::from(exit_codes::ABORT as u8),
                Error::TransientFetch { .. }
                | Error::Stream(_)
                | Error::Write { .. }
                | Error::Http(_)
                | Error::Worker(_) => ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8),
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        if !args.quiet {
            print_warning(&format!(
                "Configuration file not found: {}",
                args.config.display()
            ));
            print_info("Using default configuration with CLI arguments");
        }
        Config::default()
    };

    args.merge_into_config(&mut config);
    validate_config(&config)?;

    if !args.quiet {
        print_config_summary(
            args.manifests.len(),
            config.options.concurrency,
            config.options.retry_count,
            &config.download_directory().display().to_string(),
        );
    }

    // Build the pool
    let reporter = Arc::new(ProgressReporter::new(!args.quiet));
    let pool = WorkerPool::new(config.options.concurrency, config.options.retry_count)?
        .with_intake_capacity(config.options.intake_capacity)
        .with_retry_backoff_ms(config.options.retry_backoff_ms)
        .with_fetcher(Arc::new(HttpFetcher::new(&config.network)?))
        .with_progress(reporter.clone());

    let root = BackupContext::new();
    {
        let root = root.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling backup");
                root.cancel();
            }
        });
    }
    let ctx = root.bind(&pool);

    // Single producer: enumerate courses while the pool downloads
    let producer = tokio::spawn(produce(
        ctx.clone(),
        config.clone(),
        args.manifests.clone(),
        reporter.clone(),
    ));

    let outcome = pool.run(&ctx).await;
    let produced = producer
        .await
        .map_err(|e| Error::Worker(format!("Producer task failed: {}", e)))?;

    reporter.finish();
    if !args.quiet {
        print_backup_stats(&reporter.stats());
    }

    // A producer failure is what cancelled the run, so report it instead.
    if let Err(e) = produced {
        if !e.is_cancellation() {
            return Err(e);
        }
    }
    outcome?;

    if !args.quiet {
        print_success("Backup complete");
    }
    Ok(())
}

/// Submit every course, then close the intake whatever happened.
async fn produce(
    ctx: BackupContext,
    config: Config,
    manifests: Vec<PathBuf>,
    reporter: Arc<ProgressReporter>,
) -> Result<()> {
    let result = produce_courses(&ctx, &config, &manifests, &reporter).await;

    if let Err(e) = &result {
        if !e.is_cancellation() {
            tracing::error!("Stopping backup: {}", e);
            ctx.cancel();
        }
    }
    ctx.mark_producer_done()?;

    result
}

async fn produce_courses(
    ctx: &BackupContext,
    config: &Config,
    manifests: &[PathBuf],
    reporter: &ProgressReporter,
) -> Result<()> {
    for path in manifests {
        let course = Course::load(path)?;
        tracing::info!(
            "Starting backup for: {} ({} assets)",
            course.title,
            course.asset_count()
        );

        let plan = plan_course(config, &course)?;
        reporter.add_planned(plan.jobs.len() as u64, plan.skipped as u64);

        let summary = submit_plan(ctx, plan).await?;
        tracing::debug!(
            "Submitted {} files for '{}' ({} skipped)",
            summary.submitted,
            course.title,
            summary.skipped
        );
    }

    Ok(())
}
