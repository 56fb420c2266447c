use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_post_sync::cli::Cli;
use blog_post_sync::sync::{SyncOutcome, Synchronizer};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging on stderr; stdout carries --dry-run output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog_post_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sync failed during config: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Syncing {} into {}",
        config.feed_url,
        config.document.display()
    );

    let synchronizer = match Synchronizer::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("sync failed during {}: {}", e.stage(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = if cli.dry_run {
        synchronizer.preview().await
    } else {
        synchronizer.run().await
    };

    match result {
        Ok(SyncOutcome::Written { entries }) => {
            info!("Done: wrote {} entries", entries);
            ExitCode::SUCCESS
        }
        Ok(SyncOutcome::Unchanged { entries }) => {
            info!("Done: {} entries, document unchanged", entries);
            ExitCode::SUCCESS
        }
        Ok(SyncOutcome::DryRun {
            entries,
            changed,
            document,
        }) => {
            info!("Dry run: {} entries, changed = {}", entries, changed);
            print!("{}", document);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("sync failed during {}: {}", e.stage(), e);
            ExitCode::FAILURE
        }
    }
}
