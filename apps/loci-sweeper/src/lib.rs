use std::{path::PathBuf, time::Duration as StdDuration};

use clap::Parser;
use time::Duration;
use tracing_subscriber::EnvFilter;

use loci_storage::{db::Db, sessions::SessionStore};

#[derive(Debug, Parser)]
#[command(
	version = loci_cli::VERSION,
	rename_all = "kebab",
	styles = loci_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

/// Periodic expiry sweep, decoupled from request handling. Live requests
/// never wait on this loop.
pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = loci_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let sessions = SessionStore::new(&config.session, Some(db.pool));
	let max_idle = Duration::hours(config.session.ttl_hours);
	let interval = StdDuration::from_secs(config.session.sweep_interval_seconds);

	tracing::info!(
		interval_seconds = config.session.sweep_interval_seconds,
		"Session sweeper running."
	);

	loop {
		let removed = sessions.expire_older_than(max_idle).await;

		if removed > 0 {
			tracing::info!(count = removed, "Purged expired sessions.");
		}

		tokio::time::sleep(interval).await;
	}
}
