pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use folio_config::Config;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = folio_cli::VERSION,
	about = folio_cli::ABOUT,
	rename_all = "kebab",
	styles = folio_cli::styles(),
)]
pub struct Args {
	/// Path to the folio TOML config.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

/// The public and admin listener addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binds {
	pub public: SocketAddr,
	pub admin: SocketAddr,
}
impl Binds {
	/// Parses both binds. The admin router never leaves loopback; the public one may only when
	/// `security.bind_localhost_only` is off.
	pub fn from_config(config: &Config) -> color_eyre::Result<Self> {
		let public: SocketAddr = config.service.http_bind.parse()?;
		let admin: SocketAddr = config.service.admin_bind.parse()?;

		if !admin.ip().is_loopback() {
			eyre::bail!("service.admin_bind must be a loopback address, got {admin}.");
		}
		if config.security.bind_localhost_only && !public.ip().is_loopback() {
			eyre::bail!(
				"service.http_bind {public} is not loopback; set security.bind_localhost_only = false to expose it."
			);
		}

		Ok(Self { public, admin })
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = folio_config::load(&args.config)?;

	init_tracing(&config);

	let binds = Binds::from_config(&config)?;
	let state = AppState::new(config).await?;
	let public = TcpListener::bind(binds.public).await?;
	let admin = TcpListener::bind(binds.admin).await?;

	tracing::info!(
		public = %binds.public,
		admin = %binds.admin,
		vector_index = state.service.index.is_some(),
		"folio assistant listening."
	);

	let public_server = axum::serve(public, routes::router(state.clone()));
	let admin_server = axum::serve(admin, routes::admin_router(state));

	tokio::try_join!(public_server, admin_server)?;

	Ok(())
}

fn init_tracing(config: &Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
