// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! ghsync operator binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ghsync_config::{GhsyncConfig, LogFormat, LoggingConfig};
use ghsync_operator::{Context, GithubSecret, KubeClient};
use kube::CustomResourceExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod version;

/// Mirror GithubSecret resources into GitHub repository secrets.
#[derive(Parser, Debug)]
#[command(
	name = "ghsync-operator",
	about = "Mirror GithubSecret resources into GitHub repository secrets",
	version
)]
struct Args {
	/// TOML config file (default: /etc/ghsync/config.toml when present)
	#[arg(long, short, env = "GHSYNC_CONFIG", global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the controller (default)
	Run,
	/// Print the GithubSecret CustomResourceDefinition as JSON
	Crd,
	/// Show version and build information
	Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	match args.command.unwrap_or(Command::Run) {
		Command::Version => {
			println!("{}", version::format_version_info());
			return Ok(());
		}
		Command::Crd => {
			println!("{}", serde_json::to_string_pretty(&GithubSecret::crd())?);
			return Ok(());
		}
		Command::Run => {}
	}

	let config = load(args.config)?;
	init_tracing(&config.logging);

	let client = kube::Client::try_default().await?;
	let resources = Arc::new(KubeClient::new(client.clone()));
	let ctx = Arc::new(Context::from_config(&config, resources)?);

	ghsync_operator::run(
		client,
		ctx,
		config.controller.watch_namespace.as_deref(),
	)
	.await;

	tracing::info!("shutdown complete");
	Ok(())
}

fn load(path: Option<PathBuf>) -> anyhow::Result<GhsyncConfig> {
	let config = match path {
		Some(path) => ghsync_config::load_config_with_file(path)?,
		None => ghsync_config::load_config()?,
	};
	Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	match logging.format {
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json())
			.init(),
		LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}
