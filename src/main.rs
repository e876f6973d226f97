mod api;
mod app;
mod cache;
mod commands;
mod config;
mod context;
mod db;
mod estimator;
mod event;
mod forms;
mod query;
mod session;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cropdoc")]
#[command(about = "A terminal dashboard for the CropDoctor crop advisory API")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./cropdoc.yaml, then $XDG_CONFIG_HOME/cropdoc/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Backend base URL, overrides the config file
  #[arg(long)]
  api_url: Option<String>,
}

/// Log to a daily file; the terminal belongs to the UI.
fn init_logging() -> Result<WorkerGuard> {
  let log_dir = db::Database::data_dir()?.join("logs");
  std::fs::create_dir_all(&log_dir)?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
    log_dir,
    "cropdoc.log",
  ));
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cropdoc=info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_logging()?;

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(url) = args.api_url {
    config.api.url = url;
  }
  tracing::info!(api = %config.api.url, "starting cropdoc");

  let ctx = context::AppContext::init(config)?;
  let mut app = app::App::new(ctx);
  app.run().await?;

  Ok(())
}
