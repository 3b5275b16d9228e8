mod api;
mod app;
mod config;
mod event;
mod logging;
mod mutation;
mod query;
mod session;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "A terminal UI for the Kowalski income and expense tracker")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/tally/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Service base URL, overriding the config file
  #[arg(long)]
  api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Logs go to a file; the guard flushes them on exit
  let _guard = logging::init()?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override the service URL if specified on the command line
  let config = if let Some(api_url) = args.api_url {
    config::Config {
      api: config::ApiConfig { base_url: api_url },
      ..config
    }
  } else {
    config
  };

  let session = session::Session::load(session::Session::default_path()?)?;

  // Initialize and run the app
  let mut app = app::App::new(config, session)?;
  app.run().await?;

  Ok(())
}
