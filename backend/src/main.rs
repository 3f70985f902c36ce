use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use std::io::Write;

use habit_tracker_backend::config::AppConfig;
use habit_tracker_backend::{initialize_backend, initialize_backend_at};
use habit_tracker_backend::io::{print_toasts, run, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::default_path()?,
    };
    let (config, created) = AppConfig::load_or_create(&config_path)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();
    if created {
        info!("📝 Created default config at {:?}", config_path);
    } else {
        debug!("Using config {:?}", config_path);
    }

    let mut state = match &cli.data_dir {
        Some(dir) => initialize_backend_at(&config, dir)?,
        None => initialize_backend(&config)?,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = run(cli.cmd, &mut state, &mut out).await;
    print_toasts(&state.toast_queue, &mut std::io::stderr())?;
    out.flush()?;

    result
}
