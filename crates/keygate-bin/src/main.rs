//! keygate entrypoint: replay a key trace through the command filter.
use anyhow::Result;
use clap::Parser;
use core_config::load_from;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

mod replay;
mod sim;
mod trace;

use replay::Replay;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "keygate", version, about = "Replay key traces through the modal command filter")]
struct Args {
    /// TOML trace to replay.
    pub trace: PathBuf,
    /// Optional configuration file path (overrides discovery of `keygate.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("keygate.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "keygate.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();
    info!(target: "runtime", trace = %args.trace.display(), "startup");

    let config = load_from(args.config.clone())?;
    let trace = trace::load(&args.trace)?;
    let steps = trace.resolve_steps()?;
    let mut replay = Replay::build(&config, &trace)?;

    let mut out = io::stdout().lock();
    for line in replay.run(&steps).into_iter().chain(replay.summary()) {
        writeln!(out, "{line}")?;
    }
    out.flush()?;

    info!(target: "runtime", steps = steps.len(), "shutdown");
    Ok(())
}
