use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use backend_bootstrap::{run_with_context, AppContext};
use backend_infrastructure::ConfigSource;

#[derive(Parser, Debug)]
#[command(name = "chat-backend")]
#[command(about = "Room chat server", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address, overrides `bind_addr`
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var("CHAT_CONFIG", config);
    }
    if let Some(bind) = args.bind {
        std::env::set_var("CHAT_BIND_ADDR", bind);
    }

    let context = match AppContext::new().await {
        Ok(context) => context,
        Err(err) => {
            let _guard = init_tracing(None);
            error!("config load failed: {:#}", err);
            return Err(err);
        }
    };
    let _guard = init_tracing(context.config.log_dir.as_deref());
    match &context.config.source {
        ConfigSource::File(path) => info!("config loaded from {}", path),
        ConfigSource::Defaults => warn!("no config file found, using defaults"),
    }

    run_with_context(context).await
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Logs to stdout, or to a daily rolling file when `log_dir` is set.
fn init_tracing(log_dir: Option<&str>) -> Option<WorkerGuard> {
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "chat-backend.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(env_filter()).init();
            None
        }
    }
}
