use clap::{Parser, Subcommand};
use tracing::info;

use tucan_agent::Runner;
use tucan_core::config::Settings;
use tucan_core::trigger::TriggerSchedule;
use tucan_core::Shutdown;
use tucan_downloader::Downloader;
use tucan_notifier::Notifier;
use tucan_store::seed::seed_smart_categories;
use tucan_store::Store;
use tucan_sync::Synchronizer;

/// News mirror, analyzer, and channel notifier for CRHoy.
#[derive(Parser)]
#[command(name = "tucan", version, about)]
struct Cli {
    /// Optional TOML config file; the environment overrides it.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run synchronizer, downloader, and notifier in one process.
    Run,
    /// Run only the metadata synchronizer.
    Sync,
    /// Run only the downloader / analyzer.
    Download,
    /// Run only the channel notifier.
    Notify,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tucan=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let store = Store::open(settings.database_path())?;
    store.with_conn(|conn| seed_smart_categories(conn))?;

    let schedule = TriggerSchedule::new(
        settings.news_notifier_trigger_times.clone(),
        settings.check_updates_interval,
    )?;

    let shutdown = Shutdown::new();
    install_signal_handlers(shutdown.clone());

    let mut workers = Vec::new();
    match cli.command {
        Command::Run => {
            workers.push(spawn_synchronizer(&store, &settings, &shutdown));
            workers.push(spawn_downloader(&store, &settings, &schedule, &shutdown)?);
            workers.push(spawn_notifier(&store, &settings, &schedule, &shutdown)?);
        }
        Command::Sync => {
            workers.push(spawn_synchronizer(&store, &settings, &shutdown));
        }
        Command::Download => {
            workers.push(spawn_downloader(&store, &settings, &schedule, &shutdown)?);
        }
        Command::Notify => {
            workers.push(spawn_notifier(&store, &settings, &schedule, &shutdown)?);
        }
    }

    for worker in workers {
        let _ = worker.await;
    }
    info!("all workers stopped");
    Ok(())
}

fn spawn_synchronizer(
    store: &Store,
    settings: &Settings,
    shutdown: &Shutdown,
) -> tokio::task::JoinHandle<()> {
    let worker = Synchronizer::new(store.clone(), settings.clone(), shutdown.clone());
    tokio::spawn(worker.run())
}

fn spawn_downloader(
    store: &Store,
    settings: &Settings,
    schedule: &TriggerSchedule,
    shutdown: &Shutdown,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let runner = Runner::from_settings(settings, shutdown.clone())?;
    let worker = Downloader::new(
        store.clone(),
        runner,
        settings.clone(),
        schedule.clone(),
        shutdown.clone(),
    );
    Ok(tokio::spawn(worker.run()))
}

fn spawn_notifier(
    store: &Store,
    settings: &Settings,
    schedule: &TriggerSchedule,
    shutdown: &Shutdown,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let worker = Notifier::new(
        store.clone(),
        settings.clone(),
        schedule.clone(),
        shutdown.clone(),
    )?;
    Ok(tokio::spawn(worker.run()))
}

fn install_signal_handlers(shutdown: Shutdown) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut term = match signal(SignalKind::terminate()) {
                Ok(term) => term,
                Err(e) => {
                    tracing::error!("failed to install SIGTERM handler: {e}");
                    return;
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        info!("shutdown signal received");
        shutdown.request();
    });
}
