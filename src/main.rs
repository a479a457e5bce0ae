// citewatch - Google Scholar citation tracker
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use citewatch::cli::{Args, Command};
use citewatch::config::AppConfig;
use citewatch::coordinator::{Coordinator, Presentation, RefreshOutcome};
use citewatch::models::{MetricsSnapshot, ProfileSettings};
use citewatch::notify::Sinks;
use citewatch::scheduler::Scheduler;
use citewatch::settings::{self, ConnectionReport};
use citewatch::storage::{FileStore, KeyValueStore, SettingsRepository};
use citewatch::transport::TransportResolver;
use citewatch::utils::logging;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let config = AppConfig::load_from(args.config.as_deref())?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting citewatch v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Open storage and build the transport
    info!("Using data directory {}", config.storage.data_dir);
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.storage.data_dir));
    let resolver = Arc::new(TransportResolver::new(&config.transport)?);

    // Phase 4: Wire the coordinator
    let coordinator = Arc::new(Coordinator::new(
        store.clone(),
        resolver.clone(),
        Sinks::tracing(),
        config.scholar.clone(),
        &config.cache,
    ));

    // Phase 5: Run the requested command
    match args.command {
        Command::Show => match coordinator.present().await? {
            Presentation::NotConfigured => {}
            Presentation::Cached { view, background } => {
                print_snapshot(&view.snapshot);
                match view.change_text() {
                    Some(change) => println!("{} ({})", view.age_text, change),
                    None => println!("{}", view.age_text),
                }
                if let Some(handle) = background {
                    info!("Waiting for background refresh...");
                    if let RefreshOutcome::Updated { snapshot, .. } = handle.await?? {
                        println!("Refreshed:");
                        print_snapshot(&snapshot);
                    }
                }
            }
            Presentation::Fetched(RefreshOutcome::Updated { snapshot, .. }) => {
                print_snapshot(&snapshot)
            }
            Presentation::Fetched(outcome) => println!("No data: {:?}", outcome),
        },
        Command::Refresh => {
            let report = coordinator.force_update().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Watch => {
            let scheduler = Scheduler::new(coordinator.clone(), config.schedule.interval());
            let cancel = coordinator.cancellation_token();
            let shutdown = {
                let coordinator = coordinator.clone();
                async move {
                    shutdown_signal().await;
                    coordinator.shutdown();
                }
            };
            tokio::select! {
                ticks = scheduler.run(cancel) => info!("Scheduler exited after {} ticks", ticks),
                _ = shutdown => info!("Watch stopped"),
            }
        }
        Command::Configure {
            url,
            id,
            notifications,
            auto_update,
        } => {
            let mut current = SettingsRepository::load(store.as_ref()).await?;
            if url.is_some() || id.is_some() {
                current.profile_url = url;
                current.profile_id = id;
            }
            let updated = ProfileSettings {
                notifications_enabled: notifications.unwrap_or(current.notifications_enabled),
                auto_update_enabled: auto_update.unwrap_or(current.auto_update_enabled),
                ..current
            };
            let saved = settings::save(store.as_ref(), &updated).await?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
            coordinator.on_settings_changed().await?;
        }
        Command::Test => {
            let current = SettingsRepository::load(store.as_ref()).await?;
            match settings::test_connection(&resolver, &current, &config.scholar).await {
                ConnectionReport::Parsed(snapshot) => {
                    println!("Connection OK");
                    print_snapshot(&snapshot);
                }
                ConnectionReport::Unparsed => {
                    println!("Connected, but no metrics were found on the page")
                }
                ConnectionReport::Failed(message) => println!("Connection failed: {}", message),
            }
        }
        Command::ClearCache => settings::clear_cache(store.as_ref()).await?,
        Command::Config => print!("{}", config.to_toml()?),
    }

    Ok(())
}

fn print_snapshot(snapshot: &MetricsSnapshot) {
    if let Some(name) = &snapshot.author_name {
        match &snapshot.affiliation {
            Some(affiliation) => println!("{} ({})", name, affiliation),
            None => println!("{}", name),
        }
    }
    println!("Citations: {}", snapshot.citations);
    println!("h-index:   {}", snapshot.h_index);
    println!("i10-index: {}", snapshot.i10_index);
    for (year, count) in &snapshot.recent_citations_by_year {
        println!("  {}: {}", year, count);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
